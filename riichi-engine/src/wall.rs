//! The 136-tile wall, split into dealt hands, a live wall, and a dead wall.

use serde::{Deserialize, Serialize};

pub const NUM_PLAYERS: usize = 4;
pub const HAND_SIZE: usize = 13;
pub const DEAD_WALL_SIZE: usize = 14;
pub const LIVE_WALL_SIZE: usize = 136 - NUM_PLAYERS * HAND_SIZE - DEAD_WALL_SIZE; // 70
pub const DORA_INDICATOR_INDEX: usize = 4;
pub const URA_DORA_INDICATOR_INDEX: usize = 9;

/// An ordered 136-tile permutation, already partitioned into the pieces the
/// round needs. `tiles[0..52]` are the four starting hands (13 each, dealt
/// round-robin starting from seat 0), `tiles[52..122]` is the live wall
/// (drawn from the front), and `tiles[122..136]` is the dead wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    tiles: [u8; 136],
}

impl Wall {
    pub fn from_permutation(tiles: [u8; 136]) -> Self {
        Self { tiles }
    }

    pub fn initial_hand(&self, seat: u8) -> [u8; HAND_SIZE] {
        let start = seat as usize * HAND_SIZE;
        let mut hand = [0u8; HAND_SIZE];
        hand.copy_from_slice(&self.tiles[start..start + HAND_SIZE]);
        hand
    }

    fn live_wall_start(&self) -> usize {
        NUM_PLAYERS * HAND_SIZE
    }

    pub fn live_tiles_remaining(&self, drawn: usize) -> usize {
        LIVE_WALL_SIZE.saturating_sub(drawn)
    }

    /// The tile id at live-wall draw index `drawn` (0-based, the next draw).
    pub fn live_tile_at(&self, drawn: usize) -> Option<u8> {
        if drawn >= LIVE_WALL_SIZE {
            return None;
        }
        Some(self.tiles[self.live_wall_start() + drawn])
    }

    fn dead_wall_start(&self) -> usize {
        self.live_wall_start() + LIVE_WALL_SIZE
    }

    /// Rinshan tiles are drawn from the back of the dead wall, in the order
    /// kans are called; `rinshan_draws` counts how many have already gone out.
    pub fn rinshan_tile(&self, rinshan_draws: usize) -> Option<u8> {
        if rinshan_draws >= DEAD_WALL_SIZE - URA_DORA_INDICATOR_INDEX - 1 {
            return None;
        }
        Some(self.tiles[self.dead_wall_start() + DEAD_WALL_SIZE - 1 - rinshan_draws])
    }

    /// The `nth` (0-based) dora indicator, starting at the fixed index and
    /// advancing by one dead-wall slot per revealed kan.
    pub fn dora_indicator(&self, nth: usize) -> Option<u8> {
        let idx = self.dead_wall_start() + DORA_INDICATOR_INDEX + nth;
        if idx >= self.dead_wall_start() + DEAD_WALL_SIZE {
            return None;
        }
        Some(self.tiles[idx])
    }

    pub fn ura_dora_indicator(&self, nth: usize) -> Option<u8> {
        let idx = self.dead_wall_start() + URA_DORA_INDICATOR_INDEX + nth;
        if idx >= self.dead_wall_start() + DEAD_WALL_SIZE {
            return None;
        }
        Some(self.tiles[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_permutation() -> [u8; 136] {
        let mut tiles = [0u8; 136];
        for i in 0..136 {
            tiles[i] = (i % 136) as u8;
        }
        tiles
    }

    #[test]
    fn hands_are_dealt_round_robin_in_blocks_of_thirteen() {
        let wall = Wall::from_permutation(identity_permutation());
        assert_eq!(wall.initial_hand(0)[0], 0);
        assert_eq!(wall.initial_hand(1)[0], 13);
        assert_eq!(wall.initial_hand(3)[12], 4 * 13 - 1);
    }

    #[test]
    fn live_wall_has_seventy_tiles() {
        let wall = Wall::from_permutation(identity_permutation());
        assert!(wall.live_tile_at(69).is_some());
        assert!(wall.live_tile_at(70).is_none());
    }

    #[test]
    fn dora_indicator_is_at_fixed_dead_wall_offset() {
        let wall = Wall::from_permutation(identity_permutation());
        let expected = 52 + 70 + DORA_INDICATOR_INDEX;
        assert_eq!(wall.dora_indicator(0), Some(expected as u8));
    }
}
