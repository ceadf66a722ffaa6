//! Immutable round and game state. All mutation goes through
//! [`crate::state_utils`]; these types themselves expose no `&mut self`
//! mutators.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::player::MahjongPlayer;
use crate::settings::GameSettings;
use crate::wall::Wall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundWind {
    East,
    South,
    West,
    North,
}

impl RoundWind {
    /// The prevailing wind after `cycle` full go-arounds of the table (one
    /// cycle = every seat has dealt once).
    pub fn from_cycle(cycle: u32) -> Self {
        match cycle % 4 {
            0 => RoundWind::East,
            1 => RoundWind::South,
            2 => RoundWind::West,
            _ => RoundWind::North,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            RoundWind::East => "east",
            RoundWind::South => "south",
            RoundWind::West => "west",
            RoundWind::North => "north",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Ron,
    Pon,
    Chi,
    OpenKan,
}

impl CallKind {
    /// Smaller wins; ron is handled separately and never compared here.
    pub fn priority(self) -> u8 {
        match self {
            CallKind::OpenKan => 0,
            CallKind::Pon => 1,
            CallKind::Chi => 2,
            CallKind::Ron => u8::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleCall {
    pub seat: u8,
    pub kind: CallKind,
    /// For chi only: each legal two-tile completion that forms a sequence
    /// containing the discarded tile.
    pub chi_completions: Vec<(u8, u8)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallResponse {
    Ron,
    Pon,
    Chi { completion: (u8, u8) },
    Kan,
    Pass,
}

/// Raised immediately after every discard (and, in restricted ron-only
/// form, after an added-kan upgrade for the chankan window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPrompt {
    pub tile_id: u8,
    pub discarder_seat: u8,
    pub eligible: Vec<EligibleCall>,
    pub pending_seats: HashSet<u8>,
    pub responses: Vec<(u8, CallResponse)>,
    /// True for the chankan window opened by an added-kan upgrade, which
    /// only accepts ron responses.
    pub is_chankan: bool,
}

impl CallPrompt {
    pub fn all_responded(&self) -> bool {
        self.pending_seats.is_empty()
    }

    pub fn eligible_for(&self, seat: u8) -> Option<&EligibleCall> {
        self.eligible.iter().find(|e| e.seat == seat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRoundAdvance {
    pub confirmed_seats: HashSet<u8>,
    pub required_seats: HashSet<u8>,
}

impl PendingRoundAdvance {
    pub fn all_confirmed(&self) -> bool {
        self.required_seats.is_subset(&self.confirmed_seats)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    #[serde(skip)]
    pub wall: Option<Wall>,
    pub players: [MahjongPlayer; 4],
    pub dealer_seat: u8,
    pub round_wind: RoundWind,
    pub hand_number: u8,
    pub honba: u16,
    pub riichi_sticks: u16,
    pub current_player_seat: u8,
    pub pending_call_prompt: Option<CallPrompt>,
    pub phase: RoundPhase,
    pub drawn_count: usize,
    pub rinshan_draws: usize,
    pub pending_dora_reveals: u32,
    pub revealed_dora_indicators: u32,
    pub kans_called: u32,
    pub kan_contributing_seats: HashSet<u8>,
}

impl RoundState {
    pub fn live_tiles_remaining(&self) -> usize {
        self.wall
            .as_ref()
            .map(|w| w.live_tiles_remaining(self.drawn_count))
            .unwrap_or(0)
    }

    pub fn player(&self, seat: u8) -> &MahjongPlayer {
        &self.players[seat as usize]
    }

    pub fn next_seat(seat: u8) -> u8 {
        (seat + 1) % 4
    }

    pub fn seat_distance(seat: u8, from: u8) -> u8 {
        (seat + 4 - from) % 4
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: String,
    pub round: RoundState,
    pub settings: GameSettings,
    pub total_riichi_sticks: u16,
    pub honba_sticks: u16,
    pub unique_dealers_seen: u32,
    pub phase: GamePhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_distance_is_counter_clockwise() {
        assert_eq!(RoundState::seat_distance(0, 0), 0);
        assert_eq!(RoundState::seat_distance(1, 0), 1);
        assert_eq!(RoundState::seat_distance(0, 1), 3);
        assert_eq!(RoundState::seat_distance(3, 1), 2);
    }

    #[test]
    fn call_kind_priority_ordering() {
        assert!(CallKind::OpenKan.priority() < CallKind::Pon.priority());
        assert!(CallKind::Pon.priority() < CallKind::Chi.priority());
    }
}
