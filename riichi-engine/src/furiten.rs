//! Furiten tracking: a seat is furiten (forbidden from ron) if its own
//! discard pile contains a tile it currently waits on, if it is in
//! temporary furiten after declining a ron this go-around, or if it
//! declared riichi while furiten (permanent for the rest of the hand).
//!
//! Unlike the distilled source, which memoizes per-seat recomputation by
//! comparing Python object identity across calls, this port simply
//! recomputes from the immutable round state every time it is asked —
//! state here is cheap to read and there is no mutable player object whose
//! identity could signal "unchanged" the way the source relies on.

use std::collections::HashSet;

use crate::ports::ShantenPort;
use crate::round_state::RoundState;
use crate::tiles::tile_to_34;

/// Recomputes `is_temporary_furiten` for `seat` against its own discard
/// pile and a just-passed ron opportunity, given its current wait set.
pub fn discard_pile_furiten(state: &RoundState, seat: u8, waits: &HashSet<u8>) -> bool {
    if waits.is_empty() {
        return false;
    }
    state
        .player(seat)
        .discards
        .iter()
        .any(|d| waits.contains(&tile_to_34(d.tile_id)))
}

/// Recomputes the wait set for `seat`'s current concealed hand via the
/// shanten port; only meaningful when the hand is at tenpai (shanten == 0).
pub fn waits_for_seat(state: &RoundState, seat: u8, shanten: &impl ShantenPort) -> HashSet<u8> {
    let player = state.player(seat);
    let counts = crate::tiles::hand_to_34_array(&player.hand);
    if shanten.shanten(&counts) != 0 {
        return HashSet::new();
    }
    shanten.waits(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{DiscardEntry, MahjongPlayer};
    use crate::round_state::{RoundPhase, RoundWind};

    fn round_with_discard(seat: u8, tile_id: u8) -> RoundState {
        let mut players: [MahjongPlayer; 4] = std::array::from_fn(|i| MahjongPlayer::new(i as u8, 25_000, vec![]));
        players[seat as usize].discards.push(DiscardEntry {
            tile_id,
            is_tsumogiri: false,
            is_riichi_discard: false,
        });
        RoundState {
            wall: None,
            players,
            dealer_seat: 0,
            round_wind: RoundWind::East,
            hand_number: 1,
            honba: 0,
            riichi_sticks: 0,
            current_player_seat: 0,
            pending_call_prompt: None,
            phase: RoundPhase::Playing,
            drawn_count: 0,
            rinshan_draws: 0,
            pending_dora_reveals: 0,
            revealed_dora_indicators: 1,
            kans_called: 0,
            kan_contributing_seats: HashSet::new(),
        }
    }

    #[test]
    fn furiten_when_discard_pile_contains_a_waited_kind() {
        let state = round_with_discard(1, 40);
        let waits: HashSet<u8> = [tile_to_34(40)].into_iter().collect();
        assert!(discard_pile_furiten(&state, 1, &waits));
    }

    #[test]
    fn not_furiten_when_waits_exclude_discards() {
        let state = round_with_discard(1, 40);
        let waits: HashSet<u8> = [tile_to_34(44)].into_iter().collect();
        assert!(!discard_pile_furiten(&state, 1, &waits));
    }
}
