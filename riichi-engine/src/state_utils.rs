//! Functional update helpers over [`RoundState`]/[`GameState`]. Every
//! function here takes a state by value and returns a new one; there is no
//! in-place mutation, matching the copy-on-write discipline the engine
//! requires (§3 "Ownership and lifecycles", §9 "Immutable state").

use crate::player::MahjongPlayer;
use crate::round_state::RoundState;

/// Applies `update` to a clone of the player at `seat` and returns a new
/// round state with that single player replaced.
pub fn update_player(state: &RoundState, seat: u8, update: impl FnOnce(&mut MahjongPlayer)) -> RoundState {
    let mut next = state.clone();
    update(&mut next.players[seat as usize]);
    next
}

pub fn add_tile_to_player(state: &RoundState, seat: u8, tile_id: u8) -> RoundState {
    update_player(state, seat, |p| p.hand.push(tile_id))
}

pub fn advance_turn(state: &RoundState) -> RoundState {
    let mut next = state.clone();
    next.current_player_seat = RoundState::next_seat(state.current_player_seat);
    next
}

pub fn set_current_seat(state: &RoundState, seat: u8) -> RoundState {
    let mut next = state.clone();
    next.current_player_seat = seat;
    next
}

pub fn clear_pending_prompt(state: &RoundState) -> RoundState {
    let mut next = state.clone();
    next.pending_call_prompt = None;
    next
}

/// Records `seat`'s response, removing it from the prompt's pending set.
pub fn add_prompt_response(
    state: &RoundState,
    seat: u8,
    response: crate::round_state::CallResponse,
) -> RoundState {
    let mut next = state.clone();
    if let Some(prompt) = next.pending_call_prompt.as_mut() {
        prompt.pending_seats.remove(&seat);
        prompt.responses.push((seat, response));
    }
    next
}

/// Clears every seat's `is_ippatsu` flag; short-circuits (returns a clone
/// with no further work) if none were set, mirroring the source's
/// short-circuit but without relying on identity comparisons.
pub fn clear_all_players_ippatsu(state: &RoundState) -> RoundState {
    if state.players.iter().all(|p| !p.is_ippatsu) {
        return state.clone();
    }
    let mut next = state.clone();
    for player in next.players.iter_mut() {
        player.is_ippatsu = false;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round_state::{RoundPhase, RoundWind};
    use std::collections::HashSet;

    fn empty_round() -> RoundState {
        RoundState {
            wall: None,
            players: std::array::from_fn(|i| MahjongPlayer::new(i as u8, 25_000, vec![])),
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
    fn advance_turn_wraps_mod_four() {
        let state = empty_round();
        let next = advance_turn(&set_current_seat(&state, 3));
        assert_eq!(next.current_player_seat, 0);
    }

    #[test]
    fn updates_never_mutate_the_original() {
        let state = empty_round();
        let next = add_tile_to_player(&state, 0, 42);
        assert_eq!(state.players[0].hand.len(), 0);
        assert_eq!(next.players[0].hand, vec![42]);
    }

    #[test]
    fn clear_ippatsu_resets_every_seat() {
        let mut state = empty_round();
        state.players[2].is_ippatsu = true;
        let next = clear_all_players_ippatsu(&state);
        assert!(next.players.iter().all(|p| !p.is_ippatsu));
    }
}
