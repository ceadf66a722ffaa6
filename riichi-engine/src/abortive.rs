//! Abortive draw conditions: kyuushu kyuuhai, four winds, four kans, and
//! the settings-driven simultaneous-ron limit (triple ron).

use crate::round_state::RoundState;
use crate::settings::GameSettings;
use crate::tiles::{is_terminal_or_honor, tile_to_34};

/// Allowed iff the round has no discards and no melds yet, and the seat
/// holds at least 9 distinct terminal/honor kinds. Only meaningful on a
/// seat's very first draw of the hand.
pub fn can_call_kyuushu_kyuuhai(state: &RoundState, seat: u8) -> bool {
    let any_discards = state.players.iter().any(|p| !p.discards.is_empty());
    let any_melds = state.players.iter().any(|p| !p.melds.is_empty());
    if any_discards || any_melds {
        return false;
    }
    count_distinct_terminal_honor_kinds(state, seat) >= 9
}

fn count_distinct_terminal_honor_kinds(state: &RoundState, seat: u8) -> usize {
    let mut kinds = std::collections::HashSet::new();
    for &tile_id in &state.player(seat).hand {
        let kind = tile_to_34(tile_id);
        if is_terminal_or_honor(kind) {
            kinds.insert(kind);
        }
    }
    kinds.len()
}

/// Triple ron (three simultaneous winners) is an abortive draw with no
/// payment, distinct from the double-ron path which does pay out.
pub fn check_triple_ron(ron_callers: &[u8], settings: &GameSettings) -> bool {
    ron_callers.len() as u8 > settings.double_ron_limit
}

/// First four discards are one per seat and all the same wind kind, with
/// no open meld yet called by anyone.
pub fn check_four_winds(state: &RoundState, settings: &GameSettings) -> bool {
    let discard_count = settings.four_winds_discard_count as usize;
    if state.players.iter().any(|p| p.has_open_melds()) {
        return false;
    }
    let total_discards: usize = state.players.iter().map(|p| p.discards.len()).sum();
    if total_discards != discard_count {
        return false;
    }
    let mut first_kinds = Vec::new();
    for seat in 0..4usize {
        let Some(first) = state.players[seat].discards.first() else {
            return false;
        };
        first_kinds.push(tile_to_34(first.tile_id));
    }
    let first = first_kinds[0];
    crate::tiles::is_honor(first) && first_kinds.iter().all(|&k| k == first) && crate::tiles::WINDS_34.contains(&first)
}

/// Four kans abort iff the total kan count reaches the configured maximum
/// *and* at least `min_players_for_kan_abort` distinct seats contributed
/// one (a single seat collecting all four kans does not abort).
pub fn check_four_kans(state: &RoundState, settings: &GameSettings) -> bool {
    state.kans_called >= settings.max_kans_per_round
        && state.kan_contributing_seats.len() as u32 >= settings.min_players_for_kan_abort
}

/// Nagashi mangan: at exhaustive draw, a seat whose entire discard pile is
/// terminal/honor tiles, none of which were ever called by another seat,
/// and who never opened its own hand, is paid as if it won a dealer
/// mangan. Checked only once the live wall has actually run out.
pub fn is_nagashi_mangan_qualified(state: &RoundState, seat: u8) -> bool {
    let player = state.player(seat);
    !player.has_open_melds()
        && !player.discard_was_called
        && !player.discards.is_empty()
        && player.discards.iter().all(|d| is_terminal_or_honor(tile_to_34(d.tile_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MahjongPlayer;
    use crate::round_state::{RoundPhase, RoundWind};
    use std::collections::HashSet;

    fn base_round() -> RoundState {
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
    fn kyuushu_kyuuhai_requires_nine_distinct_terminal_honor_kinds() {
        let mut state = base_round();
        // 9 distinct terminal/honor kinds: 1m,9m,1p,9p,1s,9s,E,S,W
        let kinds = [0u8, 8, 9, 17, 18, 26, 27, 28, 29];
        state.players[0].hand = kinds.iter().map(|&k| k * 4).collect();
        assert!(can_call_kyuushu_kyuuhai(&state, 0));

        state.players[0].hand.truncate(8);
        assert!(!can_call_kyuushu_kyuuhai(&state, 0));
    }

    #[test]
    fn four_kans_needs_two_distinct_seats() {
        let mut state = base_round();
        let settings = GameSettings::default();
        state.kans_called = 4;
        state.kan_contributing_seats = [0u8].into_iter().collect();
        assert!(!check_four_kans(&state, &settings));

        state.kan_contributing_seats = [0u8, 1].into_iter().collect();
        assert!(check_four_kans(&state, &settings));
    }

    #[test]
    fn triple_ron_exceeds_configured_limit() {
        let settings = GameSettings::default();
        assert!(!check_triple_ron(&[0, 1], &settings));
        assert!(check_triple_ron(&[0, 1, 2], &settings));
    }
}
