//! Builds a fresh [`RoundState`] from a wall seed: the shared construction
//! path for both the initial hand of a new game (§4.4 "Start game") and
//! every subsequent round advance (§4.5), so the two sites can't drift.

use std::collections::HashSet;

use crate::player::MahjongPlayer;
use crate::ports::WallBuilder;
use crate::round_state::{GameState, RoundPhase, RoundState, RoundWind};
use crate::rotation::RotationResult;

pub struct NewRoundSpec {
    pub dealer_seat: u8,
    pub round_wind: RoundWind,
    pub hand_number: u8,
    pub honba: u16,
    pub riichi_sticks: u16,
    pub scores: [i32; 4],
}

/// Shuffles a fresh wall with `wall_builder` and `seed`, deals the four
/// starting hands off it, and assembles the round state the dealer is
/// about to draw into. The wall is kept on the returned state so later
/// draws and dora reveals can pull from it.
pub fn build_round_state(spec: NewRoundSpec, wall_builder: &impl WallBuilder, seed: &[u8]) -> RoundState {
    let wall = wall_builder.build_wall(seed);
    let players: [MahjongPlayer; 4] =
        std::array::from_fn(|seat| MahjongPlayer::new(seat as u8, spec.scores[seat], wall.initial_hand(seat as u8).to_vec()));

    RoundState {
        wall: Some(wall),
        players,
        dealer_seat: spec.dealer_seat,
        round_wind: spec.round_wind,
        hand_number: spec.hand_number,
        honba: spec.honba,
        riichi_sticks: spec.riichi_sticks,
        current_player_seat: spec.dealer_seat,
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

/// Derives the next hand's spec from the game state a round just finished
/// against and that round's rotation outcome. `game.unique_dealers_seen`
/// must already reflect this round's outcome (the caller increments it
/// before calling this, iff the dealer rotated) so the wind/hand-number
/// pair can be read straight off it: every 4 unique dealers is one full
/// go-around, matching [`RoundWind::from_cycle`].
pub fn next_round_spec(game: &GameState, rotation: &RotationResult, pot_claimed: bool) -> NewRoundSpec {
    let cycle = game.unique_dealers_seen / 4;
    let hand_number = (game.unique_dealers_seen % 4) as u8 + 1;
    NewRoundSpec {
        dealer_seat: rotation.next_dealer_seat,
        round_wind: RoundWind::from_cycle(cycle),
        hand_number,
        honba: rotation.next_honba,
        riichi_sticks: if pot_claimed { 0 } else { game.round.riichi_sticks },
        scores: std::array::from_fn(|i| game.round.players[i].score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StandardWallBuilder;

    #[test]
    fn deals_thirteen_tiles_to_every_seat() {
        let spec = NewRoundSpec {
            dealer_seat: 0,
            round_wind: RoundWind::East,
            hand_number: 1,
            honba: 0,
            riichi_sticks: 0,
            scores: [25_000; 4],
        };
        let state = build_round_state(spec, &StandardWallBuilder, b"seed");
        for seat in 0..4 {
            assert_eq!(state.player(seat).hand.len(), 13);
        }
        assert_eq!(state.current_player_seat, 0);
    }

    #[test]
    fn next_round_spec_advances_wind_every_four_unique_dealers() {
        use crate::player::MahjongPlayer;
        use crate::rotation::RotationResult;
        use crate::round_state::{GamePhase, RoundPhase};
        use crate::settings::GameSettings;

        let game = GameState {
            game_id: "g1".to_string(),
            round: RoundState {
                wall: None,
                players: std::array::from_fn(|i| MahjongPlayer::new(i as u8, 25_000, vec![])),
                dealer_seat: 3,
                round_wind: RoundWind::East,
                hand_number: 4,
                honba: 0,
                riichi_sticks: 0,
                current_player_seat: 3,
                pending_call_prompt: None,
                phase: RoundPhase::Finished,
                drawn_count: 0,
                rinshan_draws: 0,
                pending_dora_reveals: 0,
                revealed_dora_indicators: 1,
                kans_called: 0,
                kan_contributing_seats: HashSet::new(),
            },
            settings: GameSettings::default(),
            total_riichi_sticks: 0,
            honba_sticks: 0,
            unique_dealers_seen: 4,
            phase: GamePhase::Playing,
        };
        let rotation = RotationResult { next_dealer_seat: 0, dealer_rotates: true, next_honba: 0 };
        let spec = next_round_spec(&game, &rotation, true);
        assert_eq!(spec.round_wind, RoundWind::South);
        assert_eq!(spec.hand_number, 1);
        assert_eq!(spec.riichi_sticks, 0);
    }
}
