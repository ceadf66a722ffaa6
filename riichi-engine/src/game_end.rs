//! Game-end decision after each round finishes (§4.5). Two independent
//! conditions: a score gone negative ends the game immediately regardless
//! of wind; otherwise the game ends once the configured number of unique
//! dealers have held the seat, unless the dealer just repeated and meets
//! the renchan-override score, which buys the table another hand.

use crate::round_state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    ScoreBelowZero,
    WindLimitReached,
}

impl GameEndReason {
    pub fn wire_reason(self) -> &'static str {
        match self {
            GameEndReason::ScoreBelowZero => "score_below_zero",
            GameEndReason::WindLimitReached => "wind_limit_reached",
        }
    }
}

/// `dealer_rotated` is the just-finished round's rotation outcome: whether
/// the dealer seat is about to change hands for the round that would come
/// next. `game.unique_dealers_seen` has not yet been incremented for this
/// round's outcome when this is called.
pub fn check_game_end(game: &GameState, dealer_rotated: bool) -> Option<GameEndReason> {
    if game.round.players.iter().any(|p| p.score < 0) {
        return Some(GameEndReason::ScoreBelowZero);
    }

    let unique_dealers_seen = if dealer_rotated { game.unique_dealers_seen + 1 } else { game.unique_dealers_seen };
    let threshold = game.settings.game_length.unique_dealer_threshold();
    if unique_dealers_seen < threshold {
        return None;
    }

    if !dealer_rotated {
        if let Some(override_score) = game.settings.dealer_renchan_override_score {
            let dealer_score = game.round.player(game.round.dealer_seat).score;
            if dealer_score >= override_score {
                return None;
            }
        }
    }
    Some(GameEndReason::WindLimitReached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MahjongPlayer;
    use crate::round_state::{GamePhase, RoundPhase, RoundWind};
    use crate::settings::{GameLength, GameSettings};
    use std::collections::HashSet;

    fn base_game(settings: GameSettings, unique_dealers_seen: u32) -> GameState {
        GameState {
            game_id: "g1".to_string(),
            round: crate::round_state::RoundState {
                wall: None,
                players: std::array::from_fn(|i| MahjongPlayer::new(i as u8, 25_000, vec![])),
                dealer_seat: 0,
                round_wind: RoundWind::East,
                hand_number: 1,
                honba: 0,
                riichi_sticks: 0,
                current_player_seat: 0,
                pending_call_prompt: None,
                phase: RoundPhase::Finished,
                drawn_count: 0,
                rinshan_draws: 0,
                pending_dora_reveals: 0,
                revealed_dora_indicators: 1,
                kans_called: 0,
                kan_contributing_seats: HashSet::new(),
            },
            settings,
            total_riichi_sticks: 0,
            honba_sticks: 0,
            unique_dealers_seen,
            phase: GamePhase::Playing,
        }
    }

    #[test]
    fn negative_score_ends_the_game_immediately() {
        let mut game = base_game(GameSettings { game_length: GameLength::EastOnly, ..GameSettings::default() }, 0);
        game.round.players[2].score = -500;
        assert_eq!(check_game_end(&game, false), Some(GameEndReason::ScoreBelowZero));
    }

    #[test]
    fn east_only_ends_after_four_unique_dealers() {
        let settings = GameSettings { game_length: GameLength::EastOnly, ..GameSettings::default() };
        let game = base_game(settings, 3);
        assert_eq!(check_game_end(&game, true), Some(GameEndReason::WindLimitReached));
        assert_eq!(check_game_end(&game, false), None);
    }

    #[test]
    fn renchan_override_extends_past_the_threshold() {
        let settings = GameSettings {
            game_length: GameLength::EastOnly,
            dealer_renchan_override_score: Some(30_000),
            ..GameSettings::default()
        };
        let mut game = base_game(settings, 4);
        game.round.players[0].score = 31_000;
        assert_eq!(check_game_end(&game, false), None);

        game.round.players[0].score = 10_000;
        assert_eq!(check_game_end(&game, false), Some(GameEndReason::WindLimitReached));
    }
}
