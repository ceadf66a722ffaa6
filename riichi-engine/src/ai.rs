//! AI decision port (§2 "AI decision port", 4% share): a pure function
//! returning the default tsumogiri action for a seat. Real AI strategy is
//! explicitly out of scope; this exists so AI-substituted and all-AI games
//! can still progress through the turn engine.

use crate::round_state::{CallResponse, RoundState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiController;

impl AiController {
    /// The tile an AI discards on its turn: always the most recently drawn
    /// tile (tsumogiri), i.e. the last tile in the concealed hand.
    pub fn turn_discard(&self, state: &RoundState, seat: u8) -> Option<u8> {
        state.player(seat).hand.last().copied()
    }

    /// AI never calls; it always passes during a call window.
    pub fn call_response(&self, _state: &RoundState, _seat: u8) -> CallResponse {
        CallResponse::Pass
    }

    /// AI always confirms immediately when a round-advance confirmation is
    /// requested.
    pub fn confirms_round_advance(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MahjongPlayer;
    use crate::round_state::{RoundPhase, RoundWind};
    use std::collections::HashSet;

    #[test]
    fn discards_the_most_recently_drawn_tile() {
        let mut players: [MahjongPlayer; 4] = std::array::from_fn(|i| MahjongPlayer::new(i as u8, 25_000, vec![]));
        players[0].hand = vec![4, 8, 40];
        let state = RoundState {
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
        };
        assert_eq!(AiController.turn_discard(&state, 0), Some(40));
    }

    #[test]
    fn always_passes_on_calls_and_confirms_round_advance() {
        assert_eq!(AiController.confirms_round_advance(), true);
    }
}
