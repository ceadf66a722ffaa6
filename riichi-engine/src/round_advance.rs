//! Round-advance confirmation tracking (§4.4). After any terminal round
//! outcome, every human seat must explicitly confirm before the next round
//! begins; AI seats are pre-confirmed.

use std::collections::{HashMap, HashSet};

use crate::round_state::PendingRoundAdvance;

#[derive(Default)]
pub struct RoundAdvanceManager {
    pending: HashMap<String, PendingRoundAdvance>,
}

impl RoundAdvanceManager {
    pub fn is_pending(&self, game_id: &str) -> bool {
        self.pending.contains_key(game_id)
    }

    pub fn get_unconfirmed_seats(&self, game_id: &str) -> HashSet<u8> {
        self.pending
            .get(game_id)
            .map(|p| p.required_seats.difference(&p.confirmed_seats).copied().collect())
            .unwrap_or_default()
    }

    pub fn is_seat_required(&self, game_id: &str, seat: u8) -> bool {
        self.pending.get(game_id).is_some_and(|p| p.required_seats.contains(&seat))
    }

    /// Sets up a pending advance for `game_id` given the AI seats; required
    /// seats are every seat minus those. If the set of required seats is
    /// already empty (an all-AI game), no entry is stored and this returns
    /// `true` immediately so the caller can advance without waiting.
    pub fn setup_pending(&mut self, game_id: &str, ai_player_seats: &HashSet<u8>) -> bool {
        let required_seats: HashSet<u8> = (0u8..4).filter(|s| !ai_player_seats.contains(s)).collect();
        if required_seats.is_empty() {
            self.pending.remove(game_id);
            return true;
        }
        self.pending.insert(
            game_id.to_string(),
            PendingRoundAdvance {
                confirmed_seats: HashSet::new(),
                required_seats,
            },
        );
        false
    }

    /// Records `seat`'s confirmation. Returns `None` if there is no
    /// pending advance at all (a logic error upstream), `Some(false)` if
    /// the seat isn't required or more confirmations are still needed, and
    /// `Some(true)` once every required seat has confirmed (the entry is
    /// then removed).
    pub fn confirm_seat(&mut self, game_id: &str, seat: u8) -> Option<bool> {
        let pending = self.pending.get_mut(game_id)?;
        if !pending.required_seats.contains(&seat) {
            tracing::warn!(game_id, seat, "confirm_round from a seat that isn't required");
            return Some(false);
        }
        pending.confirmed_seats.insert(seat);
        if pending.all_confirmed() {
            self.pending.remove(game_id);
            Some(true)
        } else {
            Some(false)
        }
    }

    pub fn cleanup_game(&mut self, game_id: &str) {
        self.pending.remove(game_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ai_game_advances_immediately() {
        let mut manager = RoundAdvanceManager::default();
        let ai_seats: HashSet<u8> = [0, 1, 2, 3].into_iter().collect();
        assert!(manager.setup_pending("g1", &ai_seats));
        assert!(!manager.is_pending("g1"));
    }

    #[test]
    fn confirms_accumulate_until_all_required_seats_respond() {
        let mut manager = RoundAdvanceManager::default();
        let ai_seats: HashSet<u8> = [2, 3].into_iter().collect();
        assert!(!manager.setup_pending("g1", &ai_seats));
        assert_eq!(manager.confirm_seat("g1", 0), Some(false));
        assert_eq!(manager.confirm_seat("g1", 1), Some(true));
        assert!(!manager.is_pending("g1"));
    }

    #[test]
    fn unrequired_seat_confirm_does_not_complete_it() {
        let mut manager = RoundAdvanceManager::default();
        let ai_seats: HashSet<u8> = [1, 2, 3].into_iter().collect();
        manager.setup_pending("g1", &ai_seats);
        assert_eq!(manager.confirm_seat("g1", 1), Some(false));
        assert!(manager.is_pending("g1"));
    }
}
