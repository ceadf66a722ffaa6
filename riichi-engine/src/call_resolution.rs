//! Multi-seat call response aggregation and resolution (§4.2).

use crate::round_state::{CallPrompt, CallResponse, RoundState};
use crate::settings::GameSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// One or more seats ron'd; `winners` is in seat order.
    Ron { winners: Vec<u8> },
    /// Three-or-more-seat ron with the configured limit exceeded: abortive
    /// triple ron, no payment.
    TripleRonAbort { winners: Vec<u8> },
    Meld { seat: u8, response: CallResponse },
    AllPassed,
}

/// Resolves a prompt that has either received every response or whose
/// early-resolution condition has been met (see [`can_resolve_early`]).
pub fn resolve(prompt: &CallPrompt, settings: &GameSettings) -> Resolution {
    let mut ron_seats: Vec<u8> = prompt
        .responses
        .iter()
        .filter(|(_, r)| matches!(r, CallResponse::Ron))
        .map(|(seat, _)| *seat)
        .collect();
    ron_seats.sort_unstable();

    if !ron_seats.is_empty() {
        if ron_seats.len() as u8 > settings.double_ron_limit {
            return Resolution::TripleRonAbort { winners: ron_seats };
        }
        return Resolution::Ron { winners: ron_seats };
    }

    let meld_responses: Vec<(u8, CallResponse)> = prompt
        .responses
        .iter()
        .filter(|(_, r)| !matches!(r, CallResponse::Pass))
        .cloned()
        .collect();

    let Some(winner) = pick_meld_winner(&meld_responses, prompt.discarder_seat) else {
        return Resolution::AllPassed;
    };
    winner
}

fn call_priority(response: &CallResponse) -> u8 {
    match response {
        CallResponse::Kan => 0,
        CallResponse::Pon => 1,
        CallResponse::Chi { .. } => 2,
        CallResponse::Ron | CallResponse::Pass => u8::MAX,
    }
}

/// Smallest priority wins; ties break by smallest counter-clockwise
/// distance from the discarder.
fn pick_meld_winner(responses: &[(u8, CallResponse)], discarder_seat: u8) -> Option<Resolution> {
    responses
        .iter()
        .min_by_key(|(seat, response)| {
            (
                call_priority(response),
                RoundState::seat_distance(*seat, discarder_seat),
            )
        })
        .map(|(seat, response)| Resolution::Meld {
            seat: *seat,
            response: response.clone(),
        })
}

/// True once no remaining pending seat could possibly beat the current
/// best response (§4.2 "Early resolution"). An open-kan or pon already
/// claimed can never be beaten by any later meld response; a ron response
/// already present always wins outright.
pub fn can_resolve_early(prompt: &CallPrompt) -> bool {
    if prompt.responses.iter().any(|(_, r)| matches!(r, CallResponse::Ron)) {
        return true;
    }
    let best_claimed = prompt
        .responses
        .iter()
        .filter(|(_, r)| !matches!(r, CallResponse::Pass))
        .map(|(_, r)| call_priority(r))
        .min();

    let Some(best_claimed) = best_claimed else {
        return false;
    };

    prompt
        .pending_seats
        .iter()
        .all(|seat| match prompt.eligible_for(*seat) {
            None => true,
            Some(eligible) => {
                let best_possible = match eligible.kind {
                    crate::round_state::CallKind::Ron => return false,
                    crate::round_state::CallKind::OpenKan => 0,
                    crate::round_state::CallKind::Pon => 1,
                    crate::round_state::CallKind::Chi => 2,
                };
                best_possible >= best_claimed
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round_state::{CallKind, EligibleCall};
    use std::collections::HashSet;

    fn prompt_with(discarder: u8, eligible: Vec<EligibleCall>) -> CallPrompt {
        let pending: HashSet<u8> = eligible.iter().map(|e| e.seat).collect();
        CallPrompt {
            tile_id: 40,
            discarder_seat: discarder,
            eligible,
            pending_seats: pending,
            responses: Vec::new(),
            is_chankan: false,
        }
    }

    #[test]
    fn pon_beats_chi_when_both_responded() {
        let mut prompt = prompt_with(
            0,
            vec![
                EligibleCall { seat: 1, kind: CallKind::Chi, chi_completions: vec![(41, 42)] },
                EligibleCall { seat: 2, kind: CallKind::Pon, chi_completions: vec![] },
            ],
        );
        prompt.pending_seats.clear();
        prompt.responses = vec![
            (1, CallResponse::Chi { completion: (41, 42) }),
            (2, CallResponse::Pon),
        ];
        let settings = GameSettings::default();
        assert_eq!(
            resolve(&prompt, &settings),
            Resolution::Meld { seat: 2, response: CallResponse::Pon }
        );
    }

    #[test]
    fn double_ron_reports_both_winners_in_seat_order() {
        let mut prompt = prompt_with(
            0,
            vec![
                EligibleCall { seat: 1, kind: CallKind::Ron, chi_completions: vec![] },
                EligibleCall { seat: 3, kind: CallKind::Ron, chi_completions: vec![] },
            ],
        );
        prompt.pending_seats.clear();
        prompt.responses = vec![(3, CallResponse::Ron), (1, CallResponse::Ron)];
        let settings = GameSettings::default();
        assert_eq!(resolve(&prompt, &settings), Resolution::Ron { winners: vec![1, 3] });
    }

    #[test]
    fn triple_ron_aborts_when_limit_is_two() {
        let mut prompt = prompt_with(0, vec![]);
        prompt.responses = vec![(1, CallResponse::Ron), (2, CallResponse::Ron), (3, CallResponse::Ron)];
        let settings = GameSettings::default();
        assert!(matches!(resolve(&prompt, &settings), Resolution::TripleRonAbort { .. }));
    }

    #[test]
    fn early_resolution_once_open_kan_claimed() {
        let mut prompt = prompt_with(
            0,
            vec![
                EligibleCall { seat: 1, kind: CallKind::OpenKan, chi_completions: vec![] },
                EligibleCall { seat: 2, kind: CallKind::Pon, chi_completions: vec![] },
            ],
        );
        prompt.responses.push((1, CallResponse::Kan));
        prompt.pending_seats.remove(&1);
        assert!(can_resolve_early(&prompt));
    }
}
