//! Dealer rotation and honba bookkeeping at round end (§4.5). Kept as a
//! pure function separate from the three `end_round_*` call sites in
//! `turn_engine` so the outcome table has exactly one place it's encoded.

use crate::round_state::RoundState;

#[derive(Debug, Clone, Copy)]
pub enum RoundOutcome<'a> {
    /// Tsumo or ron; `winners` is the single seat for tsumo, or every
    /// simultaneous ron winner for a (double) ron.
    Win { winners: &'a [u8] },
    ExhaustiveDraw { dealer_tenpai: bool },
    /// Kyuushu kyuuhai, four kans, four winds, triple ron: every abortive
    /// draw other than an exhaustive one shares the same renchan rule.
    AbortiveDraw,
    NagashiMangan { dealer_qualified: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationResult {
    pub next_dealer_seat: u8,
    pub dealer_rotates: bool,
    pub next_honba: u16,
}

/// Maps a round outcome to the next dealer seat and honba count. A dealer
/// win, any non-exhaustive abortive draw, and a dealer-qualified nagashi
/// mangan are all renchan: the dealer repeats and honba climbs by one.
/// Everything else rotates the dealer to the next seat; only a win or
/// nagashi mangan also resets honba to zero, and only when the dealer
/// wasn't the one who triggered it.
pub fn compute_rotation(dealer_seat: u8, honba: u16, outcome: RoundOutcome<'_>) -> RotationResult {
    let (rotates, resets_honba) = match outcome {
        RoundOutcome::Win { winners } => {
            let dealer_won = winners.contains(&dealer_seat);
            (!dealer_won, !dealer_won)
        }
        RoundOutcome::ExhaustiveDraw { dealer_tenpai } => (!dealer_tenpai, false),
        RoundOutcome::AbortiveDraw => (false, false),
        RoundOutcome::NagashiMangan { dealer_qualified } => (!dealer_qualified, false),
    };
    let next_honba = if resets_honba { 0 } else { honba + 1 };
    let next_dealer_seat = if rotates { RoundState::next_seat(dealer_seat) } else { dealer_seat };
    RotationResult { next_dealer_seat, dealer_rotates: rotates, next_honba }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dealer_tsumo_is_renchan_with_honba_increment() {
        let r = compute_rotation(0, 2, RoundOutcome::Win { winners: &[0] });
        assert_eq!(r, RotationResult { next_dealer_seat: 0, dealer_rotates: false, next_honba: 3 });
    }

    #[test]
    fn non_dealer_win_rotates_and_resets_honba() {
        let r = compute_rotation(0, 3, RoundOutcome::Win { winners: &[1] });
        assert_eq!(r, RotationResult { next_dealer_seat: 1, dealer_rotates: true, next_honba: 0 });
    }

    #[test]
    fn double_ron_including_dealer_does_not_rotate() {
        let r = compute_rotation(2, 0, RoundOutcome::Win { winners: &[2, 3] });
        assert_eq!(r, RotationResult { next_dealer_seat: 2, dealer_rotates: false, next_honba: 1 });
    }

    #[test]
    fn double_ron_excluding_dealer_rotates_and_resets() {
        let r = compute_rotation(0, 4, RoundOutcome::Win { winners: &[1, 2] });
        assert_eq!(r, RotationResult { next_dealer_seat: 1, dealer_rotates: true, next_honba: 0 });
    }

    #[test]
    fn exhaustive_draw_dealer_tenpai_is_renchan() {
        let r = compute_rotation(1, 0, RoundOutcome::ExhaustiveDraw { dealer_tenpai: true });
        assert_eq!(r, RotationResult { next_dealer_seat: 1, dealer_rotates: false, next_honba: 1 });
    }

    #[test]
    fn exhaustive_draw_dealer_noten_rotates_but_keeps_honba_climbing() {
        let r = compute_rotation(1, 0, RoundOutcome::ExhaustiveDraw { dealer_tenpai: false });
        assert_eq!(r, RotationResult { next_dealer_seat: 2, dealer_rotates: true, next_honba: 1 });
    }

    #[test]
    fn abortive_draw_is_always_renchan() {
        let r = compute_rotation(3, 1, RoundOutcome::AbortiveDraw);
        assert_eq!(r, RotationResult { next_dealer_seat: 3, dealer_rotates: false, next_honba: 2 });
    }

    #[test]
    fn nagashi_mangan_follows_dealer_qualification() {
        let qualified = compute_rotation(2, 0, RoundOutcome::NagashiMangan { dealer_qualified: true });
        assert_eq!(qualified, RotationResult { next_dealer_seat: 2, dealer_rotates: false, next_honba: 1 });

        let not_qualified = compute_rotation(2, 0, RoundOutcome::NagashiMangan { dealer_qualified: false });
        assert_eq!(not_qualified, RotationResult { next_dealer_seat: 3, dealer_rotates: true, next_honba: 1 });
    }
}
