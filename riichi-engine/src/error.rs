//! Typed engine errors (§7). The engine never panics on a malformed-but-
//! well-typed action; it returns one of these, and the service boundary is
//! the only place that converts a variant into a wire `ERROR` event.

use thiserror::Error;

use riichi_protocol::wire::GameAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationContext {
    pub action: Option<GameActionKind>,
    pub seat: u8,
    pub reason: String,
}

/// A lightweight, `PartialEq`-friendly mirror of [`GameAction`] for
/// embedding in error contexts without pulling wire-codec concerns in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameActionKind {
    Discard,
    DeclareRiichi,
    DeclareTsumo,
    CallRon,
    CallPon,
    CallChi,
    CallKan,
    CallKyuushu,
    Pass,
    ConfirmRound,
}

impl From<GameAction> for GameActionKind {
    fn from(action: GameAction) -> Self {
        match action {
            GameAction::Discard => Self::Discard,
            GameAction::DeclareRiichi => Self::DeclareRiichi,
            GameAction::DeclareTsumo => Self::DeclareTsumo,
            GameAction::CallRon => Self::CallRon,
            GameAction::CallPon => Self::CallPon,
            GameAction::CallChi => Self::CallChi,
            GameAction::CallKan => Self::CallKan,
            GameAction::CallKyuushu => Self::CallKyuushu,
            GameAction::Pass => Self::Pass,
            GameAction::ConfirmRound => Self::ConfirmRound,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("rule violation on seat {} ({}): {}", .0.seat, describe(.0.action), .0.reason)]
    RuleBroken(ViolationContext),

    #[error("adversarial action from seat {}: {}", .0.seat, .0.reason)]
    Adversarial(ViolationContext),

    #[error("fatal invariant broken: {0}")]
    FatalInvariant(String),
}

fn describe(action: &Option<GameActionKind>) -> &'static str {
    match action {
        Some(GameActionKind::Discard) => "discard",
        Some(GameActionKind::DeclareRiichi) => "declare_riichi",
        Some(GameActionKind::DeclareTsumo) => "declare_tsumo",
        Some(GameActionKind::CallRon) => "call_ron",
        Some(GameActionKind::CallPon) => "call_pon",
        Some(GameActionKind::CallChi) => "call_chi",
        Some(GameActionKind::CallKan) => "call_kan",
        Some(GameActionKind::CallKyuushu) => "call_kyuushu",
        Some(GameActionKind::Pass) => "pass",
        Some(GameActionKind::ConfirmRound) => "confirm_round",
        None => "none",
    }
}

impl RuleViolation {
    pub fn rule(action: impl Into<Option<GameActionKind>>, seat: u8, reason: impl Into<String>) -> Self {
        Self::RuleBroken(ViolationContext {
            action: action.into(),
            seat,
            reason: reason.into(),
        })
    }

    pub fn wire_code(&self) -> &'static str {
        match self {
            RuleViolation::RuleBroken(_) => "ACTION_FAILED",
            RuleViolation::Adversarial(_) => "ACTION_FAILED",
            RuleViolation::FatalInvariant(_) => "GAME_ERROR",
        }
    }
}
