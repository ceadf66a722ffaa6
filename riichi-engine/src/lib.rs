//! Rule engine and turn/call state machine for a four-seat riichi mahjong
//! game server. Pure and synchronous: owns no sockets, no timers' wall-clock
//! behavior (only the deadline bookkeeping), and no persistence — those are
//! the server crate's concerns, wired in through the ports in
//! [`ports`] and the timer driver in [`timer`].

pub mod abortive;
pub mod ai;
pub mod call_resolution;
pub mod error;
pub mod events;
pub mod furiten;
pub mod game_end;
pub mod matchmaker;
pub mod meld;
pub mod player;
pub mod ports;
pub mod room;
pub mod round_advance;
pub mod round_builder;
pub mod round_state;
pub mod rotation;
pub mod session;
pub mod settings;
pub mod state_utils;
pub mod tiles;
pub mod timer;
pub mod turn_engine;
pub mod wall;

pub use error::RuleViolation;
pub use events::{EventTarget, RoutedEvent};
pub use round_state::{GamePhase, GameState, RoundPhase, RoundState};
pub use turn_engine::{apply_action, EngineAction, EngineResult};
