//! Wire-format types shared between the engine and the networked server.
//!
//! This crate has no knowledge of game rules and no async runtime dependency.
//! It only knows how bytes on the wire map to typed Rust values: the client
//! message envelope, the compact integer packings for draw/discard events,
//! and the msgpack framing with its size limits.

pub mod codec;
pub mod compact;
pub mod error;
pub mod messages;
pub mod wire;

pub use codec::{decode_client_frame, decode_frame, encode_frame};
pub use error::ProtocolError;
pub use wire::{GameAction, WireClientMessageType};
