//! Typed shapes for the client→server frame and the server→client domain
//! events. These are plain wire DTOs: seats and tile ids are the raw `u8`
//! wire representation, not the engine's domain types, so this crate never
//! needs to depend on `riichi-engine`.

use serde::{Deserialize, Serialize};

use crate::wire::{GameAction, WireClientMessageType};

/// A decoded client frame. Fields irrelevant to a given `t`/`action`
/// combination are simply `None`; this mirrors the flat, self-describing
/// map the codec decodes off the wire rather than a Rust-level tagged enum,
/// since the tag (`t`) is a small integer rather than a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub t: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_tiles: Option<(u8, u8)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kan_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ClientFrame {
    pub fn message_type(&self) -> Option<WireClientMessageType> {
        WireClientMessageType::from_u8(self.t)
    }

    pub fn game_action(&self) -> Option<GameAction> {
        self.action.and_then(GameAction::from_u8)
    }
}

/// A single legal call a seat may make during a [`ServerEvent::CallPrompt`],
/// with the explicit two-tile completions when the call is a chi.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOption {
    pub call_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<(u8, u8)>>,
}

/// Domain events emitted by the engine, tagged the way §6 specifies: a
/// closed set of kinds under a `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Draw {
        seat: u8,
        /// `Some` only in the copy delivered to the drawing seat; the
        /// broadcast copy omits the tile so other seats cannot see it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compact: Option<u32>,
    },
    Discard {
        seat: u8,
        tile_id: u8,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_tsumogiri: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_riichi: bool,
    },
    Meld {
        caller_seat: u8,
        source_seat: u8,
        meld_type: String,
        tiles: Vec<u8>,
        called_tile: u8,
    },
    CallPrompt {
        discarder_seat: u8,
        tile_id: u8,
        caller_seat: u8,
        available_calls: Vec<CallOption>,
    },
    RoundEnd {
        result_type: String,
        winners: Vec<u8>,
        dealer_seat: u8,
        honba: u16,
        scores: [i32; 4],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pao_seat: Option<u8>,
    },
    RiichiDeclared {
        seat: u8,
        is_daburi: bool,
    },
    DoraRevealed {
        tile_id: u8,
        is_ura: bool,
    },
    Error {
        code: String,
        reason: String,
    },
    GameStarted {
        game_id: String,
        dealer_seat: u8,
        seat_names: [String; 4],
    },
    RoundStarted {
        seat: u8,
        hand: Vec<u8>,
        round_wind: String,
        hand_number: u8,
        honba: u16,
    },
    GameEnd {
        final_scores: [i32; 4],
        end_reason: String,
    },
    Furiten {
        seat: u8,
        is_furiten: bool,
    },
    /// Delivered once, seat-scoped, to a reconnecting client: the new
    /// session token to present on the next reconnect. The old token stays
    /// valid until this send succeeds and the server commits the rotation.
    Reconnected {
        seat: u8,
        new_token: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_frame, encode_frame};

    #[test]
    fn client_frame_round_trips_through_the_wire_codec() {
        let frame = ClientFrame {
            t: WireClientMessageType::GameAction as u8,
            action: Some(GameAction::Discard as u8),
            tile_id: Some(42),
            sequence_tiles: None,
            kan_type: None,
            token: None,
            ticket: None,
            text: None,
        };
        let bytes = encode_frame(&frame).unwrap();
        decode_frame(&bytes).unwrap();
        let decoded: ClientFrame = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded.message_type(), Some(WireClientMessageType::GameAction));
        assert_eq!(decoded.game_action(), Some(GameAction::Discard));
        assert_eq!(decoded.tile_id, Some(42));
    }

    #[test]
    fn server_event_tags_round_trip() {
        let event = ServerEvent::Discard {
            seat: 2,
            tile_id: 10,
            is_tsumogiri: true,
            is_riichi: false,
        };
        let bytes = encode_frame(&event).unwrap();
        let decoded: ServerEvent = rmp_serde::from_slice(&bytes).unwrap();
        match decoded {
            ServerEvent::Discard { seat, tile_id, is_tsumogiri, is_riichi } => {
                assert_eq!((seat, tile_id, is_tsumogiri, is_riichi), (2, 10, true, false));
            }
            other => panic!("unexpected variant decoded: {other:?}"),
        }
    }
}
