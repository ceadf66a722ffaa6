//! Integer-tagged message kinds, values kept stable across versions so
//! recorded replays stay byte-compatible.

/// The `t` field of an inbound client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireClientMessageType {
    GameAction = 3,
    Chat = 4,
    Ping = 5,
    Reconnect = 6,
    JoinGame = 7,
}

impl WireClientMessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            3 => Some(Self::GameAction),
            4 => Some(Self::Chat),
            5 => Some(Self::Ping),
            6 => Some(Self::Reconnect),
            7 => Some(Self::JoinGame),
            _ => None,
        }
    }
}

/// The inner `action` field of a `GameAction` client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameAction {
    Discard = 0,
    DeclareRiichi = 1,
    DeclareTsumo = 2,
    CallRon = 3,
    CallPon = 4,
    CallChi = 5,
    CallKan = 6,
    CallKyuushu = 7,
    Pass = 8,
    ConfirmRound = 9,
}

impl GameAction {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Discard),
            1 => Some(Self::DeclareRiichi),
            2 => Some(Self::DeclareTsumo),
            3 => Some(Self::CallRon),
            4 => Some(Self::CallPon),
            5 => Some(Self::CallChi),
            6 => Some(Self::CallKan),
            7 => Some(Self::CallKyuushu),
            8 => Some(Self::Pass),
            9 => Some(Self::ConfirmRound),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_action_round_trips_every_value() {
        for raw in 0u8..=9 {
            let action = GameAction::from_u8(raw).expect("valid action byte");
            assert_eq!(action as u8, raw);
        }
        assert!(GameAction::from_u8(10).is_none());
    }

    #[test]
    fn client_message_type_round_trips() {
        for raw in 3u8..=7 {
            let kind = WireClientMessageType::from_u8(raw).expect("valid message byte");
            assert_eq!(kind as u8, raw);
        }
        assert!(WireClientMessageType::from_u8(2).is_none());
    }
}
