//! Pre-game lobby (§4.4 "Rooms"). Networking/connection identity is the
//! server's concern; this module only tracks membership, readiness, and
//! the transition-in-progress flag.

use std::collections::HashMap;

use crate::settings::{GameSettings, MAX_AI_PLAYERS};

pub const NUM_PLAYERS: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub connection_id: String,
    pub name: String,
    pub session_token: String,
    pub user_id: String,
    pub ready: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub room_id: String,
    pub num_ai_players: u8,
    pub host_connection_id: Option<String>,
    pub transitioning: bool,
    pub members: HashMap<String, RoomMember>, // keyed by connection_id
    pub settings: GameSettings,
}

impl Room {
    pub fn new(room_id: impl Into<String>, num_ai_players: u8) -> Self {
        assert!(num_ai_players <= MAX_AI_PLAYERS, "num_ai_players out of range");
        Self {
            room_id: room_id.into(),
            num_ai_players,
            host_connection_id: None,
            transitioning: false,
            members: HashMap::new(),
            settings: GameSettings::default(),
        }
    }

    pub fn players_needed(&self) -> u8 {
        NUM_PLAYERS - self.num_ai_players
    }

    pub fn player_count(&self) -> u8 {
        self.members.len() as u8
    }

    pub fn is_full(&self) -> bool {
        self.player_count() >= self.players_needed()
    }

    pub fn all_ready(&self) -> bool {
        self.is_full() && self.members.values().all(|m| m.ready)
    }

    pub fn join(&mut self, member: RoomMember) {
        if self.host_connection_id.is_none() {
            self.host_connection_id = Some(member.connection_id.clone());
        }
        self.members.insert(member.connection_id.clone(), member);
    }

    pub fn set_ready(&mut self, connection_id: &str, ready: bool) {
        if let Some(member) = self.members.get_mut(connection_id) {
            member.ready = ready;
        }
    }

    pub fn player_names(&self) -> Vec<String> {
        self.members.values().map(|m| m.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> RoomMember {
        RoomMember {
            connection_id: id.to_string(),
            name: format!("player-{id}"),
            session_token: format!("token-{id}"),
            user_id: String::new(),
            ready: false,
        }
    }

    #[test]
    fn first_joiner_becomes_host() {
        let mut room = Room::new("r1", 3);
        room.join(member("c1"));
        assert_eq!(room.host_connection_id.as_deref(), Some("c1"));
    }

    #[test]
    fn starts_only_when_full_and_all_ready() {
        let mut room = Room::new("r1", 3); // needs 1 human
        room.join(member("c1"));
        assert!(room.is_full());
        assert!(!room.all_ready());
        room.set_ready("c1", true);
        assert!(room.all_ready());
    }

    #[test]
    fn three_player_room_requires_all_three_ready() {
        let mut room = Room::new("r1", 1); // needs 3 humans
        room.join(member("c1"));
        room.join(member("c2"));
        assert!(!room.is_full());
        room.join(member("c3"));
        assert!(room.is_full());
        room.set_ready("c1", true);
        room.set_ready("c2", true);
        assert!(!room.all_ready());
        room.set_ready("c3", true);
        assert!(room.all_ready());
    }
}
