//! Session tokens and reconnection bookkeeping (§4.4, §8). Token rotation
//! on reconnect is a prepare/commit two-step: `prepare_token_rotation`
//! never mutates the store, so the old token keeps working until the
//! caller has actually delivered the new one to the client and calls
//! `commit_token_rotation`.

use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_token: String,
    pub user_id: String,
    pub game_id: String,
    pub seat: u8,
    pub connected: bool,
    pub preserved_bank_seconds: Option<f64>,
}

#[derive(Default)]
pub struct SessionStore {
    by_token: HashMap<String, SessionData>,
}

impl SessionStore {
    pub fn create_session(&mut self, user_id: impl Into<String>, game_id: impl Into<String>, seat: u8) -> String {
        let token = Uuid::new_v4().to_string();
        self.by_token.insert(
            token.clone(),
            SessionData {
                session_token: token.clone(),
                user_id: user_id.into(),
                game_id: game_id.into(),
                seat,
                connected: true,
                preserved_bank_seconds: None,
            },
        );
        token
    }

    pub fn get_session(&self, token: &str) -> Option<&SessionData> {
        self.by_token.get(token)
    }

    pub fn mark_disconnected(&mut self, token: &str, bank_seconds: f64) {
        if let Some(session) = self.by_token.get_mut(token) {
            session.connected = false;
            session.preserved_bank_seconds = Some(bank_seconds);
        }
    }

    pub fn mark_reconnected(&mut self, token: &str) -> Option<f64> {
        let session = self.by_token.get_mut(token)?;
        session.connected = true;
        session.preserved_bank_seconds.take()
    }

    pub fn remove_session(&mut self, token: &str) {
        self.by_token.remove(token);
    }

    /// Generates a fresh token for the session currently bound to
    /// `old_token`, without touching the store. The caller must deliver
    /// this token to the client and only then call
    /// [`commit_token_rotation`](Self::commit_token_rotation); until that
    /// happens, `old_token` is still a valid, live session.
    pub fn prepare_token_rotation(&self, old_token: &str) -> Option<String> {
        self.by_token.get(old_token)?;
        Some(Uuid::new_v4().to_string())
    }

    /// Swaps the session from `old_token` to `new_token`. Call only after
    /// `new_token` has been successfully delivered to the client.
    pub fn commit_token_rotation(&mut self, old_token: &str, new_token: &str) -> bool {
        let Some(mut session) = self.by_token.remove(old_token) else {
            return false;
        };
        session.session_token = new_token.to_string();
        self.by_token.insert(new_token.to_string(), session);
        true
    }

    pub fn cleanup_game(&mut self, game_id: &str) {
        self.by_token.retain(|_, session| session.game_id != game_id);
    }

    /// Finds the seat a player was already assigned when a game started, so
    /// a first-time connection carrying only an admission ticket (no
    /// session token yet) can be matched back to its seat.
    pub fn find_by_user_and_game(&self, user_id: &str, game_id: &str) -> Option<&SessionData> {
        self.by_token
            .values()
            .find(|session| session.user_id == user_id && session.game_id == game_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_token_still_valid_until_commit() {
        let mut store = SessionStore::default();
        let token = store.create_session("u1", "g1", 2);
        let new_token = store.prepare_token_rotation(&token).unwrap();
        assert!(store.get_session(&token).is_some());
        assert!(store.get_session(&new_token).is_none());

        assert!(store.commit_token_rotation(&token, &new_token));
        assert!(store.get_session(&token).is_none());
        assert!(store.get_session(&new_token).is_some());
    }

    #[test]
    fn disconnect_preserves_bank_until_reconnect() {
        let mut store = SessionStore::default();
        let token = store.create_session("u1", "g1", 0);
        store.mark_disconnected(&token, 12.5);
        assert!(!store.get_session(&token).unwrap().connected);
        assert_eq!(store.mark_reconnected(&token), Some(12.5));
        assert!(store.get_session(&token).unwrap().connected);
        // Preserved bank is consumed once on reconnect.
        assert_eq!(store.get_session(&token).unwrap().preserved_bank_seconds, None);
    }

    #[test]
    fn finds_session_by_user_and_game_for_ticket_only_join() {
        let mut store = SessionStore::default();
        let token = store.create_session("u1", "g1", 3);
        let found = store.find_by_user_and_game("u1", "g1").unwrap();
        assert_eq!(found.session_token, token);
        assert!(store.find_by_user_and_game("u1", "g2").is_none());
    }

    #[test]
    fn cleanup_game_removes_only_its_sessions() {
        let mut store = SessionStore::default();
        let t1 = store.create_session("u1", "g1", 0);
        let t2 = store.create_session("u2", "g2", 0);
        store.cleanup_game("g1");
        assert!(store.get_session(&t1).is_none());
        assert!(store.get_session(&t2).is_some());
    }
}
