//! Global server state: the rooms players are sitting in lobbies, and the
//! live games those rooms graduate into once all four seats are filled.
//! Mirrors the rooms/configs split the relay carries, but a "room" here is
//! a lobby, and a started game hands off to its own serialized
//! [`crate::game_actor::GameActor`] task rather than a relay channel.

use std::collections::HashMap;
use std::sync::Arc;

use riichi_engine::room::Room;
use riichi_engine::session::SessionStore;
use riichi_protocol::messages::ServerEvent;
use tokio::sync::{broadcast, mpsc, Mutex, Notify};

use crate::game_actor::GameCommand;

/// Handle to a running game's actor task, held by the server so incoming
/// websocket frames can be forwarded to it and new connections can
/// subscribe to its broadcast stream.
#[derive(Clone)]
pub struct GameHandle {
    pub command_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<ServerEvent>,
}

pub struct AppState {
    /// Lobbies waiting for seats to fill, keyed by room id.
    pub rooms: Mutex<HashMap<String, Room>>,
    /// Games that have started, keyed by game id.
    pub games: Mutex<HashMap<String, GameHandle>>,
    pub sessions: Mutex<SessionStore>,
    pub ticket_secret: Vec<u8>,
    /// One `Notify` per room id that is full but whose game hasn't started
    /// yet; every joiner past the one who completes the room awaits this
    /// instead of racing to start the game themselves.
    pub pending_room_starts: Mutex<HashMap<String, Arc<Notify>>>,
}

impl AppState {
    pub fn new(ticket_secret: Vec<u8>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            games: Mutex::new(HashMap::new()),
            sessions: Mutex::new(SessionStore::default()),
            ticket_secret,
            pending_room_starts: Mutex::new(HashMap::new()),
        }
    }
}

/// Drops rooms that never filled and games whose last connection vanished
/// long enough ago that nobody is coming back for them. Run on an interval
/// from `main`, the same way the relay sweeps dead rooms.
pub async fn cleanup_stale(state: &Arc<AppState>) {
    let mut games = state.games.lock().await;
    let before = games.len();
    games.retain(|_, handle| !handle.command_tx.is_closed());
    let removed = before - games.len();
    if removed > 0 {
        tracing::info!(removed, "swept dead game actors");
    }
}
