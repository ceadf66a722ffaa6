//! Room-to-game handoff (§4.4 "Start game"). A room fills with ticket-bearing
//! joiners one at a time; the connection that completes it drives the
//! matchmaker, deals the opening hand, and spawns the game's executor. Every
//! other waiting connection is released via a per-room [`tokio::sync::Notify`]
//! once the handoff is done.

use std::collections::HashSet;
use std::sync::Arc;

use riichi_engine::matchmaker::{self, MatchmakerError, SeatOccupant};
use riichi_engine::ports::StandardWallBuilder;
use riichi_engine::room::Room;
use riichi_engine::round_builder::{build_round_state, NewRoundSpec};
use riichi_engine::round_state::{GamePhase, GameState, RoundWind};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::app_state::{AppState, GameHandle};
use crate::game_actor::GameActor;

const BROADCAST_CAPACITY: usize = 256;
const COMMAND_CAPACITY: usize = 64;

/// Drains `room`'s members through the matchmaker, deals the opening hand,
/// and spawns the game's executor task, registering its handle in
/// `state.games` under the room's id. The executor itself waits for every
/// human seat to register a delivery channel before emitting the opening
/// `GAME_STARTED`/`ROUND_STARTED` sequence, so callers don't need to race it.
pub async fn start_game(state: &Arc<AppState>, room: Room) -> Result<(), MatchmakerError> {
    let game_id = room.room_id.clone();
    let mut names: Vec<String> = room.members.values().map(|m| m.name.clone()).collect();
    names.sort(); // deterministic input order, independent of the members map's iteration order

    let seed = Uuid::new_v4();
    let seat_config = matchmaker::fill_seats(&names, seed.as_bytes())?;

    let members_by_name: std::collections::HashMap<&str, &riichi_engine::room::RoomMember> =
        room.members.values().map(|m| (m.name.as_str(), m)).collect();

    let mut ai_seats: HashSet<u8> = HashSet::new();
    let mut seat_names: [String; 4] = Default::default();
    {
        let mut sessions = state.sessions.lock().await;
        for config in &seat_config {
            match &config.occupant {
                SeatOccupant::Human { name } => {
                    seat_names[config.seat as usize] = name.clone();
                    let member = members_by_name.get(name.as_str()).expect("matchmaker only returns names it was given");
                    sessions.create_session(member.user_id.clone(), game_id.clone(), config.seat);
                }
                SeatOccupant::Ai { name } => {
                    seat_names[config.seat as usize] = name.clone();
                    ai_seats.insert(config.seat);
                }
            }
        }
    }

    let round_spec = NewRoundSpec {
        dealer_seat: 0,
        round_wind: RoundWind::East,
        hand_number: 1,
        honba: 0,
        riichi_sticks: 0,
        scores: [room.settings.initial_score; 4],
    };
    let round = build_round_state(round_spec, &StandardWallBuilder, seed.as_bytes());
    let game = GameState {
        game_id: game_id.clone(),
        round,
        settings: room.settings,
        total_riichi_sticks: 0,
        honba_sticks: 0,
        unique_dealers_seen: 0,
        phase: GamePhase::Playing,
    };

    let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let handle = GameHandle { command_tx: command_tx.clone(), broadcast_tx: broadcast_tx.clone() };
    state.games.lock().await.insert(game_id.clone(), handle);

    let actor = GameActor::new(game, broadcast_tx, command_tx, seat_names, ai_seats, state.clone());
    tokio::spawn(actor.run(command_rx));
    Ok(())
}
