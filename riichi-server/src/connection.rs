//! Per-connection lifecycle. Admission happens once, synchronously, before
//! anything else is spawned; after that we hand off to two paired tasks —
//! one pumping frames in, one pumping events out — raced with
//! `tokio::select!` so whichever side notices the peer is gone first tears
//! the other down too.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use riichi_engine::room::{Room, RoomMember};
use riichi_engine::session::SessionData;
use riichi_engine::turn_engine::EngineAction;
use riichi_protocol::messages::{ClientFrame, ServerEvent};
use riichi_protocol::wire::{GameAction, WireClientMessageType};
use riichi_protocol::{decode_client_frame, encode_frame};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, Notify};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::verify_ticket;
use crate::game_actor::GameCommand;
use crate::lifecycle;
use crate::rate_limit::{DecodeStrikes, TokenBucket};

const SEAT_CHANNEL_CAPACITY: usize = 32;

/// A just-resolved admission. `preserved_bank` is `Some` whenever the
/// session had been marked disconnected before this connection arrived —
/// whether the client presented a reconnect token or simply re-presented
/// its original ticket after a drop.
struct Admission {
    session: SessionData,
    preserved_bank: Option<f64>,
}

pub async fn handle_connection(socket: WebSocket, state: Arc<AppState>, game_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let Some(admission) = admit(&mut receiver, &state).await else {
        let _ = sender.send(Message::Close(None)).await;
        return;
    };
    let mut session = admission.session;
    if session.game_id != game_id {
        tracing::warn!(path_game_id = %game_id, session_game_id = %session.game_id, "session does not belong to this game");
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    let game = {
        let games = state.games.lock().await;
        games.get(&session.game_id).cloned()
    };
    let Some(game) = game else {
        tracing::warn!(game_id = %session.game_id, "admitted session points at a game that no longer exists");
        return;
    };

    if admission.preserved_bank.is_some() {
        if let Some(new_token) = state.sessions.lock().await.prepare_token_rotation(&session.session_token) {
            let event = ServerEvent::Reconnected { seat: session.seat, new_token: new_token.clone() };
            let delivered = match encode_frame(&event) {
                Ok(bytes) => sender.send(Message::Binary(bytes.into())).await.is_ok(),
                Err(_) => false,
            };
            if delivered && state.sessions.lock().await.commit_token_rotation(&session.session_token, &new_token) {
                session.session_token = new_token;
            }
        }
    }

    // Subscribe before announcing this seat so the game's opening broadcast
    // (or any other broadcast event in flight) can never be missed between
    // the two steps.
    let broadcast_rx = game.broadcast_tx.subscribe();

    let (seat_tx, seat_rx) = mpsc::channel(SEAT_CHANNEL_CAPACITY);
    if game
        .command_tx
        .send(GameCommand::SeatReconnected {
            seat: session.seat,
            sender: seat_tx,
            preserved_bank: admission.preserved_bank,
        })
        .await
        .is_err()
    {
        tracing::warn!(seat = session.seat, "game actor gone before seat could register");
        return;
    }

    let sender = Arc::new(Mutex::new(sender));

    let mut send_task = tokio::spawn(send_loop(sender.clone(), seat_rx, broadcast_rx));
    let mut receive_task = tokio::spawn(receive_loop(receiver, game.command_tx.clone(), session.seat));

    // If either task runs to completion, the peer is gone one way or the
    // other; abort its sibling rather than leaving it to leak.
    let outcome = tokio::select! {
        res_a = &mut send_task => { receive_task.abort(); res_a },
        res_b = &mut receive_task => { send_task.abort(); res_b },
    };

    if let Err(err) = outcome {
        if !err.is_cancelled() {
            tracing::error!(?err, seat = session.seat, "connection task panicked");
        }
    }

    let (respond_to, bank) = oneshot::channel();
    let preserved_bank = if game.command_tx.send(GameCommand::SeatDisconnected { seat: session.seat, respond_to }).await.is_ok() {
        bank.await.unwrap_or(0.0)
    } else {
        0.0
    };
    state.sessions.lock().await.mark_disconnected(&session.session_token, preserved_bank);
}

/// Reads the single join/reconnect frame a connection must open with and
/// resolves it to the session it belongs to. A `token` reconnects an
/// existing session directly; a bare `ticket` either looks up a session a
/// started game already created for that user, or — if the room hasn't
/// started a game yet — joins the room's lobby and waits for it to fill.
async fn admit(receiver: &mut SplitStream<WebSocket>, state: &Arc<AppState>) -> Option<Admission> {
    let raw = receiver.next().await?.ok()?;
    let Message::Binary(bytes) = raw else {
        return None;
    };
    let frame = decode_client_frame(&bytes).ok()?;
    if !matches!(frame.message_type(), Some(WireClientMessageType::JoinGame) | Some(WireClientMessageType::Reconnect)) {
        tracing::warn!("first frame from a new connection was not a join/reconnect request");
        return None;
    }

    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();

    if let Some(token) = frame.token.as_deref() {
        let mut sessions = state.sessions.lock().await;
        let existing = sessions.get_session(token)?.clone();
        let preserved_bank = sessions.mark_reconnected(token);
        return Some(Admission { session: existing, preserved_bank });
    }

    let ticket = frame.ticket.as_deref()?;
    let payload = verify_ticket(ticket, &state.ticket_secret, now).ok()?;

    if let Some(existing) = state.sessions.lock().await.find_by_user_and_game(&payload.user_id, &payload.room_id).cloned() {
        let preserved_bank = if existing.connected {
            None
        } else {
            state.sessions.lock().await.mark_reconnected(&existing.session_token)
        };
        return Some(Admission { session: existing, preserved_bank });
    }

    wait_for_room(state, &payload.room_id, &payload.user_id, &payload.username).await;

    let existing = state.sessions.lock().await.find_by_user_and_game(&payload.user_id, &payload.room_id)?.clone();
    Some(Admission { session: existing, preserved_bank: None })
}

/// Joins the room's lobby (a no-op if this user is already a member), and
/// — if that fills every seat — drives the room→game handoff. Every other
/// connection still waiting for the room to fill blocks on the room's
/// `Notify` instead.
async fn wait_for_room(state: &Arc<AppState>, room_id: &str, user_id: &str, username: &str) {
    let notify = {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.entry(room_id.to_string()).or_insert_with(|| Room::new(room_id.to_string(), 0));
        if !room.members.values().any(|m| m.user_id == user_id) {
            room.join(RoomMember {
                connection_id: Uuid::new_v4().to_string(),
                name: username.to_string(),
                session_token: String::new(),
                user_id: user_id.to_string(),
                ready: true,
            });
        }
        if room.all_ready() {
            let room = rooms.remove(room_id).expect("checked all_ready on it above");
            drop(rooms);
            if let Err(err) = lifecycle::start_game(state, room).await {
                tracing::error!(?err, room_id, "matchmaker rejected a full, ready room");
            }
            let mut waiters = state.pending_room_starts.lock().await;
            if let Some(notify) = waiters.remove(room_id) {
                notify.notify_waiters();
            }
            return;
        }
        let mut waiters = state.pending_room_starts.lock().await;
        waiters.entry(room_id.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    };
    notify.notified().await;
}

async fn send_loop(
    sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    mut seat_rx: mpsc::Receiver<ServerEvent>,
    mut broadcast_rx: broadcast::Receiver<ServerEvent>,
) -> &'static str {
    let mut enclosed = sender.lock().await;
    loop {
        let event = tokio::select! {
            seat_event = seat_rx.recv() => match seat_event {
                Some(event) => event,
                None => return "seat channel closed",
            },
            broadcast_event = broadcast_rx.recv() => match broadcast_event {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => return "broadcast channel closed",
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "client fell behind the game's broadcast stream");
                    continue;
                }
            },
        };

        let Ok(bytes) = encode_frame(&event) else {
            tracing::error!("failed to encode an outgoing event, dropping it");
            continue;
        };
        if enclosed.send(Message::Binary(bytes.into())).await.is_err() {
            return "send failed";
        }
    }
}

async fn receive_loop(mut receiver: SplitStream<WebSocket>, command_tx: mpsc::Sender<GameCommand>, seat: u8) -> &'static str {
    let mut bucket = TokenBucket::default();
    let mut strikes = DecodeStrikes::default();

    while let Some(message) = receiver.next().await {
        let Ok(Message::Binary(bytes)) = message else {
            return "connection lost";
        };

        if !bucket.try_consume() {
            tracing::warn!(seat, "rate limit exceeded, dropping frame");
            continue;
        }

        let frame = match decode_client_frame(&bytes) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(?err, seat, "failed to decode client frame");
                if strikes.record_failure() {
                    return "too many malformed frames";
                }
                continue;
            }
        };
        strikes.record_success();

        if frame.game_action() == Some(GameAction::ConfirmRound) {
            if command_tx.send(GameCommand::ConfirmRound { seat }).await.is_err() {
                return "game actor gone";
            }
            continue;
        }

        let Some(action) = to_engine_action(&frame) else {
            continue;
        };

        let (respond_to, response) = oneshot::channel();
        if command_tx
            .send(GameCommand::PlayerAction { seat, action, respond_to })
            .await
            .is_err()
        {
            return "game actor gone";
        }
        let _ = response.await;
    }
    "connection lost"
}

/// Shapes a decoded wire frame into the engine's action type. Closed and
/// added kans share the wire's single `CallKan` action with a call-time
/// `kan_type` disambiguator, since both are self-declared on your own turn
/// rather than a response to someone else's discard. Round-advance
/// confirmation is handled directly in [`receive_loop`] since it isn't an
/// engine action at all.
fn to_engine_action(frame: &ClientFrame) -> Option<EngineAction> {
    match frame.game_action()? {
        GameAction::Discard => Some(EngineAction::Discard { tile_id: frame.tile_id? }),
        GameAction::DeclareRiichi => Some(EngineAction::DeclareRiichi { tile_id: frame.tile_id? }),
        GameAction::DeclareTsumo => Some(EngineAction::DeclareTsumo),
        GameAction::CallRon => Some(EngineAction::CallRon),
        GameAction::CallPon => Some(EngineAction::CallPon),
        GameAction::CallChi => Some(EngineAction::CallChi {
            completion: frame.sequence_tiles?,
        }),
        GameAction::CallKan => match frame.kan_type {
            Some(0) => Some(EngineAction::DeclareClosedKan { kind_34: frame.tile_id? }),
            Some(1) => Some(EngineAction::DeclareAddedKan { kind_34: frame.tile_id? }),
            _ => Some(EngineAction::CallKan),
        },
        GameAction::CallKyuushu => Some(EngineAction::CallKyuushu),
        GameAction::Pass => Some(EngineAction::Pass),
        GameAction::ConfirmRound => None,
    }
}
