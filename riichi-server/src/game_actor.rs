//! Per-game single serialized executor (§3 "Ownership and lifecycles"): one
//! task owns a game's [`GameState`] outright and processes commands one at
//! a time, so the rule engine itself never has to worry about concurrent
//! mutation. Four things can make this task yield: a client frame arriving
//! on `commands`, a timer deadline firing (also delivered as a command), a
//! disconnect/reconnect notification, or a slow client's send backing up —
//! and that last one lives entirely in the per-connection fan-out task, not
//! here.
//!
//! The engine itself never links a draw to the action that preceded it
//! (§5 "the engine never suspends"); this actor is the thing that decides,
//! after every transition, whether the next seat needs a live-wall draw, a
//! rinshan draw, or nothing at all before its next decision is due.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use riichi_engine::ai::AiController;
use riichi_engine::game_end;
use riichi_engine::ports::{PlaceholderScorer, SimpleShanten, StandardWallBuilder};
use riichi_engine::round_advance::RoundAdvanceManager;
use riichi_engine::round_builder;
use riichi_engine::round_state::{GamePhase, GameState, RoundPhase};
use riichi_engine::rotation::RotationResult;
use riichi_engine::timer::{TimerConfig, TurnTimer};
use riichi_engine::turn_engine::{self, EngineAction};
use riichi_engine::{EventTarget, RoutedEvent, RuleViolation};
use riichi_protocol::messages::ServerEvent;
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use crate::app_state::AppState;

pub enum GameCommand {
    PlayerAction {
        seat: u8,
        action: EngineAction,
        respond_to: oneshot::Sender<Result<(), RuleViolation>>,
    },
    /// A seat's explicit confirmation that it's ready for the next round
    /// (§4.4 "Round-advance confirmation"); routed separately from
    /// ordinary turn actions since it isn't an engine action at all.
    ConfirmRound {
        seat: u8,
    },
    /// A connection (re-)registers as the delivery channel for a seat's
    /// seat-scoped events, whether this is its very first registration or
    /// a reconnect swapping out the old socket. `preserved_bank` carries
    /// the seat's timer bank forward across the gap, when there was one.
    SeatReconnected {
        seat: u8,
        sender: mpsc::Sender<ServerEvent>,
        preserved_bank: Option<f64>,
    },
    /// The connection for `seat` just dropped. Replies with the seat's
    /// remaining timer bank so the caller can preserve it on the session,
    /// and arms the reconnect grace window if an action is pending there.
    SeatDisconnected {
        seat: u8,
        respond_to: oneshot::Sender<f64>,
    },
    TurnTimeout {
        seat: u8,
    },
    CallPromptTimeout,
    RoundAdvanceTimeout,
    GraceWindowExpired {
        seat: u8,
    },
    Shutdown,
}

pub struct SeatChannels {
    pub senders: HashMap<u8, mpsc::Sender<ServerEvent>>,
}

enum DrawKind {
    None,
    Live,
    Rinshan,
}

/// What the just-applied action implies about the next seat's immediate
/// need for a tile, given whether a call prompt was already open before it
/// and (if a meld was just formed) which kind.
fn decide_draw(action: Option<&EngineAction>, had_prompt_before: bool, meld_kind: Option<&str>) -> DrawKind {
    if had_prompt_before {
        return match meld_kind {
            Some("open_kan") => DrawKind::Rinshan,
            Some(_) => DrawKind::None, // pon/chi: the caller discards directly, no draw
            None => DrawKind::Live,    // every pending seat passed
        };
    }
    match action {
        Some(EngineAction::DeclareClosedKan { .. }) => DrawKind::Rinshan,
        Some(EngineAction::Discard { .. }) | Some(EngineAction::DeclareRiichi { .. }) => DrawKind::Live,
        _ => DrawKind::None,
    }
}

pub struct GameActor {
    game: GameState,
    broadcast_tx: broadcast::Sender<ServerEvent>,
    command_tx: mpsc::Sender<GameCommand>,
    seats: SeatChannels,
    seat_names: [String; 4],
    shanten: SimpleShanten,
    scorer: PlaceholderScorer,
    ai: AiController,
    ai_seats: HashSet<u8>,
    timer_config: TimerConfig,
    timers: HashMap<u8, TurnTimer>,
    grace_timers: HashMap<u8, TurnTimer>,
    call_prompt_timer: Option<TurnTimer>,
    round_advance_timer: Option<TurnTimer>,
    round_advance: RoundAdvanceManager,
    pending_rotation_for_next_round: Option<(RotationResult, bool)>,
    pending_first_seats: HashSet<u8>,
    game_started: bool,
    app_state: Arc<AppState>,
}

impl GameActor {
    pub fn new(
        game: GameState,
        broadcast_tx: broadcast::Sender<ServerEvent>,
        command_tx: mpsc::Sender<GameCommand>,
        seat_names: [String; 4],
        ai_seats: HashSet<u8>,
        app_state: Arc<AppState>,
    ) -> Self {
        let timer_config = TimerConfig::from_settings(&game.settings);
        let pending_first_seats: HashSet<u8> = (0u8..4).filter(|s| !ai_seats.contains(s)).collect();
        let mut actor = Self {
            game,
            broadcast_tx,
            command_tx,
            seats: SeatChannels { senders: HashMap::new() },
            seat_names,
            shanten: SimpleShanten,
            scorer: PlaceholderScorer,
            ai: AiController,
            ai_seats,
            timer_config,
            timers: HashMap::new(),
            grace_timers: HashMap::new(),
            call_prompt_timer: None,
            round_advance_timer: None,
            round_advance: RoundAdvanceManager::default(),
            pending_rotation_for_next_round: None,
            pending_first_seats,
            game_started: false,
            app_state,
        };
        // An all-AI game has nobody to wait on; open straight away.
        if actor.pending_first_seats.is_empty() {
            actor.begin_game();
        }
        actor
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<GameCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                GameCommand::Shutdown => break,
                GameCommand::SeatReconnected { seat, sender, preserved_bank } => {
                    self.seats.senders.insert(seat, sender);
                    if let Some(mut timer) = self.grace_timers.remove(&seat) {
                        timer.cancel();
                    }
                    if let Some(bank) = preserved_bank {
                        self.timers.insert(seat, TurnTimer::with_preserved_bank(self.timer_config, bank));
                    }
                    if !self.game_started {
                        self.pending_first_seats.remove(&seat);
                        if self.pending_first_seats.is_empty() {
                            self.begin_game();
                        }
                    }
                }
                GameCommand::SeatDisconnected { seat, respond_to } => {
                    self.handle_seat_disconnected(seat, respond_to);
                }
                GameCommand::PlayerAction { seat, action, respond_to } => {
                    let had_prompt_before = self.game.round.pending_call_prompt.is_some();
                    match turn_engine::apply_action(&self.game.round, seat, action.clone(), &self.game.settings, &self.shanten, &self.scorer) {
                        Ok((next, events)) => {
                            let _ = respond_to.send(Ok(()));
                            self.advance(next, events, Some(action), had_prompt_before);
                        }
                        Err(violation) => {
                            tracing::warn!(?violation, seat, "rejected player action");
                            self.route_events(vec![RoutedEvent::to_seat(
                                seat,
                                ServerEvent::Error { code: violation.wire_code().to_string(), reason: violation.to_string() },
                            )]);
                            let _ = respond_to.send(Err(violation));
                        }
                    }
                }
                GameCommand::ConfirmRound { seat } => {
                    if let Some(true) = self.round_advance.confirm_seat(&self.game.game_id, seat) {
                        self.start_next_round();
                    }
                }
                GameCommand::TurnTimeout { seat } => {
                    if self.game.round.phase == RoundPhase::Playing
                        && self.game.round.current_player_seat == seat
                        && self.game.round.pending_call_prompt.is_none()
                    {
                        if let Some(timer) = self.timers.get_mut(&seat) {
                            timer.consume_bank();
                        }
                        if let Some(tile_id) = self.ai.turn_discard(&self.game.round, seat) {
                            self.apply_and_advance(seat, EngineAction::Discard { tile_id });
                        }
                    }
                }
                GameCommand::CallPromptTimeout => {
                    self.call_prompt_timer = None;
                    let pending_seats: Vec<u8> = self
                        .game
                        .round
                        .pending_call_prompt
                        .as_ref()
                        .map(|p| p.pending_seats.iter().copied().collect())
                        .unwrap_or_default();
                    for seat in pending_seats {
                        if self.game.round.pending_call_prompt.is_none() {
                            break;
                        }
                        self.apply_and_advance(seat, EngineAction::Pass);
                    }
                }
                GameCommand::RoundAdvanceTimeout => {
                    tracing::warn!(game_id = %self.game.game_id, "round-advance confirmation window expired, advancing anyway");
                    self.start_next_round();
                }
                GameCommand::GraceWindowExpired { seat } => {
                    self.grace_timers.remove(&seat);
                    if self.seats.senders.contains_key(&seat) {
                        continue; // reconnected in the meantime
                    }
                    tracing::info!(game_id = %self.game.game_id, seat, "reconnect grace window expired, substituting AI");
                    self.ai_seats.insert(seat);
                    self.resume_pending_action_for(seat);
                }
            }
        }
    }

    fn handle_seat_disconnected(&mut self, seat: u8, respond_to: oneshot::Sender<f64>) {
        self.seats.senders.remove(&seat);
        let bank = if let Some(timer) = self.timers.get_mut(&seat) {
            timer.stop();
            timer.bank_seconds()
        } else {
            self.timer_config.initial_bank_seconds
        };
        let _ = respond_to.send(bank);

        if self.ai_seats.contains(&seat) {
            return;
        }
        let action_pending = (self.game.round.phase == RoundPhase::Playing
            && self.game.round.current_player_seat == seat
            && self.game.round.pending_call_prompt.is_none())
            || self.game.round.pending_call_prompt.as_ref().is_some_and(|p| p.pending_seats.contains(&seat))
            || self.round_advance.is_seat_required(&self.game.game_id, seat);
        if !action_pending {
            return;
        }
        let command_tx = self.command_tx.clone();
        let mut timer = TurnTimer::new(self.timer_config);
        timer.start_fixed_timer(Duration::from_secs_f64(self.game.settings.reconnect_grace_seconds), move || {
            let _ = command_tx.try_send(GameCommand::GraceWindowExpired { seat });
        });
        self.grace_timers.insert(seat, timer);
    }

    /// Whatever decision `seat` was holding up — a call response, its own
    /// discard, or a round-advance confirmation — resolved the AI's way,
    /// immediately, the moment it's substituted in.
    fn resume_pending_action_for(&mut self, seat: u8) {
        if let Some(prompt) = self.game.round.pending_call_prompt.clone() {
            if prompt.pending_seats.contains(&seat) {
                self.apply_and_advance(seat, EngineAction::Pass);
            }
            return;
        }
        if self.game.round.phase == RoundPhase::Playing && self.game.round.current_player_seat == seat {
            if let Some(tile_id) = self.ai.turn_discard(&self.game.round, seat) {
                self.apply_and_advance(seat, EngineAction::Discard { tile_id });
            }
            return;
        }
        if self.round_advance.is_seat_required(&self.game.game_id, seat) {
            if let Some(true) = self.round_advance.confirm_seat(&self.game.game_id, seat) {
                self.start_next_round();
            }
        }
    }

    fn apply_and_advance(&mut self, seat: u8, action: EngineAction) {
        let had_prompt_before = self.game.round.pending_call_prompt.is_some();
        match turn_engine::apply_action(&self.game.round, seat, action.clone(), &self.game.settings, &self.shanten, &self.scorer) {
            Ok((next, events)) => self.advance(next, events, Some(action), had_prompt_before),
            Err(violation) => tracing::warn!(?violation, seat, "auto-resolved action rejected"),
        }
    }

    /// Applies a just-computed transition: stops whichever timer covered
    /// the decision, routes its events, and either settles the round,
    /// waits on a fresh call prompt, or drives the next draw/discard.
    fn advance(&mut self, next: riichi_engine::round_state::RoundState, events: Vec<RoutedEvent>, action: Option<EngineAction>, had_prompt_before: bool) {
        if had_prompt_before {
            if let Some(timer) = self.call_prompt_timer.as_mut() {
                timer.stop();
            }
        } else if let Some(timer) = self.timers.get_mut(&self.game.round.current_player_seat) {
            timer.stop();
        }

        let prior_dealer_seat = self.game.round.dealer_seat;
        let meld_kind = events.iter().find_map(|r| match &r.event {
            ServerEvent::Meld { meld_type, .. } => Some(meld_type.clone()),
            _ => None,
        });
        let result_type = events.iter().find_map(|r| match &r.event {
            ServerEvent::RoundEnd { result_type, .. } => Some(result_type.clone()),
            _ => None,
        });

        self.route_events(events);
        let finished = next.phase == RoundPhase::Finished;
        self.game.round = next;

        if finished {
            self.handle_round_end(prior_dealer_seat, result_type.as_deref().unwrap_or(""));
            return;
        }

        if self.game.round.pending_call_prompt.is_some() {
            if !had_prompt_before {
                self.arm_call_prompt_timer();
                self.auto_resolve_ai_responses();
            }
            return;
        }

        match decide_draw(action.as_ref(), had_prompt_before, meld_kind.as_deref()) {
            DrawKind::Live => self.perform_draw(false),
            DrawKind::Rinshan => self.perform_draw(true),
            DrawKind::None => self.ready_for_discard(self.game.round.current_player_seat),
        }
    }

    fn perform_draw(&mut self, from_rinshan: bool) {
        let prior_dealer_seat = self.game.round.dealer_seat;
        match turn_engine::draw_for_current_seat(&self.game.round, from_rinshan, &self.shanten) {
            Ok((next, events)) => {
                let result_type = events.iter().find_map(|r| match &r.event {
                    ServerEvent::RoundEnd { result_type, .. } => Some(result_type.clone()),
                    _ => None,
                });
                self.route_events(events);
                let finished = next.phase == RoundPhase::Finished;
                self.game.round = next;
                if finished {
                    self.handle_round_end(prior_dealer_seat, result_type.as_deref().unwrap_or(""));
                } else {
                    self.ready_for_discard(self.game.round.current_player_seat);
                }
            }
            Err(violation) => tracing::error!(?violation, "draw rejected unexpectedly"),
        }
    }

    fn ready_for_discard(&mut self, seat: u8) {
        if self.ai_seats.contains(&seat) {
            if let Some(tile_id) = self.ai.turn_discard(&self.game.round, seat) {
                self.apply_and_advance(seat, EngineAction::Discard { tile_id });
            }
            return;
        }
        self.arm_turn_timer(seat);
    }

    fn arm_turn_timer(&mut self, seat: u8) {
        let timer_config = self.timer_config;
        let timer = self.timers.entry(seat).or_insert_with(|| TurnTimer::new(timer_config));
        let command_tx = self.command_tx.clone();
        timer.start_turn_timer(move || {
            let _ = command_tx.try_send(GameCommand::TurnTimeout { seat });
        });
    }

    fn arm_call_prompt_timer(&mut self) {
        let mut timer = TurnTimer::new(self.timer_config);
        let command_tx = self.command_tx.clone();
        timer.start_meld_timer(move || {
            let _ = command_tx.try_send(GameCommand::CallPromptTimeout);
        });
        self.call_prompt_timer = Some(timer);
    }

    /// Auto-passes every AI seat still pending on a just-opened call
    /// prompt, one at a time, re-checking after each response since an
    /// early resolution can clear the prompt before every AI seat answers.
    fn auto_resolve_ai_responses(&mut self) {
        loop {
            let Some(prompt) = self.game.round.pending_call_prompt.clone() else { return };
            let Some(&seat) = prompt.pending_seats.iter().find(|s| self.ai_seats.contains(s)) else { return };
            self.apply_and_advance(seat, EngineAction::Pass);
        }
    }

    fn handle_round_end(&mut self, prior_dealer_seat: u8, result_type: &str) {
        if let Some(mut timer) = self.call_prompt_timer.take() {
            timer.cancel();
        }
        let dealer_rotated = self.game.round.dealer_seat != prior_dealer_seat;
        if let Some(reason) = game_end::check_game_end(&self.game, dealer_rotated) {
            self.end_game(reason);
            return;
        }
        if dealer_rotated {
            self.game.unique_dealers_seen += 1;
        }
        let rotation = RotationResult {
            next_dealer_seat: self.game.round.dealer_seat,
            dealer_rotates: dealer_rotated,
            next_honba: self.game.round.honba,
        };
        let pot_claimed = matches!(result_type, "tsumo" | "ron");
        self.pending_rotation_for_next_round = Some((rotation, pot_claimed));
        self.start_round_advance_wait();
    }

    fn end_game(&mut self, reason: game_end::GameEndReason) {
        let final_scores = std::array::from_fn(|i| self.game.round.players[i].score);
        self.route_events(vec![RoutedEvent::broadcast(ServerEvent::GameEnd {
            final_scores,
            end_reason: reason.wire_reason().to_string(),
        })]);
        self.game.phase = GamePhase::Finished;
        self.round_advance.cleanup_game(&self.game.game_id);
        let game_id = self.game.game_id.clone();
        let app_state = self.app_state.clone();
        tokio::spawn(async move {
            app_state.games.lock().await.remove(&game_id);
            app_state.sessions.lock().await.cleanup_game(&game_id);
        });
    }

    fn start_round_advance_wait(&mut self) {
        let immediate = self.round_advance.setup_pending(&self.game.game_id, &self.ai_seats);
        if immediate {
            self.start_next_round();
            return;
        }
        let command_tx = self.command_tx.clone();
        let mut timer = TurnTimer::new(self.timer_config);
        timer.start_round_advance_timer(move || {
            let _ = command_tx.try_send(GameCommand::RoundAdvanceTimeout);
        });
        self.round_advance_timer = Some(timer);
    }

    fn start_next_round(&mut self) {
        if let Some(mut timer) = self.round_advance_timer.take() {
            timer.cancel();
        }
        self.round_advance.cleanup_game(&self.game.game_id);
        let Some((rotation, pot_claimed)) = self.pending_rotation_for_next_round.take() else {
            tracing::error!(game_id = %self.game.game_id, "start_next_round called with no pending rotation recorded");
            return;
        };
        let spec = round_builder::next_round_spec(&self.game, &rotation, pot_claimed);
        let seed = Uuid::new_v4();
        self.game.round = round_builder::build_round_state(spec, &StandardWallBuilder, seed.as_bytes());
        for timer in self.timers.values_mut() {
            timer.add_round_bonus();
        }
        self.emit_round_started();
        self.perform_draw(false);
    }

    /// The opening sequence (§4.4 "Start game"): broadcast `GAME_STARTED`,
    /// then a per-seat `ROUND_STARTED` carrying only that seat's hand, then
    /// the dealer's first draw. Deferred until every human seat has
    /// registered its delivery channel at least once, so nobody misses it.
    fn begin_game(&mut self) {
        self.game_started = true;
        self.route_events(vec![RoutedEvent::broadcast(ServerEvent::GameStarted {
            game_id: self.game.game_id.clone(),
            dealer_seat: self.game.round.dealer_seat,
            seat_names: self.seat_names.clone(),
        })]);
        self.emit_round_started();
        self.perform_draw(false);
    }

    fn emit_round_started(&mut self) {
        for seat in 0u8..4 {
            let player = self.game.round.player(seat);
            self.route_events(vec![RoutedEvent::to_seat(
                seat,
                ServerEvent::RoundStarted {
                    seat,
                    hand: player.hand.clone(),
                    round_wind: self.game.round.round_wind.wire_name().to_string(),
                    hand_number: self.game.round.hand_number,
                    honba: self.game.round.honba,
                },
            )]);
        }
    }

    fn route_events(&self, events: Vec<RoutedEvent>) {
        for routed in events {
            match routed.target {
                EventTarget::Broadcast => {
                    let _ = self.broadcast_tx.send(routed.event);
                }
                EventTarget::Seat(seat) => {
                    if let Some(sender) = self.seats.senders.get(&seat) {
                        let _ = sender.try_send(routed.event);
                    }
                }
            }
        }
    }
}
