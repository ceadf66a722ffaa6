//! The turn/call state machine (§4.1-§4.2): pure `(state, action) ->
//! (state', events)` transitions. Nothing here suspends; every external
//! collaborator (scoring, shanten, the wall) is passed in as a port so this
//! module stays synchronous and trivially testable.

use std::collections::HashSet;

use riichi_protocol::messages::{CallOption, ServerEvent};

use crate::abortive::{can_call_kyuushu_kyuuhai, check_four_kans, check_four_winds, is_nagashi_mangan_qualified};
use crate::call_resolution::{self, Resolution};
use crate::error::{GameActionKind, RuleViolation};
use crate::events::RoutedEvent;
use crate::furiten::{discard_pile_furiten, waits_for_seat};
use crate::meld::{Meld, MeldKind};
use crate::player::DiscardEntry;
use crate::ports::{Scorer, ShantenPort};
use crate::round_state::{CallKind, CallPrompt, CallResponse, EligibleCall, RoundPhase, RoundState};
use crate::rotation::{compute_rotation, RoundOutcome};
use crate::settings::{GameSettings, KanDoraTiming};
use crate::state_utils::{add_prompt_response, add_tile_to_player, clear_all_players_ippatsu, clear_pending_prompt};
use crate::tiles::tile_to_34;

/// A decoded, already-seat-attributed player action. The wire/service layer
/// translates a [`riichi_protocol::wire::GameAction`] plus its payload into
/// one of these before calling into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    Discard { tile_id: u8 },
    DeclareRiichi { tile_id: u8 },
    DeclareTsumo,
    DeclareClosedKan { kind_34: u8 },
    DeclareAddedKan { kind_34: u8 },
    CallRon,
    CallPon,
    CallChi { completion: (u8, u8) },
    CallKan,
    CallKyuushu,
    Pass,
}

pub type EngineResult = Result<(RoundState, Vec<RoutedEvent>), RuleViolation>;

/// Draws the next tile for the current seat (from the live wall, or from
/// the dead wall's rinshan slot after a kan) and returns the updated state
/// plus the `Draw` events (a seat-scoped copy carrying the tile, and a
/// broadcast copy that omits it).
pub fn draw_for_current_seat(state: &RoundState, from_rinshan: bool, shanten: &impl ShantenPort) -> EngineResult {
    let seat = state.current_player_seat;
    let tile_id = if from_rinshan {
        state.wall.as_ref().and_then(|w| w.rinshan_tile(state.rinshan_draws))
    } else {
        state.wall.as_ref().and_then(|w| w.live_tile_at(state.drawn_count))
    };
    let Some(tile_id) = tile_id else {
        return Ok(exhaustive_draw(state, shanten));
    };

    let mut next = add_tile_to_player(state, seat, tile_id);
    if from_rinshan {
        next.rinshan_draws += 1;
    } else {
        next.drawn_count += 1;
    }

    let events = vec![
        RoutedEvent::to_seat(seat, ServerEvent::Draw { seat, compact: Some(compact_draw(seat, tile_id)) }),
        RoutedEvent::broadcast(ServerEvent::Draw { seat, compact: None }),
    ];
    Ok((next, events))
}

fn compact_draw(seat: u8, tile_id: u8) -> u32 {
    seat as u32 * 136 + tile_id as u32
}

/// Applies a single player action from `seat` against `state`. `shanten`
/// and `scorer` are the engine's external collaborators for wait
/// computation and hand scoring; neither is consulted unless the action
/// actually needs one.
pub fn apply_action(
    state: &RoundState,
    seat: u8,
    action: EngineAction,
    settings: &GameSettings,
    shanten: &impl ShantenPort,
    scorer: &impl Scorer,
) -> EngineResult {
    if state.phase == RoundPhase::Finished {
        return Err(RuleViolation::rule(None, seat, "round already finished"));
    }

    match action {
        EngineAction::Discard { tile_id } => discard(state, seat, tile_id, settings, shanten),
        EngineAction::DeclareRiichi { tile_id } => declare_riichi(state, seat, tile_id, settings, shanten),
        EngineAction::DeclareTsumo => declare_tsumo(state, seat, shanten, scorer),
        EngineAction::DeclareClosedKan { kind_34 } => declare_closed_kan(state, seat, kind_34, settings),
        EngineAction::DeclareAddedKan { kind_34 } => declare_added_kan(state, seat, kind_34, settings),
        EngineAction::CallKyuushu => declare_kyuushu_kyuuhai(state, seat),
        EngineAction::CallRon => register_response(state, seat, CallResponse::Ron, settings, scorer),
        EngineAction::CallPon => register_response(state, seat, CallResponse::Pon, settings, scorer),
        EngineAction::CallChi { completion } => {
            register_response(state, seat, CallResponse::Chi { completion }, settings, scorer)
        }
        EngineAction::CallKan => register_response(state, seat, CallResponse::Kan, settings, scorer),
        EngineAction::Pass => register_response(state, seat, CallResponse::Pass, settings, scorer),
    }
}

fn require_turn(state: &RoundState, seat: u8, action: GameActionKind) -> Result<(), RuleViolation> {
    if state.pending_call_prompt.is_some() {
        return Err(RuleViolation::rule(action, seat, "a call prompt is already pending"));
    }
    if state.current_player_seat != seat {
        return Err(RuleViolation::rule(action, seat, "not this seat's turn"));
    }
    Ok(())
}

fn discard(state: &RoundState, seat: u8, tile_id: u8, settings: &GameSettings, shanten: &impl ShantenPort) -> EngineResult {
    require_turn(state, seat, GameActionKind::Discard)?;
    let player = state.player(seat);
    if !player.hand.contains(&tile_id) {
        return Err(RuleViolation::rule(GameActionKind::Discard, seat, "tile not in hand"));
    }
    let is_riichi_turn = player.is_riichi;

    let mut next = crate::state_utils::update_player(state, seat, |p| {
        let idx = p.hand.iter().position(|&t| t == tile_id).expect("checked above");
        p.hand.remove(idx);
        p.discards.push(DiscardEntry {
            tile_id,
            is_tsumogiri: false,
            is_riichi_discard: is_riichi_turn && p.discards.is_empty(),
        });
    });

    let eligible = eligible_calls(&next, seat, tile_id, shanten);
    if eligible.is_empty() {
        next = clear_all_players_ippatsu(&next);
        next = crate::state_utils::advance_turn(&next);
        let event = RoutedEvent::broadcast(ServerEvent::Discard { seat, tile_id, is_tsumogiri: false, is_riichi: is_riichi_turn });
        return Ok((next, vec![event]));
    }

    let pending_seats: HashSet<u8> = eligible.iter().map(|e| e.seat).collect();
    next.pending_call_prompt = Some(CallPrompt {
        tile_id,
        discarder_seat: seat,
        eligible: eligible.clone(),
        pending_seats,
        responses: Vec::new(),
        is_chankan: false,
    });

    let mut events = vec![RoutedEvent::broadcast(ServerEvent::Discard {
        seat,
        tile_id,
        is_tsumogiri: false,
        is_riichi: is_riichi_turn,
    })];
    for call in &eligible {
        events.push(RoutedEvent::to_seat(
            call.seat,
            ServerEvent::CallPrompt {
                discarder_seat: seat,
                tile_id,
                caller_seat: call.seat,
                available_calls: vec![call_option(call)],
            },
        ));
    }
    Ok((next, events))
}

fn call_option(call: &EligibleCall) -> CallOption {
    let call_type = match call.kind {
        CallKind::Ron => "ron",
        CallKind::Pon => "pon",
        CallKind::Chi => "chi",
        CallKind::OpenKan => "kan",
    }
    .to_string();
    let options = if call.kind == CallKind::Chi { Some(call.chi_completions.clone()) } else { None };
    CallOption { call_type, options }
}

/// Every seat that could legally respond to `tile_id` discarded by `seat`:
/// same-kind pon/kan for any seat, sequence chi only for the next seat, and
/// ron for any seat not currently furiten whose wait set contains the tile
/// (temporary furiten is recomputed lazily at response time, not here).
fn eligible_calls(state: &RoundState, discarder: u8, tile_id: u8, shanten: &impl ShantenPort) -> Vec<EligibleCall> {
    let kind_34 = tile_to_34(tile_id);
    let mut eligible = Vec::new();
    for seat in 0u8..4 {
        if seat == discarder {
            continue;
        }
        let player = state.player(seat);
        if !player.is_furiten() {
            let waits = waits_for_seat(state, seat, shanten);
            if waits.contains(&kind_34) && !discard_pile_furiten(state, seat, &waits) {
                eligible.push(EligibleCall { seat, kind: CallKind::Ron, chi_completions: vec![] });
            }
        }
        let count = player.concealed_count(kind_34);
        let mut kinds_here = Vec::new();
        if count >= 3 {
            kinds_here.push(CallKind::OpenKan);
        }
        if count >= 2 {
            kinds_here.push(CallKind::Pon);
        }
        if RoundState::next_seat(discarder) == seat && kind_34 < 27 {
            let completions = chi_completions(player.hand.as_slice(), kind_34);
            if !completions.is_empty() {
                eligible.push(EligibleCall { seat, kind: CallKind::Chi, chi_completions: completions });
            }
        }
        for kind in kinds_here {
            eligible.push(EligibleCall { seat, kind, chi_completions: vec![] });
        }
    }
    eligible
}

fn chi_completions(hand: &[u8], kind_34: u8) -> Vec<(u8, u8)> {
    let suit_start = (kind_34 / 9) * 9;
    let offset = kind_34 % 9;
    let mut completions = Vec::new();
    let has_kind = |k: u8| hand.iter().find(|&&t| tile_to_34(t) == k).copied();

    let mut try_pair = |a: u8, b: u8| {
        if let (Some(ta), Some(tb)) = (has_kind(a), has_kind(b)) {
            completions.push((ta, tb));
        }
    };
    if offset >= 2 {
        try_pair(suit_start + offset - 2, suit_start + offset - 1);
    }
    if offset >= 1 && offset + 1 <= 8 {
        try_pair(suit_start + offset - 1, suit_start + offset + 1);
    }
    if offset + 2 <= 8 {
        try_pair(suit_start + offset + 1, suit_start + offset + 2);
    }
    completions
}

fn register_response(
    state: &RoundState,
    seat: u8,
    response: CallResponse,
    settings: &GameSettings,
    scorer: &impl Scorer,
) -> EngineResult {
    let Some(prompt) = state.pending_call_prompt.clone() else {
        return Err(RuleViolation::rule(None, seat, "no call prompt pending"));
    };
    if !prompt.pending_seats.contains(&seat) {
        return Err(RuleViolation::rule(None, seat, "seat not eligible to respond to this prompt"));
    }
    if let Some(eligible) = prompt.eligible_for(seat) {
        validate_response_matches(eligible, &response, seat)?;
    } else if !matches!(response, CallResponse::Pass) {
        return Err(RuleViolation::rule(None, seat, "no eligible call of this kind for this seat"));
    }

    let next = add_prompt_response(state, seat, response);
    let updated_prompt = next.pending_call_prompt.clone().expect("just inserted above");

    if updated_prompt.all_responded() || call_resolution::can_resolve_early(&updated_prompt) {
        return resolve_prompt(&next, &updated_prompt, settings, scorer);
    }
    Ok((next, vec![]))
}

fn validate_response_matches(eligible: &EligibleCall, response: &CallResponse, seat: u8) -> Result<(), RuleViolation> {
    let ok = match (eligible.kind, response) {
        (CallKind::Ron, CallResponse::Ron) => true,
        (CallKind::Pon, CallResponse::Pon) => true,
        (CallKind::OpenKan, CallResponse::Kan) => true,
        (CallKind::Chi, CallResponse::Chi { completion }) => eligible.chi_completions.contains(completion),
        (_, CallResponse::Pass) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(RuleViolation::rule(None, seat, "call response does not match an eligible call"))
    }
}

fn resolve_prompt(state: &RoundState, prompt: &CallPrompt, settings: &GameSettings, scorer: &impl Scorer) -> EngineResult {
    match call_resolution::resolve(prompt, settings) {
        Resolution::AllPassed => {
            let mut next = clear_pending_prompt(state);
            next = clear_all_players_ippatsu(&next);
            next.current_player_seat = RoundState::next_seat(prompt.discarder_seat);
            Ok((next, vec![]))
        }
        Resolution::Ron { winners } => Ok(end_round_ron(state, prompt, &winners, scorer)),
        Resolution::TripleRonAbort { winners } => {
            Ok(end_round_abortive(state, "triple_ron", &winners, RoundOutcome::AbortiveDraw))
        }
        Resolution::Meld { seat, response } => Ok(apply_meld_call(state, prompt, seat, response)),
    }
}

fn apply_meld_call(state: &RoundState, prompt: &CallPrompt, seat: u8, response: CallResponse) -> (RoundState, Vec<RoutedEvent>) {
    let discarder = prompt.discarder_seat;
    let tile_id = prompt.tile_id;
    let kind_34 = tile_to_34(tile_id);

    let (meld_kind, tiles_to_remove) = match &response {
        CallResponse::Pon => (MeldKind::Pon, pick_n_of_kind(state.player(seat), kind_34, 2)),
        CallResponse::Kan => (MeldKind::OpenKan, pick_n_of_kind(state.player(seat), kind_34, 3)),
        CallResponse::Chi { completion } => (MeldKind::Chi, vec![completion.0, completion.1]),
        _ => unreachable!("pick_meld_winner only returns claimed melds"),
    };

    let mut tiles = tiles_to_remove.clone();
    tiles.push(tile_id);
    let meld = Meld::new(meld_kind, tiles.clone(), seat, discarder, tile_id);

    let mut next = crate::state_utils::update_player(state, seat, |p| {
        for tile in &tiles_to_remove {
            if let Some(idx) = p.hand.iter().position(|&t| t == *tile) {
                p.hand.remove(idx);
            }
        }
        p.melds.push(meld.clone());
    });
    // Remove the called tile from the discarder's visible discard pile.
    next = crate::state_utils::update_player(&next, discarder, |p| {
        p.discards.pop();
        p.discard_was_called = true;
    });
    next = clear_pending_prompt(&next);
    next = clear_all_players_ippatsu(&next);
    next.current_player_seat = seat;
    if meld_kind == MeldKind::OpenKan {
        next.kans_called += 1;
        next.kan_contributing_seats.insert(seat);
    }

    let event = RoutedEvent::broadcast(ServerEvent::Meld {
        caller_seat: seat,
        source_seat: discarder,
        meld_type: meld_kind.wire_name().to_string(),
        tiles,
        called_tile: tile_id,
    });
    (next, vec![event])
}

fn pick_n_of_kind(player: &crate::player::MahjongPlayer, kind_34: u8, n: usize) -> Vec<u8> {
    player.hand.iter().filter(|&&t| tile_to_34(t) == kind_34).take(n).copied().collect()
}

fn declare_riichi(state: &RoundState, seat: u8, tile_id: u8, settings: &GameSettings, shanten: &impl ShantenPort) -> EngineResult {
    require_turn(state, seat, GameActionKind::DeclareRiichi)?;
    let player = state.player(seat);
    if player.is_riichi {
        return Err(RuleViolation::rule(GameActionKind::DeclareRiichi, seat, "already in riichi"));
    }
    if player.has_open_melds() {
        return Err(RuleViolation::rule(GameActionKind::DeclareRiichi, seat, "hand is open"));
    }
    if player.score < 1000 {
        return Err(RuleViolation::rule(GameActionKind::DeclareRiichi, seat, "fewer than 1000 points"));
    }
    if state.live_tiles_remaining() < 4 {
        return Err(RuleViolation::rule(GameActionKind::DeclareRiichi, seat, "fewer than four live tiles remain"));
    }
    let mut hand_after = player.hand.clone();
    let Some(idx) = hand_after.iter().position(|&t| t == tile_id) else {
        return Err(RuleViolation::rule(GameActionKind::DeclareRiichi, seat, "tile not in hand"));
    };
    hand_after.remove(idx);
    let counts = crate::tiles::hand_to_34_array(&hand_after);
    if shanten.shanten(&counts) != 0 {
        return Err(RuleViolation::rule(GameActionKind::DeclareRiichi, seat, "discard would not leave tenpai"));
    }

    let is_daburi = player.discards.is_empty() && !state.players.iter().any(|p| !p.discards.is_empty() || p.has_open_melds());
    let (mut next, mut discard_events) = discard(state, seat, tile_id, settings, shanten)?;
    next = crate::state_utils::update_player(&next, seat, |p| {
        p.is_riichi = true;
        p.is_daburi = is_daburi;
        p.is_ippatsu = true;
        if let Some(last) = p.discards.last_mut() {
            last.is_riichi_discard = true;
        }
    });
    next.riichi_sticks += 1;

    for routed in discard_events.iter_mut() {
        if let ServerEvent::Discard { is_riichi, .. } = &mut routed.event {
            *is_riichi = true;
        }
    }
    discard_events.push(RoutedEvent::broadcast(ServerEvent::RiichiDeclared { seat, is_daburi }));
    Ok((next, discard_events))
}

fn declare_tsumo(
    state: &RoundState,
    seat: u8,
    shanten: &impl ShantenPort,
    scorer: &impl Scorer,
) -> EngineResult {
    require_turn(state, seat, GameActionKind::DeclareTsumo)?;
    let player = state.player(seat);
    let counts = crate::tiles::hand_to_34_array(&player.hand);
    if shanten.shanten(&counts) != -1 {
        return Err(RuleViolation::rule(GameActionKind::DeclareTsumo, seat, "hand is not complete"));
    }
    let win_tile = *player.hand.last().expect("complete hand is non-empty");
    let score = scorer.score_hand(&player.hand, &player.melds, win_tile, true);
    let mut scores = [0i32; 4];
    for (s, sc) in state.players.iter().map(|p| p.score).zip(scores.iter_mut()) {
        *sc = s;
    }
    for (i, delta) in score.payment_deltas.iter().enumerate() {
        scores[i] += delta;
    }

    let rotation = compute_rotation(state.dealer_seat, state.honba, RoundOutcome::Win { winners: &[seat] });
    let mut next = state.clone();
    for (i, sc) in scores.iter().enumerate() {
        next.players[i].score = *sc;
    }
    next.phase = RoundPhase::Finished;
    next.dealer_seat = rotation.next_dealer_seat;
    next.honba = rotation.next_honba;
    let event = RoutedEvent::broadcast(ServerEvent::RoundEnd {
        result_type: "tsumo".to_string(),
        winners: vec![seat],
        dealer_seat: next.dealer_seat,
        honba: next.honba,
        scores,
        pao_seat: None,
    });
    Ok((next, vec![event]))
}

fn end_round_ron(state: &RoundState, prompt: &CallPrompt, winners: &[u8], scorer: &impl Scorer) -> (RoundState, Vec<RoutedEvent>) {
    let mut scores = [0i32; 4];
    for (i, p) in state.players.iter().enumerate() {
        scores[i] = p.score;
    }
    for &winner in winners {
        let player = state.player(winner);
        let score = scorer.score_hand(&player.hand, &player.melds, prompt.tile_id, false);
        for (i, delta) in score.payment_deltas.iter().enumerate() {
            scores[i] += delta;
        }
    }
    let rotation = compute_rotation(state.dealer_seat, state.honba, RoundOutcome::Win { winners });
    let mut next = state.clone();
    for (i, sc) in scores.iter().enumerate() {
        next.players[i].score = *sc;
    }
    next.phase = RoundPhase::Finished;
    next.pending_call_prompt = None;
    next.dealer_seat = rotation.next_dealer_seat;
    next.honba = rotation.next_honba;
    let event = RoutedEvent::broadcast(ServerEvent::RoundEnd {
        result_type: "ron".to_string(),
        winners: winners.to_vec(),
        dealer_seat: next.dealer_seat,
        honba: next.honba,
        scores,
        pao_seat: None,
    });
    (next, vec![event])
}

fn end_round_abortive(state: &RoundState, reason: &str, involved: &[u8], outcome: RoundOutcome<'_>) -> (RoundState, Vec<RoutedEvent>) {
    let rotation = compute_rotation(state.dealer_seat, state.honba, outcome);
    let mut next = state.clone();
    next.phase = RoundPhase::Finished;
    next.pending_call_prompt = None;
    next.dealer_seat = rotation.next_dealer_seat;
    next.honba = rotation.next_honba;
    let scores = std::array::from_fn(|i| next.players[i].score);
    let event = RoutedEvent::broadcast(ServerEvent::RoundEnd {
        result_type: reason.to_string(),
        winners: involved.to_vec(),
        dealer_seat: next.dealer_seat,
        honba: next.honba,
        scores,
        pao_seat: None,
    });
    (next, vec![event])
}

/// Exhaustive draw (the live wall is empty with no pending win). Checks
/// nagashi mangan first, since it takes priority over an ordinary no-ten
/// settlement; no-ten payment splitting itself belongs to the scoring
/// port, this just marks the round finished with the right winners set.
fn exhaustive_draw(state: &RoundState, shanten: &impl ShantenPort) -> (RoundState, Vec<RoutedEvent>) {
    let nagashi_seats: Vec<u8> = (0u8..4).filter(|&s| is_nagashi_mangan_qualified(state, s)).collect();
    if !nagashi_seats.is_empty() {
        let dealer_qualified = nagashi_seats.contains(&state.dealer_seat);
        return end_round_abortive(state, "nagashi_mangan", &nagashi_seats, RoundOutcome::NagashiMangan { dealer_qualified });
    }

    let is_tenpai = |seat: u8| shanten.shanten(&crate::tiles::hand_to_34_array(&state.player(seat).hand)) <= 0;
    let dealer_tenpai = is_tenpai(state.dealer_seat);
    let tenpai_seats: Vec<u8> = (0u8..4).filter(|&s| is_tenpai(s)).collect();
    end_round_abortive(state, "exhaustive_draw", &tenpai_seats, RoundOutcome::ExhaustiveDraw { dealer_tenpai })
}

fn declare_kyuushu_kyuuhai(state: &RoundState, seat: u8) -> EngineResult {
    require_turn(state, seat, GameActionKind::CallKyuushu)?;
    if !can_call_kyuushu_kyuuhai(state, seat) {
        return Err(RuleViolation::rule(GameActionKind::CallKyuushu, seat, "does not hold nine distinct terminal/honor kinds"));
    }
    Ok(end_round_abortive(state, "kyuushu_kyuuhai", &[seat], RoundOutcome::AbortiveDraw))
}

fn declare_closed_kan(state: &RoundState, seat: u8, kind_34: u8, settings: &GameSettings) -> EngineResult {
    require_turn(state, seat, GameActionKind::CallKan)?;
    let player = state.player(seat);
    if player.concealed_count(kind_34) != 4 {
        return Err(RuleViolation::rule(GameActionKind::CallKan, seat, "does not hold all four copies"));
    }
    let tiles: Vec<u8> = player.hand.iter().filter(|&&t| tile_to_34(t) == kind_34).copied().collect();
    let meld = Meld::new(MeldKind::ClosedKan, tiles.clone(), seat, seat, tiles[0]);

    let mut next = crate::state_utils::update_player(state, seat, |p| {
        p.hand.retain(|t| tile_to_34(*t) != kind_34);
        p.melds.push(meld.clone());
    });
    next.kans_called += 1;
    next.kan_contributing_seats.insert(seat);

    if check_four_kans(&next, settings) {
        let involved: Vec<u8> = next.kan_contributing_seats.iter().copied().collect();
        return Ok(end_round_abortive(&next, "four_kans", &involved, RoundOutcome::AbortiveDraw));
    }

    let event = RoutedEvent::broadcast(ServerEvent::Meld {
        caller_seat: seat,
        source_seat: seat,
        meld_type: MeldKind::ClosedKan.wire_name().to_string(),
        tiles,
        called_tile: meld.called_tile,
    });
    Ok((next, vec![event]))
}

fn declare_added_kan(state: &RoundState, seat: u8, kind_34: u8, settings: &GameSettings) -> EngineResult {
    require_turn(state, seat, GameActionKind::CallKan)?;
    let player = state.player(seat);
    let has_pon = player.melds.iter().any(|m| m.kind == MeldKind::Pon && m.kind_34() == kind_34);
    if !has_pon {
        return Err(RuleViolation::rule(GameActionKind::CallKan, seat, "no existing pon of this kind to upgrade"));
    }
    let Some(tile_id) = player.hand.iter().find(|&&t| tile_to_34(t) == kind_34).copied() else {
        return Err(RuleViolation::rule(GameActionKind::CallKan, seat, "fourth tile not in hand"));
    };

    let mut next = crate::state_utils::update_player(state, seat, |p| {
        let idx = p.hand.iter().position(|&t| t == tile_id).expect("checked above");
        p.hand.remove(idx);
        if let Some(pon) = p.melds.iter_mut().find(|m| m.kind == MeldKind::Pon && m.kind_34() == kind_34) {
            pon.kind = MeldKind::AddedKan;
            pon.tiles.push(tile_id);
        }
    });
    next.kans_called += 1;
    next.kan_contributing_seats.insert(seat);

    // Chankan: every other seat whose wait covers this kind may ron.
    let pending_seats: HashSet<u8> = (0u8..4)
        .filter(|&s| s != seat)
        .collect();
    next.pending_call_prompt = Some(CallPrompt {
        tile_id,
        discarder_seat: seat,
        eligible: pending_seats.iter().map(|&s| EligibleCall { seat: s, kind: CallKind::Ron, chi_completions: vec![] }).collect(),
        pending_seats,
        responses: Vec::new(),
        is_chankan: true,
    });

    if check_four_kans(&next, settings) {
        let involved: Vec<u8> = next.kan_contributing_seats.iter().copied().collect();
        return Ok(end_round_abortive(&next, "four_kans", &involved, RoundOutcome::AbortiveDraw));
    }

    let event = RoutedEvent::broadcast(ServerEvent::Meld {
        caller_seat: seat,
        source_seat: seat,
        meld_type: MeldKind::AddedKan.wire_name().to_string(),
        tiles: vec![tile_id],
        called_tile: tile_id,
    });
    Ok((next, vec![event]))
}

/// Dead-wall dora reveal, driven by the configured timing. Returns the
/// updated state and a `DoraRevealed` event; the caller decides *when* to
/// invoke this (immediately on kan declaration, or deferred until after the
/// kan's discard, per [`KanDoraTiming`]).
pub fn reveal_kan_dora(state: &RoundState) -> (RoundState, Vec<RoutedEvent>) {
    let mut next = state.clone();
    let nth = next.revealed_dora_indicators as usize;
    next.revealed_dora_indicators += 1;
    let Some(tile_id) = next.wall.as_ref().and_then(|w| w.dora_indicator(nth)) else {
        return (next, vec![]);
    };
    (next, vec![RoutedEvent::broadcast(ServerEvent::DoraRevealed { tile_id, is_ura: false })])
}

/// Re-derives `is_temporary_furiten` for every seat after a discard or a
/// passed ron opportunity. Call this whenever a seat's wait set or discard
/// pile could have changed.
pub fn refresh_furiten(state: &RoundState, shanten: &impl ShantenPort) -> RoundState {
    let mut next = state.clone();
    for seat in 0u8..4 {
        let waits = waits_for_seat(&next, seat, shanten);
        let is_furiten = discard_pile_furiten(&next, seat, &waits);
        next.players[seat as usize].is_temporary_furiten = is_furiten || next.players[seat as usize].is_riichi_furiten;
    }
    next
}

/// Detects the four-winds abortive draw after a discard has been recorded;
/// the caller checks this before offering calls on that discard.
pub fn check_four_winds_abort(state: &RoundState, settings: &GameSettings) -> bool {
    check_four_winds(state, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MahjongPlayer;
    use crate::ports::{PlaceholderScorer, SimpleShanten};
    use crate::round_state::RoundWind;

    fn base_round(hands: [Vec<u8>; 4]) -> RoundState {
        let players: [MahjongPlayer; 4] = std::array::from_fn(|i| MahjongPlayer::new(i as u8, 25_000, hands[i].clone()));
        RoundState {
            wall: None,
            players,
            dealer_seat: 0,
            round_wind: RoundWind::East,
            hand_number: 1,
            honba: 0,
            riichi_sticks: 0,
            current_player_seat: 0,
            pending_call_prompt: None,
            phase: RoundPhase::Playing,
            drawn_count: 0,
            rinshan_draws: 0,
            pending_dora_reveals: 0,
            revealed_dora_indicators: 1,
            kans_called: 0,
            kan_contributing_seats: HashSet::new(),
        }
    }

    #[test]
    fn discard_with_no_eligible_calls_advances_the_turn() {
        let state = base_round([vec![4], vec![], vec![], vec![]]);
        let settings = GameSettings::default();
        let (next, events) = discard(&state, 0, 4, &settings, &SimpleShanten).unwrap();
        assert_eq!(next.current_player_seat, 1);
        assert!(next.pending_call_prompt.is_none());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn discard_opens_a_call_prompt_when_pon_is_eligible() {
        // seat 2 holds a pair of the same kind as the discarded tile (kind 10).
        let state = base_round([vec![40], vec![], vec![41, 41], vec![]]);
        let settings = GameSettings::default();
        let (next, _events) = discard(&state, 0, 40, &settings, &SimpleShanten).unwrap();
        let prompt = next.pending_call_prompt.expect("pon should be offered");
        assert!(prompt.pending_seats.contains(&2));
    }

    #[test]
    fn chi_only_offered_to_the_next_seat() {
        // seat 1 (next) holds 2m,3m completing a 1m chi; seat 2 also holds them but is not eligible.
        let state = base_round([vec![0], vec![5, 9], vec![5, 9], vec![]]);
        let settings = GameSettings::default();
        let (next, _) = discard(&state, 0, 0, &settings, &SimpleShanten).unwrap();
        let prompt = next.pending_call_prompt.unwrap();
        assert!(prompt.pending_seats.contains(&1));
        assert!(!prompt.pending_seats.contains(&2));
    }

    #[test]
    fn all_pass_advances_turn_past_discarder() {
        let state = base_round([vec![40], vec![], vec![41, 41], vec![]]);
        let settings = GameSettings::default();
        let scorer = PlaceholderScorer;
        let (state, _) = discard(&state, 0, 40, &settings, &SimpleShanten).unwrap();
        let (state, _) = register_response(&state, 1, CallResponse::Pass, &settings, &scorer).unwrap();
        let (state, _) = register_response(&state, 2, CallResponse::Pass, &settings, &scorer).unwrap();
        let (state, _) = register_response(&state, 3, CallResponse::Pass, &settings, &scorer).unwrap();
        assert!(state.pending_call_prompt.is_none());
        assert_eq!(state.current_player_seat, 1);
    }

    #[test]
    fn pon_call_moves_turn_to_the_caller_and_forms_a_meld() {
        let state = base_round([vec![40], vec![], vec![41, 41], vec![]]);
        let settings = GameSettings::default();
        let scorer = PlaceholderScorer;
        let (state, _) = discard(&state, 0, 40, &settings, &SimpleShanten).unwrap();
        let (state, events) = register_response(&state, 2, CallResponse::Pon, &settings, &scorer).unwrap();
        assert_eq!(state.current_player_seat, 2);
        assert_eq!(state.players[2].melds.len(), 1);
        assert!(state.players[2].hand.is_empty());
        assert!(matches!(events[0].event, ServerEvent::Meld { .. }));
    }

    #[test]
    fn closed_kan_requires_all_four_copies() {
        let state = base_round([vec![0, 1, 2], vec![], vec![], vec![]]);
        let settings = GameSettings::default();
        assert!(declare_closed_kan(&state, 0, 0, &settings).is_err());
    }

    #[test]
    fn tsumo_rejected_on_an_incomplete_hand() {
        let state = base_round([vec![0, 4, 8], vec![], vec![], vec![]]);
        let result = declare_tsumo(&state, 0, &SimpleShanten, &PlaceholderScorer);
        assert!(result.is_err());
    }

    #[test]
    fn kyuushu_kyuuhai_ends_the_round_as_abortive() {
        let kinds = [0u8, 8, 9, 17, 18, 26, 27, 28, 29];
        let hand: Vec<u8> = kinds.iter().map(|&k| k * 4).collect();
        let state = base_round([hand, vec![], vec![], vec![]]);
        let (next, events) = declare_kyuushu_kyuuhai(&state, 0).unwrap();
        assert_eq!(next.phase, RoundPhase::Finished);
        assert!(matches!(&events[0].event, ServerEvent::RoundEnd { result_type, .. } if result_type == "kyuushu_kyuuhai"));
    }
}
