//! Decision core of one board.
//!
//! [`BoardController`] owns the engine conversation and the search session
//! for a board. It performs no I/O: the actor feeds it UI notifications,
//! engine lines, connection changes and fired timers, then drains
//! [`Output`]s to carry out.

use std::sync::Arc;
use std::time::Duration;

use chess::{format_piece, format_square, format_uci_move, parse_uci_move, CandidateMove};
use cozy_chess::{Board, Move};
use engine::{
    parse_uci_message, BestMoveOutcome, EngineCommand, EngineInfo, EngineProtocol, ProtocolState,
    RetryDecision, UciMessage,
};
use rand::Rng;
use smallvec::SmallVec;

use super::decision::{select_move, SelectionPolicy};
use super::events::{arrow_style, Arrow, Effect, Highlight};
use super::quality;
use super::session::SearchSession;
use super::snapshot::BoardSnapshot;
use super::timing::compute_delay;
use crate::book::OpeningBook;
use crate::settings::Settings;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const HIGHLIGHT_OPACITY: f32 = 0.6;

/// Work parked until the engine reaches a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// The previous search has stopped; wait for readiness.
    Restart,
    /// The engine is ready; submit the latest position.
    Submit,
}

/// A move waiting for its execution delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMove {
    pub mv: Move,
    pub premove: bool,
    /// Search that chose the move.
    pub generation: u64,
    pub game: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Send(EngineCommand),
    Emit(Effect),
    Schedule { delay: Duration, action: ScheduledMove },
}

type TopMoves = SmallVec<[CandidateMove; 4]>;

pub struct BoardController<R> {
    settings: Settings,
    protocol: EngineProtocol<Pending>,
    session: SearchSession,
    book: Arc<dyn OpeningBook>,
    rng: R,
    outputs: Vec<Output>,
    connected: bool,
    fen: Option<String>,
    player_turn: bool,
    legal_moves: Vec<Move>,
    last_move: Option<Move>,
    search_pending: bool,
    game: u64,
    premoves_used: u32,
    premove_limit_signaled: bool,
}

impl<R: Rng> BoardController<R> {
    pub fn new(settings: Settings, book: Arc<dyn OpeningBook>, rng: R) -> Self {
        let protocol = EngineProtocol::new(settings.stop_ack.into(), settings.engine_options());
        Self {
            settings,
            protocol,
            session: SearchSession::new(),
            book,
            rng,
            outputs: Vec::new(),
            connected: false,
            fen: None,
            player_turn: false,
            legal_moves: Vec::new(),
            last_move: None,
            search_pending: false,
            game: 0,
            premoves_used: 0,
            premove_limit_signaled: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn protocol_state(&self) -> ProtocolState {
        self.protocol.state()
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// Everything to carry out, in order.
    pub fn take_outputs(&mut self) -> Vec<Output> {
        self.flush();
        std::mem::take(&mut self.outputs)
    }

    pub fn snapshot(&self, id: &str, engine: &str) -> BoardSnapshot {
        BoardSnapshot {
            id: id.to_string(),
            engine: engine.to_string(),
            engine_state: format!("{:?}", self.protocol.state()),
            connected: self.connected,
            evaluating: self.session.is_evaluating,
            generation: self.session.generation,
            fen: self.fen.clone(),
            player_turn: self.player_turn,
            candidates: self
                .session
                .current
                .ranked()
                .iter()
                .map(CandidateMove::token)
                .collect(),
            premoves_used: self.premoves_used,
            premove_limit_reached: self.premove_limit_signaled,
        }
    }

    // -- connection --

    pub fn on_open(&mut self) {
        self.connected = true;
        self.protocol.on_open();
        self.emit(Effect::ConnectionStatus { connected: true });
    }

    /// The connection ended. Returns true when it should be re-established.
    pub fn on_closed(&mut self) -> bool {
        let was_connected = std::mem::replace(&mut self.connected, false);
        let interrupted = self.session.abandon();
        let reconnect = self.protocol.on_closed();
        if interrupted {
            tracing::info!("Search interrupted by connection loss, will resubmit");
            self.queue_search();
        }
        if was_connected {
            self.emit(Effect::ConnectionStatus { connected: false });
        }
        reconnect
    }

    pub fn on_retry_scheduled(&mut self, decision: RetryDecision, attempt: u32) {
        match decision {
            RetryDecision::RetryAfter(delay) => self.emit(Effect::Reconnecting {
                attempt,
                delay_ms: delay.as_millis() as u64,
            }),
            RetryDecision::GiveUp => {
                tracing::error!("Engine unreachable, waiting for a reconnect request");
                self.emit(Effect::EngineUnreachable);
            }
        }
    }

    /// Start an intentional shutdown of the engine conversation.
    pub fn close(&mut self) {
        self.protocol.close();
    }

    // -- engine lines --

    pub fn on_line(&mut self, line: &str) {
        match parse_uci_message(line) {
            Ok(UciMessage::UciOk) => self.protocol.on_handshake(),
            Ok(UciMessage::ReadyOk) => {
                for pending in self.protocol.on_ready_ack() {
                    self.run(pending);
                }
            }
            Ok(UciMessage::Info(info)) => self.on_info(&info),
            Ok(UciMessage::BestMove { mv, .. }) => match self.protocol.on_best_move() {
                BestMoveOutcome::Accepted => self.on_search_finished(mv),
                BestMoveOutcome::StopCompleted(pending) => {
                    self.session.stop_completed();
                    for pending in pending {
                        self.run(pending);
                    }
                }
                BestMoveOutcome::Unexpected => {
                    tracing::warn!("Ignoring bestmove with no search in flight: {}", line);
                }
            },
            Ok(UciMessage::Id { name, value }) => tracing::debug!("Engine {}: {}", name, value),
            Err(e) => tracing::trace!("Ignoring engine line: {}", e),
        }
    }

    fn on_info(&mut self, info: &EngineInfo) {
        if !self.session.accepts_updates() {
            tracing::trace!("Analysis suppressed: {:?}", info);
            return;
        }
        let Some(candidate) = info.to_candidate() else {
            return;
        };
        if self.session.current.merge(candidate).changed() {
            let top_moves = self.top_moves(self.session.current.ranked());
            self.emit_visuals(&top_moves, false);
        }
    }

    /// Terminal line of the running search.
    fn on_search_finished(&mut self, best: Option<Move>) {
        let mut ranked = self.session.current.ranked().to_vec();
        let Some(best) = best else {
            tracing::info!("Engine reports no legal move");
            self.session.complete(None, ranked);
            if self.settings.depth_bar {
                self.emit(Effect::DepthProgress { percent: 100 });
            }
            return;
        };

        match ranked.iter().position(|c| c.mv == best) {
            Some(index) => {
                let entry = ranked.remove(index);
                ranked.insert(0, entry);
            }
            None => {
                tracing::info!(
                    "Best move {} never appeared in analysis, synthesizing it",
                    format_uci_move(best)
                );
                ranked.insert(0, CandidateMove::synthetic(best, self.settings.depth));
            }
        }

        let top_moves = self.top_moves(&ranked);
        let Some(top) = top_moves.first().cloned() else {
            return;
        };
        tracing::debug!("Search finished, top move {}", top.token());

        self.emit_visuals(&top_moves, true);
        if self.settings.move_analysis {
            self.classify_last_move(&top);
        }
        self.decide(&top_moves);
        self.session.complete(Some(top), ranked);
    }

    fn top_moves(&self, ranked: &[CandidateMove]) -> TopMoves {
        ranked
            .iter()
            .take(self.settings.multipv as usize)
            .cloned()
            .collect()
    }

    // -- UI notifications --

    pub fn on_position_changed(&mut self, fen: String) {
        let fen = fen.trim().to_string();
        if self.fen.as_deref() == Some(fen.as_str()) {
            tracing::trace!("Position unchanged");
            return;
        }
        if is_start_position(&fen) && !self.fen.as_deref().is_some_and(is_start_position) {
            self.new_game();
        }
        self.fen = Some(fen);
        self.queue_search();
    }

    pub fn on_turn_changed(&mut self, player_turn: bool) {
        self.player_turn = player_turn;
    }

    pub fn on_legal_moves(&mut self, tokens: &[String]) {
        self.legal_moves = tokens
            .iter()
            .filter_map(|token| match parse_uci_move(token) {
                Ok(mv) => Some(mv),
                Err(e) => {
                    tracing::warn!("Skipping legal move {:?}: {}", token, e);
                    None
                }
            })
            .collect();
    }

    pub fn on_last_move(&mut self, token: &str) {
        match parse_uci_move(token) {
            Ok(mv) => self.last_move = Some(mv),
            Err(e) => tracing::warn!("Ignoring last move {:?}: {}", token, e),
        }
    }

    pub fn new_game(&mut self) {
        tracing::info!("New game, resetting pre-move budget");
        self.game += 1;
        self.premoves_used = 0;
        self.premove_limit_signaled = false;
        self.last_move = None;
        self.session.reset_game();
    }

    /// Use new settings from here on. Engine options go out right away when
    /// the engine is ready.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.protocol.set_options(settings.engine_options());
        self.protocol.set_stop_ack(settings.stop_ack.into());
        self.settings = settings;
    }

    // -- timers --

    pub fn on_timer(&mut self, action: ScheduledMove) {
        if action.game != self.game {
            tracing::debug!("Dropping move {} from a previous game", format_uci_move(action.mv));
            return;
        }
        if !action.premove
            && self.settings.drop_stale_moves
            && action.generation != self.session.generation
        {
            tracing::debug!(
                "Dropping stale move {} from search {} (now {})",
                format_uci_move(action.mv),
                action.generation,
                self.session.generation
            );
            return;
        }
        self.emit_move(action.mv, action.premove);
    }

    // -- internals --

    /// Stop whatever runs, then submit the latest position once ready.
    fn queue_search(&mut self) {
        if self.search_pending {
            return;
        }
        self.search_pending = true;
        self.session.request_stop();
        for pending in self.protocol.request_stop(Pending::Restart) {
            self.run(pending);
        }
    }

    fn run(&mut self, pending: Pending) {
        match pending {
            Pending::Restart => self.protocol.when_ready(Pending::Submit),
            Pending::Submit => self.submit_search(),
        }
    }

    fn submit_search(&mut self) {
        self.search_pending = false;
        let Some(fen) = self.fen.clone() else {
            return;
        };
        let position = EngineCommand::SetPosition {
            fen: Some(fen.clone()),
            moves: Vec::new(),
        };
        let generation = self.session.begin(fen);
        match self
            .protocol
            .request_evaluation(position, self.settings.go_params())
        {
            Ok(()) => {
                tracing::debug!("Search {} submitted", generation);
                if self.settings.depth_bar {
                    self.emit(Effect::DepthProgress { percent: 0 });
                }
            }
            Err(e) => {
                tracing::error!("Search {} not submitted: {}", generation, e);
                self.session.abandon();
            }
        }
    }

    fn emit_visuals(&mut self, top_moves: &[CandidateMove], terminal: bool) {
        let Some(top) = top_moves.first() else {
            return;
        };

        if self.settings.show_hints {
            let arrows = top_moves
                .iter()
                .enumerate()
                .map(|(rank, c)| {
                    let (color, opacity) = arrow_style(rank);
                    Arrow {
                        from: format_square(c.from()),
                        to: format_square(c.to()),
                        color,
                        opacity,
                    }
                })
                .collect();
            let color = top.quality_class().color();
            let squares = [top.from(), top.to()]
                .into_iter()
                .map(|sq| Highlight {
                    square: format_square(sq),
                    color,
                    opacity: HIGHLIGHT_OPACITY,
                })
                .collect();
            self.emit(Effect::Arrows { arrows });
            self.emit(Effect::Highlights { squares });
        }

        if self.settings.evaluation_bar {
            let effect = match top.mate_distance() {
                Some(n) => Effect::Evaluation {
                    value: n,
                    mate: true,
                },
                None => Effect::Evaluation {
                    value: top.centipawns().unwrap_or_default(),
                    mate: false,
                },
            };
            self.emit(effect);
        }

        if self.settings.depth_bar {
            let percent = if terminal {
                100
            } else {
                let depth = self.session.current.max_depth() as u64 * 100;
                (depth / u64::from(self.settings.depth.max(1))).min(100) as u8
            };
            self.emit(Effect::DepthProgress { percent });
        }
    }

    fn classify_last_move(&mut self, top: &CandidateMove) {
        let Some(played) = self.last_move.take() else {
            return;
        };
        let Some(previous) = self.session.previous.as_ref() else {
            return;
        };
        let Some(fen) = self.session.fen.as_deref() else {
            return;
        };
        if !leads_to(&previous.fen, played, fen) {
            tracing::debug!(
                "Last move {} does not follow the last completed search, not classified",
                format_uci_move(played)
            );
            return;
        }
        let in_book = self
            .session
            .fen
            .as_deref()
            .is_some_and(|fen| self.book.contains(fen));
        let label = quality::classify(&previous.top, played, top, in_book);
        tracing::debug!("Move {} classified as {:?}", format_uci_move(played), label);
        self.emit(Effect::MoveQuality {
            square: format_square(played.to),
            label,
            color: label.color(),
        });
    }

    fn decide(&mut self, top_moves: &[CandidateMove]) {
        let Some(top) = top_moves.first() else {
            return;
        };

        let horizon = self.settings.mate_finder_value;
        let mate_in_range =
            matches!(top.mate_distance(), Some(n) if n > 0 && n.unsigned_abs() <= horizon);
        if mate_in_range && self.player_turn {
            if self.is_legal(top.mv) {
                tracing::info!("Mate found, playing {} now", top.token());
                self.emit_move(top.mv, false);
                return;
            }
            tracing::error!("Mating move {} is not legal here", top.token());
        }

        if !self.settings.legit_auto_move {
            return;
        }

        let policy = SelectionPolicy {
            random_best_move: self.settings.random_best_move,
            best_move_chance: self.settings.best_move_chance,
            high_mate_chance: self.settings.highmatechance,
            mate_horizon: horizon,
        };
        let Some(chosen) = select_move(top_moves, &policy, &mut self.rng) else {
            return;
        };
        let mv = chosen.mv;
        if !self.is_legal(mv) {
            tracing::error!("Refusing to execute illegal move {}", format_uci_move(mv));
            return;
        }

        if self.player_turn {
            let delay = compute_delay(
                &mut self.rng,
                self.settings.auto_move_jitter(),
                self.settings.fallback_delay(),
            );
            self.schedule(mv, false, delay);
        } else if self.settings.premove_enabled {
            if self.premoves_used < self.settings.max_premoves {
                self.premoves_used += 1;
                let delay = compute_delay(
                    &mut self.rng,
                    self.settings.premove_jitter(),
                    self.settings.fallback_delay(),
                );
                self.schedule(mv, true, delay);
            } else {
                tracing::debug!("Pre-move budget exhausted");
            }
            if self.premoves_used >= self.settings.max_premoves && !self.premove_limit_signaled {
                self.premove_limit_signaled = true;
                self.emit(Effect::PremoveLimitReached);
            }
        }
    }

    /// An empty legal-move list means legality is unknown.
    fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves.is_empty() || self.legal_moves.contains(&mv)
    }

    fn schedule(&mut self, mv: Move, premove: bool, delay: Duration) {
        tracing::info!(
            "{} {} in {:?}",
            if premove { "Pre-move" } else { "Auto-move" },
            format_uci_move(mv),
            delay
        );
        self.outputs.push(Output::Schedule {
            delay,
            action: ScheduledMove {
                mv,
                premove,
                generation: self.session.generation,
                game: self.game,
            },
        });
    }

    fn emit_move(&mut self, mv: Move, premove: bool) {
        self.emit(Effect::ExecuteMove {
            from: format_square(mv.from),
            to: format_square(mv.to),
            promotion: mv.promotion.map(format_piece),
            premove,
        });
    }

    fn emit(&mut self, effect: Effect) {
        self.flush();
        self.outputs.push(Output::Emit(effect));
    }

    fn flush(&mut self) {
        let commands = self.protocol.take_outgoing();
        self.outputs.extend(commands.into_iter().map(Output::Send));
    }
}

/// Compares placement, side to move, castling and en passant only.
/// Whether playing `mv` in the position `from` reaches the position `to`.
fn leads_to(from: &str, mv: Move, to: &str) -> bool {
    let (Ok(mut board), Ok(target)) = (from.parse::<Board>(), to.parse::<Board>()) else {
        return false;
    };
    let Ok(mv) = cozy_chess::util::parse_uci_move(&board, &format_uci_move(mv)) else {
        return false;
    };
    board.try_play(mv).is_ok() && board.same_position(&target)
}

fn is_start_position(fen: &str) -> bool {
    fen.split_whitespace()
        .take(4)
        .eq(START_FEN.split_whitespace().take(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::quality::MoveQuality;
    use crate::book::{FenBook, NoBook};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn controller(settings: Settings) -> BoardController<StdRng> {
        BoardController::new(settings, Arc::new(NoBook), StdRng::seed_from_u64(42))
    }

    fn sent(outputs: &[Output]) -> Vec<String> {
        outputs
            .iter()
            .filter_map(|o| match o {
                Output::Send(cmd) => Some(cmd.to_string()),
                _ => None,
            })
            .collect()
    }

    fn effects(outputs: &[Output]) -> Vec<Effect> {
        outputs
            .iter()
            .filter_map(|o| match o {
                Output::Emit(effect) => Some(effect.clone()),
                _ => None,
            })
            .collect()
    }

    fn scheduled(outputs: &[Output]) -> Vec<(Duration, ScheduledMove)> {
        outputs
            .iter()
            .filter_map(|o| match o {
                Output::Schedule { delay, action } => Some((*delay, action.clone())),
                _ => None,
            })
            .collect()
    }

    /// Connected, handshaken controller with a submitted search for `fen`.
    fn searching(settings: Settings, fen: &str) -> BoardController<StdRng> {
        let mut c = controller(settings);
        c.on_open();
        c.on_line("uciok");
        c.on_position_changed(fen.to_string());
        c.on_line("readyok");
        c.take_outputs();
        c
    }

    #[test]
    fn test_handshake_then_search() {
        let mut c = controller(Settings::default());
        c.on_position_changed(AFTER_E4.to_string());
        // Nothing goes out before the connection exists.
        assert!(sent(&c.take_outputs()).is_empty());

        c.on_open();
        c.on_line("uciok");
        assert_eq!(
            sent(&c.take_outputs()),
            vec![
                "uci",
                "setoption name Threads value 1",
                "setoption name Hash value 1024",
                "setoption name MultiPV value 3",
                "isready",
            ]
        );
        c.on_line("readyok");
        assert_eq!(
            sent(&c.take_outputs()),
            vec![format!("position fen {}", AFTER_E4), "go depth 15".to_string()]
        );
        assert_eq!(c.protocol_state(), ProtocolState::Evaluating);
        assert!(c.session().is_evaluating);
    }

    #[test]
    fn test_new_position_stops_before_next_go() {
        let mut c = searching(Settings::default(), AFTER_E4);
        c.on_line("info depth 5 score cp 20 pv e7e5");

        c.on_position_changed(AFTER_E4_E5.to_string());
        assert_eq!(sent(&c.take_outputs()), vec!["stop", "ucinewgame"]);
        assert_eq!(c.protocol_state(), ProtocolState::Stopping);

        // Late analysis from the stopped search is not merged.
        c.on_line("info depth 9 score cp 25 pv d7d5");
        assert!(!c.session().current.contains(parse_uci_move("d7d5").unwrap()));

        c.on_line("bestmove e7e5");
        assert_eq!(sent(&c.take_outputs()), vec!["isready"]);
        c.on_line("readyok");
        assert_eq!(
            sent(&c.take_outputs()),
            vec![format!("position fen {}", AFTER_E4_E5), "go depth 15".to_string()]
        );
        assert_eq!(c.session().generation, 2);
        assert!(c.session().current.is_empty());
    }

    #[test]
    fn test_rapid_positions_submit_only_latest() {
        let mut c = searching(Settings::default(), AFTER_E4);
        c.on_position_changed(AFTER_E4_E5.to_string());
        c.on_position_changed(START_FEN.to_string());
        assert_eq!(sent(&c.take_outputs()), vec!["stop", "ucinewgame"]);
        c.on_line("bestmove e7e5");
        c.on_line("readyok");
        let lines = sent(&c.take_outputs());
        assert_eq!(lines.iter().filter(|l| l.starts_with("go")).count(), 1);
        assert!(lines.contains(&format!("position fen {}", START_FEN)));
    }

    #[test]
    fn test_top_move_from_analysis() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_line("info depth 10 score cp 35 pv e2e4");
        c.on_line("info depth 12 score cp 40 pv d2d4");
        c.on_line("bestmove d2d4");
        c.take_outputs();

        let previous = c.session().previous.as_ref().unwrap();
        assert_eq!(previous.top.token(), "d2d4");
        assert!(!previous.top.synthetic);
        assert_eq!(previous.top.quality_class(), chess::QualityClass::Good);
        assert!(!c.session().is_evaluating);
    }

    #[test]
    fn test_unseen_best_move_is_synthesized() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_line("bestmove g1f3");
        let outputs = c.take_outputs();

        let previous = c.session().previous.as_ref().unwrap();
        assert_eq!(previous.top.token(), "g1f3");
        assert!(previous.top.synthetic);
        assert_eq!(previous.top.depth, 15);
        assert!(effects(&outputs).contains(&Effect::DepthProgress { percent: 100 }));
    }

    #[test]
    fn test_progress_effects_while_searching() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_line("info depth 3 score cp 20 pv e2e4 e7e5");
        let fx = effects(&c.take_outputs());
        assert!(fx.contains(&Effect::DepthProgress { percent: 20 }));
        assert!(fx.contains(&Effect::Evaluation {
            value: 20,
            mate: false
        }));
        assert!(fx.iter().any(|e| matches!(e, Effect::Arrows { arrows } if arrows.len() == 1)));

        // Partial lines change nothing.
        c.on_line("info depth 4 currmove e2e4 currmovenumber 1");
        assert!(effects(&c.take_outputs()).is_empty());
    }

    #[test]
    fn test_hints_can_be_disabled() {
        let settings = Settings {
            show_hints: false,
            evaluation_bar: false,
            depth_bar: false,
            ..Default::default()
        };
        let mut c = searching(settings, START_FEN);
        c.on_line("info depth 3 score cp 20 pv e2e4");
        c.on_line("bestmove e2e4");
        assert!(effects(&c.take_outputs()).is_empty());
    }

    #[test]
    fn test_bestmove_none_ends_without_move() {
        let settings = Settings {
            legit_auto_move: true,
            ..Default::default()
        };
        let mut c = searching(settings, START_FEN);
        c.on_turn_changed(true);
        c.on_line("bestmove (none)");
        let outputs = c.take_outputs();
        assert!(scheduled(&outputs).is_empty());
        assert!(!effects(&outputs)
            .iter()
            .any(|e| matches!(e, Effect::ExecuteMove { .. })));
        assert!(!c.session().is_evaluating);
    }

    #[test]
    fn test_mate_shortcut_plays_immediately() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_turn_changed(true);
        c.on_line("info depth 8 score mate 2 pv d1h5 g7g6 h5f7");
        c.on_line("bestmove d1h5");
        let outputs = c.take_outputs();
        assert!(scheduled(&outputs).is_empty());
        assert!(effects(&outputs).contains(&Effect::ExecuteMove {
            from: "d1".into(),
            to: "h5".into(),
            promotion: None,
            premove: false,
        }));
    }

    #[test]
    fn test_mate_shortcut_needs_player_turn_and_horizon() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_turn_changed(false);
        c.on_line("info depth 8 score mate 2 pv d1h5 g7g6 h5f7");
        c.on_line("bestmove d1h5");
        assert!(!effects(&c.take_outputs())
            .iter()
            .any(|e| matches!(e, Effect::ExecuteMove { .. })));

        let mut c = searching(Settings::default(), START_FEN);
        c.on_turn_changed(true);
        c.on_line("info depth 8 score mate 7 pv d1h5");
        c.on_line("bestmove d1h5");
        assert!(!effects(&c.take_outputs())
            .iter()
            .any(|e| matches!(e, Effect::ExecuteMove { .. })));
    }

    #[test]
    fn test_auto_move_is_scheduled_with_jitter() {
        let settings = Settings {
            legit_auto_move: true,
            best_move_chance: 100,
            ..Default::default()
        };
        let mut c = searching(settings, START_FEN);
        c.on_turn_changed(true);
        c.on_line("info depth 15 score cp 30 pv e2e4");
        c.on_line("bestmove e2e4");
        let jobs = scheduled(&c.take_outputs());
        assert_eq!(jobs.len(), 1);
        let (delay, action) = &jobs[0];
        assert!((5000..=14_000).contains(&(delay.as_millis() as u64)));
        assert_eq!(format_uci_move(action.mv), "e2e4");
        assert!(!action.premove);

        c.on_timer(action.clone());
        assert_eq!(
            effects(&c.take_outputs()),
            vec![Effect::ExecuteMove {
                from: "e2".into(),
                to: "e4".into(),
                promotion: None,
                premove: false,
            }]
        );
    }

    #[test]
    fn test_stale_auto_move_is_dropped() {
        let settings = Settings {
            legit_auto_move: true,
            best_move_chance: 100,
            ..Default::default()
        };
        let mut c = searching(settings, START_FEN);
        c.on_turn_changed(true);
        c.on_line("bestmove e2e4");
        let (_, action) = scheduled(&c.take_outputs()).remove(0);

        c.on_position_changed(AFTER_E4.to_string());
        c.on_line("readyok");
        c.take_outputs();
        assert_eq!(c.session().generation, 2);

        c.on_timer(action.clone());
        assert!(effects(&c.take_outputs()).is_empty());

        // The permissive mode fires regardless.
        c.apply_settings(Settings {
            drop_stale_moves: false,
            ..c.settings().clone()
        });
        c.on_timer(action);
        assert_eq!(effects(&c.take_outputs()).len(), 1);
    }

    #[test]
    fn test_illegal_choice_is_not_executed() {
        let settings = Settings {
            legit_auto_move: true,
            best_move_chance: 100,
            ..Default::default()
        };
        let mut c = searching(settings, START_FEN);
        c.on_turn_changed(true);
        c.on_legal_moves(&["d2d4".to_string(), "g1f3".to_string()]);
        c.on_line("bestmove e2e4");
        assert!(scheduled(&c.take_outputs()).is_empty());
    }

    #[test]
    fn test_premove_budget_and_single_limit_signal() {
        let settings = Settings {
            legit_auto_move: true,
            premove_enabled: true,
            max_premoves: 2,
            best_move_chance: 100,
            ..Default::default()
        };
        let mut c = controller(settings);
        c.on_open();
        c.on_line("uciok");

        let positions = [AFTER_E4, AFTER_E4_E5, START_FEN, AFTER_E4];
        let mut premoves = 0;
        let mut limit_signals = 0;
        for (i, fen) in positions.iter().enumerate() {
            c.on_position_changed(fen.to_string());
            if i > 0 {
                c.on_line("bestmove e7e5");
            }
            c.on_line("readyok");
            c.on_line("info depth 15 score cp 10 pv e7e5");
            c.on_line("bestmove e7e5");
            let outputs = c.take_outputs();
            premoves += scheduled(&outputs).iter().filter(|(_, a)| a.premove).count();
            limit_signals += effects(&outputs)
                .iter()
                .filter(|e| **e == Effect::PremoveLimitReached)
                .count();
            if i == 1 {
                assert_eq!(premoves, 2);
                assert_eq!(limit_signals, 1);
            }
        }
        // The start position began a new game with a fresh budget.
        assert_eq!(premoves, 4);
        assert_eq!(limit_signals, 2);
    }

    #[test]
    fn test_zero_premove_budget_signals_limit() {
        let settings = Settings {
            legit_auto_move: true,
            premove_enabled: true,
            max_premoves: 0,
            best_move_chance: 100,
            ..Default::default()
        };
        let mut c = searching(settings, AFTER_E4);
        c.on_line("bestmove e7e5");
        let outputs = c.take_outputs();
        assert!(scheduled(&outputs).is_empty());
        assert!(effects(&outputs).contains(&Effect::PremoveLimitReached));

        c.on_position_changed(AFTER_E4_E5.to_string());
        c.on_line("bestmove e7e5");
        c.on_line("readyok");
        c.on_line("bestmove g1f3");
        let outputs = c.take_outputs();
        assert!(scheduled(&outputs).is_empty());
        assert!(!effects(&outputs).contains(&Effect::PremoveLimitReached));
    }

    #[test]
    fn test_premoves_survive_position_change_but_not_new_game() {
        let settings = Settings {
            legit_auto_move: true,
            premove_enabled: true,
            best_move_chance: 100,
            ..Default::default()
        };
        let mut c = searching(settings, AFTER_E4_E5);
        c.on_line("bestmove g1f3");
        let (delay, action) = scheduled(&c.take_outputs()).remove(0);
        assert!(action.premove);
        assert!((1000..=1099).contains(&(delay.as_millis() as u64)));

        c.on_position_changed(AFTER_E4.to_string());
        c.on_timer(action.clone());
        assert_eq!(effects(&c.take_outputs()).len(), 1);

        c.new_game();
        c.on_timer(action);
        assert!(effects(&c.take_outputs()).is_empty());
    }

    #[test]
    fn test_move_quality_for_previous_move() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_line("info depth 15 score cp 40 pv e2e4");
        c.on_line("bestmove e2e4");
        c.take_outputs();

        c.on_last_move("a2a3");
        c.on_position_changed("rnbqkbnr/pppppppp/8/8/8/P7/1PPPPPPP/RNBQKBNR b KQkq - 0 1".into());
        c.on_line("readyok");
        c.on_line("info depth 15 score cp 60 pv e7e5");
        c.on_line("bestmove e7e5");
        let quality: Vec<_> = effects(&c.take_outputs())
            .into_iter()
            .filter(|e| matches!(e, Effect::MoveQuality { .. }))
            .collect();
        // 40 before, -60 after: a loss of 100.
        assert_eq!(
            quality,
            vec![Effect::MoveQuality {
                square: "a3".into(),
                label: MoveQuality::Inaccuracy,
                color: "#ffff00",
            }]
        );
    }

    #[test]
    fn test_move_after_interrupted_search_is_not_classified() {
        const AFTER_D4: &str = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1";
        const AFTER_D4_D5: &str = "rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 2";
        let mut c = searching(Settings::default(), START_FEN);
        c.on_line("info depth 15 score cp 40 pv e2e4");
        c.on_line("bestmove e2e4");
        c.take_outputs();

        // The search after d4 is cut short by the reply.
        c.on_last_move("d2d4");
        c.on_position_changed(AFTER_D4.into());
        c.on_line("readyok");
        c.on_last_move("d7d5");
        c.on_position_changed(AFTER_D4_D5.into());
        c.on_line("bestmove e7e5");
        c.on_line("readyok");
        c.on_line("info depth 15 score cp 900 pv c1f4");
        c.on_line("bestmove c1f4");

        let fx = effects(&c.take_outputs());
        assert!(!fx.iter().any(|e| matches!(e, Effect::MoveQuality { .. })));
    }

    #[test]
    fn test_leads_to() {
        let e2e4 = parse_uci_move("e2e4").unwrap();
        assert!(leads_to(START_FEN, e2e4, AFTER_E4));
        assert!(!leads_to(START_FEN, parse_uci_move("d2d4").unwrap(), AFTER_E4));
        assert!(!leads_to(AFTER_E4, e2e4, AFTER_E4_E5));
        assert!(!leads_to("not a fen", e2e4, AFTER_E4));
        // Castling in standard notation.
        let before = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let after = "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1";
        assert!(leads_to(before, parse_uci_move("e1g1").unwrap(), after));
    }

    #[test]
    fn test_book_position_is_labelled_book() {
        let book = Arc::new(FenBook::from_lines(AFTER_E4));
        let mut c = BoardController::new(Settings::default(), book, StdRng::seed_from_u64(1));
        c.on_open();
        c.on_line("uciok");
        c.on_position_changed(START_FEN.into());
        c.on_line("readyok");
        c.on_line("bestmove d2d4");
        c.on_last_move("e2e4");
        c.on_position_changed(AFTER_E4.into());
        c.on_line("readyok");
        c.on_line("bestmove e7e5");
        let fx = effects(&c.take_outputs());
        assert!(fx.contains(&Effect::MoveQuality {
            square: "e4".into(),
            label: MoveQuality::Book,
            color: "#a88865",
        }));
    }

    #[test]
    fn test_connection_loss_resubmits_after_reconnect() {
        let mut c = searching(Settings::default(), AFTER_E4);
        assert!(c.on_closed());
        assert_eq!(c.protocol_state(), ProtocolState::Reconnecting);
        assert!(effects(&c.take_outputs()).contains(&Effect::ConnectionStatus { connected: false }));

        c.on_open();
        c.on_line("uciok");
        let lines = sent(&c.take_outputs());
        assert_eq!(lines.first().map(String::as_str), Some("uci"));
        assert_eq!(lines.last().map(String::as_str), Some("isready"));
        c.on_line("readyok");
        assert_eq!(
            sent(&c.take_outputs()),
            vec![format!("position fen {}", AFTER_E4), "go depth 15".to_string()]
        );
    }

    #[test]
    fn test_retry_effects() {
        let mut c = controller(Settings::default());
        c.on_retry_scheduled(RetryDecision::RetryAfter(Duration::from_millis(4000)), 2);
        c.on_retry_scheduled(RetryDecision::GiveUp, 5);
        assert_eq!(
            effects(&c.take_outputs()),
            vec![
                Effect::Reconnecting {
                    attempt: 2,
                    delay_ms: 4000
                },
                Effect::EngineUnreachable,
            ]
        );
    }

    #[test]
    fn test_new_settings_reach_ready_engine() {
        let mut c = searching(Settings::default(), START_FEN);
        c.apply_settings(Settings {
            multipv: 5,
            ..Default::default()
        });
        assert_eq!(
            sent(&c.take_outputs()),
            vec![
                "setoption name Threads value 1",
                "setoption name Hash value 1024",
                "setoption name MultiPV value 5",
            ]
        );
    }

    #[test]
    fn test_start_position_detection() {
        assert!(is_start_position(START_FEN));
        assert!(is_start_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 3 9"
        ));
        assert!(!is_start_position(AFTER_E4));
    }

    #[test]
    fn test_snapshot() {
        let mut c = searching(Settings::default(), START_FEN);
        c.on_line("info depth 10 score cp 35 pv e2e4");
        let snap = c.snapshot("board-1", "in-process");
        assert_eq!(snap.engine_state, "Evaluating");
        assert!(snap.connected);
        assert_eq!(snap.candidates, vec!["e2e4"]);
    }
}
