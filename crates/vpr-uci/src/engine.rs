//! Event-driven UCI engine: protocol on the main thread, search on a worker.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use tracing::{debug, info, warn};

use vpr_core::Move;
use vpr_engine::{Engine, EngineConfig, SearchInfo, SearchResult};

use crate::command::{
    Command, GoParams, MAX_DEPTH, MAX_HASH_MB, PositionCommand, UciOption, parse_command,
};
use crate::error::UciError;

/// Whether a search is running on the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Searching,
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
    InputFailed(io::Error),
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    engine: Engine,
}

/// Settings changed while the worker owned the engine.
#[derive(Default)]
struct Pending {
    new_game: bool,
    hash_mb: Option<usize>,
    max_depth: Option<u32>,
    position: Option<PositionCommand>,
}

/// The UCI engine.
///
/// Runs an event-driven loop on the main thread. Each `go` hands the
/// [`Engine`] to a worker thread, which sends it back with the result, so
/// `stop` and `isready` stay responsive during a search.
pub struct UciEngine {
    engine: Option<Engine>,
    state: EngineState,
    stop_flag: Arc<AtomicBool>,
    pending: Pending,
}

impl UciEngine {
    /// Create a new engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: Some(Engine::new(config)),
            state: EngineState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            pending: Pending::default(),
        }
    }

    /// Run the UCI event loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        let _ = stdin_tx.send(EngineEvent::InputFailed(e));
                        return;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!(cmd = %trimmed, "received UCI command");
                if stdin_tx
                    .send(EngineEvent::UciCommand(parse_command(trimmed)))
                    .is_err()
                {
                    return;
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        let outcome = self.event_loop(&tx, &rx);
        info!("vpr shutting down");
        outcome
    }

    /// Process events until `quit` or end of input.
    ///
    /// A running search is always finished and its `bestmove` printed before
    /// returning. On `quit` it is stopped first; on end of input it runs to
    /// its own limits, as it does when reading stdin fails.
    fn event_loop(
        &mut self,
        tx: &mpsc::Sender<EngineEvent>,
        rx: &mpsc::Receiver<EngineEvent>,
    ) -> Result<(), UciError> {
        let mut outcome = Ok(());
        for event in rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::SetOption(option) => self.handle_setoption(option),
                    Command::Position(position) => self.handle_position(position),
                    Command::Go(params) => self.handle_go(params, tx),
                    Command::Stop => self.handle_stop(),
                    Command::Quit => {
                        self.handle_stop();
                        break;
                    }
                    Command::Unknown(_) => {}
                },
                EngineEvent::UciCommand(Err(e)) => {
                    warn!(error = %e, "UCI parse error");
                }
                EngineEvent::SearchDone(done) => self.finish_search(done),
                EngineEvent::InputClosed => {
                    debug!("input closed");
                    break;
                }
                EngineEvent::InputFailed(e) => {
                    outcome = Err(UciError::from(e));
                    break;
                }
            }
        }
        self.await_search(rx);
        outcome
    }

    /// Block until the running search, if any, reports back.
    fn await_search(&mut self, rx: &mpsc::Receiver<EngineEvent>) {
        if self.state != EngineState::Searching {
            return;
        }
        for event in rx {
            if let EngineEvent::SearchDone(done) = event {
                self.finish_search(done);
                return;
            }
        }
    }

    fn handle_ucinewgame(&mut self) {
        match self.engine.as_mut() {
            Some(engine) => engine.new_game(),
            None => self.pending.new_game = true,
        }
    }

    fn handle_setoption(&mut self, option: UciOption) {
        debug!(?option, "setoption");
        match (option, self.engine.as_mut()) {
            (UciOption::Hash(mb), Some(engine)) => engine.set_hash_mb(mb),
            (UciOption::Hash(mb), None) => self.pending.hash_mb = Some(mb),
            (UciOption::MaxDepth(depth), Some(engine)) => engine.set_max_depth(depth),
            (UciOption::MaxDepth(depth), None) => self.pending.max_depth = Some(depth),
        }
    }

    fn handle_position(&mut self, position: PositionCommand) {
        match self.engine.as_mut() {
            Some(engine) => apply_position(engine, &position),
            None => self.pending.position = Some(position),
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if self.state != EngineState::Idle {
            warn!("go received while searching, ignoring");
            return;
        }
        let Some(mut engine) = self.engine.take() else {
            warn!("engine unavailable, ignoring go");
            return;
        };

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&self.stop_flag);
        let clock = params.clock_for(engine.position().side_to_move());
        let depth = params.depth;
        let tx = tx.clone();

        std::thread::spawn(move || {
            let result = engine.think(&clock, depth, stop, |info| {
                println!("{}", format_info(info));
            });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, engine }));
        });

        self.state = EngineState::Searching;
    }

    fn handle_stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    fn finish_search(&mut self, done: SearchDone) {
        let SearchDone { result, mut engine } = done;

        let pending = std::mem::take(&mut self.pending);
        if pending.new_game {
            engine.new_game();
        }
        if let Some(mb) = pending.hash_mb {
            engine.set_hash_mb(mb);
        }
        if let Some(depth) = pending.max_depth {
            engine.set_max_depth(depth);
        }
        if let Some(position) = pending.position {
            apply_position(&mut engine, &position);
        }

        self.engine = Some(engine);
        self.state = EngineState::Idle;

        println!("{}", format_bestmove(result.best_move));
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_uci() {
    let defaults = EngineConfig::default();
    println!("id name VPR");
    println!("id author V7P3R Project");
    println!(
        "option name Hash type spin default {} min 1 max {MAX_HASH_MB}",
        defaults.hash_mb
    );
    println!(
        "option name MaxDepth type spin default {} min 1 max {MAX_DEPTH}",
        defaults.max_depth
    );
    println!("uciok");
}

/// Apply a `position` command; a rejected one leaves the old position.
fn apply_position(engine: &mut Engine, position: &PositionCommand) {
    if let Err(e) = engine.set_position(&position.spec, &position.moves) {
        warn!(error = %UciError::from(e), "position rejected, keeping previous position");
    }
}

/// One `info` line for a completed iteration.
pub fn format_info(info: &SearchInfo) -> String {
    let pv: Vec<String> = info.pv.iter().map(Move::to_string).collect();
    format!(
        "info depth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
        info.depth,
        info.score_report(),
        info.nodes,
        info.nps,
        info.elapsed.as_millis(),
        info.hashfull,
        pv.join(" ")
    )
}

/// The `bestmove` line; `0000` when there is no legal move.
pub fn format_bestmove(best: Option<Move>) -> String {
    match best {
        Some(mv) => format!("bestmove {mv}"),
        None => "bestmove 0000".to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    use vpr_core::Position;
    use vpr_engine::PositionSpec;

    fn small_engine() -> UciEngine {
        UciEngine::with_config(EngineConfig {
            hash_mb: 1,
            max_depth: 3,
        })
    }

    #[test]
    fn info_line_format() {
        let pos = Position::startpos();
        let e4 = pos.parse_uci_move("e2e4").unwrap();
        let e5 = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .unwrap()
            .parse_uci_move("e7e5")
            .unwrap();
        let info = SearchInfo {
            depth: 2,
            score: 35,
            nodes: 1200,
            elapsed: Duration::from_millis(12),
            nps: 100_000,
            pv: vec![e4, e5],
            hashfull: 3,
        };
        assert_eq!(
            format_info(&info),
            "info depth 2 score cp 35 nodes 1200 nps 100000 time 12 hashfull 3 pv e2e4 e7e5"
        );
    }

    #[test]
    fn bestmove_line_format() {
        let mv = Position::startpos().parse_uci_move("g1f3").unwrap();
        assert_eq!(format_bestmove(Some(mv)), "bestmove g1f3");
        assert_eq!(format_bestmove(None), "bestmove 0000");
    }

    #[test]
    fn rejected_position_keeps_previous() {
        let mut uci = small_engine();
        uci.handle_position(PositionCommand {
            spec: PositionSpec::StartPos,
            moves: vec!["e2e4".into()],
        });
        let before = uci.engine.as_ref().unwrap().position().clone();

        uci.handle_position(PositionCommand {
            spec: PositionSpec::StartPos,
            moves: vec!["e2e4".into(), "e2e4".into()],
        });
        assert_eq!(uci.engine.as_ref().unwrap().position(), &before);
    }

    #[test]
    fn settings_are_deferred_while_searching() {
        let mut uci = small_engine();
        let engine = uci.engine.take().unwrap();
        uci.state = EngineState::Searching;

        uci.handle_setoption(UciOption::MaxDepth(9));
        uci.handle_position(PositionCommand {
            spec: PositionSpec::StartPos,
            moves: vec!["d2d4".into()],
        });
        assert!(uci.engine.is_none());

        let result = SearchResult {
            best_move: None,
            score: 0,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
            elapsed: Duration::ZERO,
        };
        uci.finish_search(SearchDone { result, engine });

        let engine = uci.engine.as_ref().unwrap();
        assert_eq!(uci.state, EngineState::Idle);
        assert_eq!(engine.config().max_depth, 9);
        assert_eq!(engine.position().fullmove_number(), 1);
        assert_eq!(engine.position().stack_len(), 1);
    }

    fn go_depth(depth: u32) -> EngineEvent {
        EngineEvent::UciCommand(Ok(Command::Go(GoParams {
            depth: Some(depth),
            ..GoParams::default()
        })))
    }

    #[test]
    fn end_of_input_waits_for_running_search() {
        let mut uci = small_engine();
        let (tx, rx) = mpsc::channel();
        tx.send(go_depth(3)).unwrap();
        tx.send(EngineEvent::InputClosed).unwrap();

        uci.event_loop(&tx, &rx).unwrap();

        assert_eq!(uci.state, EngineState::Idle);
        assert!(uci.engine.is_some());
        assert!(!uci.stop_flag.load(Ordering::Acquire));
    }

    #[test]
    fn quit_stops_and_collects_running_search() {
        let mut uci = small_engine();
        let (tx, rx) = mpsc::channel();
        tx.send(EngineEvent::UciCommand(Ok(Command::Go(GoParams {
            infinite: true,
            ..GoParams::default()
        }))))
        .unwrap();
        tx.send(EngineEvent::UciCommand(Ok(Command::Quit))).unwrap();

        uci.event_loop(&tx, &rx).unwrap();

        assert_eq!(uci.state, EngineState::Idle);
        assert!(uci.engine.is_some());
    }

    #[test]
    fn read_failure_is_reported_after_search() {
        let mut uci = small_engine();
        let (tx, rx) = mpsc::channel();
        tx.send(go_depth(2)).unwrap();
        tx.send(EngineEvent::InputFailed(io::Error::other("broken pipe")))
            .unwrap();

        let err = uci.event_loop(&tx, &rx).unwrap_err();

        assert!(matches!(err, UciError::Io { .. }));
        assert!(uci.engine.is_some());
    }

    #[test]
    fn go_then_search_done_returns_engine() {
        let mut uci = small_engine();
        let (tx, rx) = mpsc::channel();
        uci.handle_go(
            GoParams {
                depth: Some(2),
                ..GoParams::default()
            },
            &tx,
        );
        assert_eq!(uci.state, EngineState::Searching);
        assert!(uci.engine.is_none());

        let Ok(EngineEvent::SearchDone(done)) = rx.recv() else {
            panic!("expected SearchDone");
        };
        assert_eq!(done.result.depth, 2);
        assert!(done.result.best_move.is_some());
        uci.finish_search(done);
        assert!(uci.engine.is_some());
    }
}
