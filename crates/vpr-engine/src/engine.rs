//! Engine facade: current game position, configuration and the searcher.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tracing::{debug, info};
use vpr_core::{Move, Position};

use crate::error::EngineError;
use crate::eval::phase::GamePhase;
use crate::search::negamax::MAX_PLY;
use crate::search::{DEFAULT_MAX_DEPTH, SearchInfo, SearchLimits, SearchResult, Searcher};
use crate::time::{Clock, control_for};

/// Tunable engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    /// Iterative-deepening ceiling for timed searches.
    pub max_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Where a game position starts before the move list is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSpec {
    StartPos,
    Fen(String),
}

/// A chess engine: one game position and the search state for that game.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    searcher: Searcher,
    position: Position,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            searcher: Searcher::new(config.hash_mb),
            position: Position::startpos(),
            config,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Set the game position from a start and a list of UCI moves.
    ///
    /// On error the previous position is kept.
    pub fn set_position<I, S>(&mut self, spec: &PositionSpec, moves: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut position = match spec {
            PositionSpec::StartPos => Position::startpos(),
            PositionSpec::Fen(fen) => Position::from_fen(fen)?,
        };
        position.apply_uci_moves(moves)?;
        debug!(fen = %position, "position set");
        self.position = position;
        Ok(())
    }

    /// Reset the position and forget all search state from the last game.
    pub fn new_game(&mut self) {
        self.position = Position::startpos();
        self.searcher.new_game();
    }

    /// Resize the transposition table (clears it).
    pub fn set_hash_mb(&mut self, mb: usize) {
        self.config.hash_mb = mb.max(1);
        self.searcher.resize_tt(self.config.hash_mb);
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.config.max_depth = depth.clamp(1, MAX_PLY as u32 - 1);
    }

    /// Search the current position.
    ///
    /// A fixed `depth` overrides the clock for this call only. `stopped`
    /// aborts the search from another thread; the last completed iteration
    /// is still returned.
    pub fn think<F>(
        &mut self,
        clock: &Clock,
        depth: Option<u32>,
        stopped: Arc<AtomicBool>,
        on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(&SearchInfo),
    {
        let phase = GamePhase::detect(&self.position);
        let control = control_for(clock, depth.is_some(), phase, stopped);
        let limits = SearchLimits {
            max_depth: depth.unwrap_or(self.config.max_depth),
        };

        info!(
            ?phase,
            budget_ms = control.limit().map(|d| d.as_millis() as u64),
            max_depth = limits.max_depth,
            "search started"
        );
        let result = self
            .searcher
            .search(&mut self.position, limits, &control, on_iter);
        if result.best_move.is_none() {
            info!(
                checkmate = self.position.is_checkmate(),
                stalemate = self.position.is_stalemate(),
                "no legal move to play"
            );
        }
        info!(
            best = ?result.best_move.map(|m| m.to_string()),
            depth = result.depth,
            nodes = result.nodes,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "search finished"
        );
        result
    }

    /// Best move with `time_left` on the mover's clock (zero means untimed).
    ///
    /// `None` when the game is over.
    pub fn get_best_move(&mut self, time_left: Duration, increment: Duration) -> Option<Move> {
        let clock = Clock {
            time_left: Some(time_left),
            increment,
            ..Clock::default()
        };
        self.think(&clock, None, Arc::new(AtomicBool::new(false)), |_| {})
            .best_move
    }

    /// Search to exactly `depth` plies, ignoring the clock.
    pub fn search_depth(&mut self, depth: u32) -> SearchResult {
        self.think(
            &Clock::default(),
            Some(depth),
            Arc::new(AtomicBool::new(false)),
            |_| {},
        )
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
