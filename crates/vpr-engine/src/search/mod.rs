//! Search algorithms and move ordering.

pub mod control;
pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod see;
pub mod trade;
pub mod tt;

use std::fmt;
use std::time::Duration;

use tracing::debug;
use vpr_core::{Move, Position};

use crate::eval::{MATE_VALUE, evaluate, terminal_score};
use control::SearchControl;
use heuristics::{HistoryTable, KillerTable};
use negamax::{INF, MAX_PLY, SearchContext, extract_pv, negamax};
use ordering::{OrderingHints, order_moves};
use tt::{MATE_THRESHOLD, TranspositionTable};

/// Default iterative-deepening ceiling.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Limits on one top-level search beyond the clock in [`SearchControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A score as reported over UCI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreReport {
    /// Centipawns for the side to move.
    Centipawns(i32),
    /// Moves to mate; negative when the side to move is getting mated.
    Mate(i32),
}

impl ScoreReport {
    pub fn from_score(score: i32) -> Self {
        if score.abs() < MATE_THRESHOLD {
            return Self::Centipawns(score);
        }
        let plies = MATE_VALUE - score.abs();
        let moves = (plies + 1) / 2;
        Self::Mate(if score > 0 { moves } else { -moves })
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centipawns(cp) => write!(f, "cp {cp}"),
            Self::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

/// Progress report for one completed iteration.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u32,
    pub score: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    /// Nodes per second.
    pub nps: u64,
    pub pv: Vec<Move>,
    /// Transposition table fill in per-mille.
    pub hashfull: u32,
}

impl SearchInfo {
    pub fn score_report(&self) -> ScoreReport {
        ScoreReport::from_score(self.score)
    }
}

/// Result of a top-level search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration; `None` only when the
    /// position has no legal moves.
    pub best_move: Option<Move>,
    /// Score in centipawns from the side to move's perspective.
    pub score: i32,
    /// Deepest completed iteration (0 when none completed).
    pub depth: u32,
    pub nodes: u64,
    pub pv: Vec<Move>,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn score_report(&self) -> ScoreReport {
        ScoreReport::from_score(self.score)
    }
}

fn nps(nodes: u64, elapsed: Duration) -> u64 {
    let ms = elapsed.as_millis().max(1) as u64;
    nodes.saturating_mul(1_000) / ms
}

/// Iterative-deepening searcher.
///
/// Owns the transposition table and the ordering heuristics, which persist
/// across searches of the same game.
pub struct Searcher {
    tt: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
}

impl Searcher {
    /// Create a searcher with a transposition table of `hash_mb` megabytes.
    pub fn new(hash_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new(hash_mb),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
        }
    }

    /// Forget everything learned about the previous game.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Resize the transposition table to the given size in megabytes.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// First move in search order, used when no iteration completes.
    fn fallback_move(&self, pos: &mut Position) -> Option<Move> {
        let tt_move = self
            .tt
            .best_move(pos.key())
            .filter(|&mv| pos.board().legal(mv));
        let hints = OrderingHints {
            tt_move,
            killers: &self.killers,
            history: &self.history,
            ply: 0,
        };
        order_moves(pos, &hints).first().copied()
    }

    /// Run iterative deepening from depth 1 up to `limits.max_depth`.
    ///
    /// Calls `on_iter` after each completed iteration. An iteration cut
    /// short by the control is discarded. `pos` is unchanged on return.
    pub fn search<F>(
        &mut self,
        pos: &mut Position,
        limits: SearchLimits,
        control: &SearchControl,
        mut on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(&SearchInfo),
    {
        self.tt.new_generation();
        self.history.age();

        let Some(fallback) = self.fallback_move(pos) else {
            return SearchResult {
                best_move: None,
                score: terminal_score(pos, 0).unwrap_or(0),
                depth: 0,
                nodes: 0,
                pv: Vec::new(),
                elapsed: control.elapsed(),
            };
        };

        let mut result = SearchResult {
            best_move: Some(fallback),
            score: evaluate(pos),
            depth: 0,
            nodes: 0,
            pv: vec![fallback],
            elapsed: Duration::ZERO,
        };

        let max_depth = limits.max_depth.clamp(1, MAX_PLY as u32 - 1);
        let mut nodes = 0;

        for depth in 1..=max_depth {
            if depth > 1 && control.time_exceeded() {
                break;
            }

            let mut ctx = SearchContext {
                nodes,
                tt: &mut self.tt,
                killers: &mut self.killers,
                history: &mut self.history,
                control,
                root_best: None,
                aborted: false,
            };
            let score = negamax(pos, depth as i32, 0, -INF, INF, true, &mut ctx);
            nodes = ctx.nodes;
            let (aborted, root_best) = (ctx.aborted, ctx.root_best);

            if aborted {
                debug!(depth, nodes, "iteration aborted, keeping previous result");
                break;
            }
            let Some(best) = root_best else {
                break;
            };

            let mut pv = extract_pv(pos, &self.tt, depth as usize);
            if pv.first() != Some(&best) {
                pv = vec![best];
            }

            let elapsed = control.elapsed();
            let info = SearchInfo {
                depth,
                score,
                nodes,
                elapsed,
                nps: nps(nodes, elapsed),
                pv: pv.clone(),
                hashfull: self.tt.hashfull(),
            };
            debug!(depth, score, nodes, best = %best, "iteration complete");
            on_iter(&info);

            result = SearchResult {
                best_move: Some(best),
                score,
                depth,
                nodes,
                pv,
                elapsed,
            };

            // A forced mate within the searched horizon cannot be improved.
            if score.abs() >= MATE_THRESHOLD && MATE_VALUE - score.abs() <= depth as i32 {
                break;
            }
        }

        result.nodes = nodes;
        result.elapsed = control.elapsed();
        result
    }
}

impl fmt::Debug for Searcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher").field("tt", &self.tt).finish()
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(16)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
