//! Negamax alpha-beta search with quiescence and null-move pruning.

use std::collections::HashSet;

use vpr_core::{Move, Piece, Position};

use crate::eval::{evaluate, terminal_score};
use crate::search::control::SearchControl;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::ordering::{MovePicker, OrderingHints};
use crate::search::tt::{Bound, TranspositionTable};

/// Score representing an unreachable upper/lower bound.
pub const INF: i32 = 32_000;

/// Maximum search depth (in plies) for array sizing and recursion limits.
pub const MAX_PLY: usize = 128;

/// Quiescence plies before falling back to the static evaluation.
pub const MAX_QDEPTH: u32 = 8;

/// Depth removed from a null-move search.
const NULL_MOVE_REDUCTION: i32 = 3;

/// Minimum remaining depth for a null-move trial.
const NULL_MOVE_MIN_DEPTH: i32 = 3;

/// Search state threaded through negamax calls.
pub(crate) struct SearchContext<'a> {
    /// Nodes visited, quiescence included.
    pub nodes: u64,
    pub tt: &'a mut TranspositionTable,
    pub killers: &'a mut KillerTable,
    pub history: &'a mut HistoryTable,
    pub control: &'a SearchControl,
    /// Best move found at the root by the current iteration.
    pub root_best: Option<Move>,
    /// Latched once the control asks to stop; results after that are discarded.
    pub aborted: bool,
}

impl SearchContext<'_> {
    fn check_stop(&mut self) -> bool {
        if !self.aborted && self.control.should_stop(self.nodes) {
            self.aborted = true;
        }
        self.aborted
    }
}

/// Whether the side to move has anything besides pawns and king.
fn has_non_pawn_material(pos: &Position) -> bool {
    let us = pos.side_to_move();
    [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
        .into_iter()
        .any(|piece| pos.count(piece, us) > 0)
}

/// Negamax alpha-beta search.
///
/// Returns the score of `pos` for the side to move, fail-soft. The position
/// is unchanged on return. When the search is aborted the returned value is
/// meaningless and `ctx.aborted` is set.
pub(crate) fn negamax(
    pos: &mut Position,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    allow_null: bool,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.nodes += 1;

    if ctx.check_stop() {
        return evaluate(pos);
    }

    // The root always needs a move, so game-over rules only apply below it.
    if ply > 0
        && let Some(score) = terminal_score(pos, ply)
    {
        return score;
    }

    if depth <= 0 {
        return quiesce(pos, alpha, beta, 0, ctx);
    }

    if ply >= MAX_PLY - 1 {
        return evaluate(pos);
    }

    let key = pos.key();
    let probe = ctx.tt.probe(key, depth, alpha, beta, ply);
    if ply > 0
        && let Some(value) = probe.value
    {
        return value;
    }
    // Guard against key collisions handing us a move from another position.
    let tt_move = probe.best_move.filter(|&mv| pos.board().legal(mv));

    let in_check = pos.is_check();

    if allow_null
        && ply > 0
        && !in_check
        && depth >= NULL_MOVE_MIN_DEPTH
        && has_non_pawn_material(pos)
        && evaluate(pos) >= beta
        && let Some(mut child) = pos.make_null()
    {
        let score = -negamax(
            &mut child,
            depth - NULL_MOVE_REDUCTION,
            ply + 1,
            -beta,
            -beta + 1,
            false,
            ctx,
        );
        drop(child);
        if ctx.aborted {
            return score;
        }
        if score >= beta {
            return beta;
        }
    }

    let mut picker = {
        let hints = OrderingHints {
            tt_move,
            killers: &*ctx.killers,
            history: &*ctx.history,
            ply,
        };
        MovePicker::new(pos, &hints)
    };

    if picker.is_empty() {
        return evaluate(pos);
    }

    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best_move = None;
    let mut searched = 0;

    while let Some(mv) = picker.pick_next() {
        let quiet = !pos.is_capture(mv);

        let score = {
            let mut child = pos.make(mv);
            if searched == 0 {
                -negamax(&mut child, depth - 1, ply + 1, -beta, -alpha, true, ctx)
            } else {
                let mut score =
                    -negamax(&mut child, depth - 1, ply + 1, -alpha - 1, -alpha, true, ctx);
                if score > alpha && score < beta && !ctx.aborted {
                    score = -negamax(&mut child, depth - 1, ply + 1, -beta, -alpha, true, ctx);
                }
                score
            }
        };
        searched += 1;

        if ctx.aborted {
            return best_score.max(score);
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if ply == 0 {
                ctx.root_best = Some(mv);
            }
        }
        if score > alpha {
            alpha = score;
        }

        if alpha >= beta {
            if quiet {
                ctx.killers.store(ply, mv);
                ctx.history.reward(mv, depth);
            }
            break;
        }
    }

    let bound = if best_score <= original_alpha {
        Bound::UpperBound
    } else if best_score >= beta {
        Bound::LowerBound
    } else {
        Bound::Exact
    };
    let store_move = if bound == Bound::UpperBound {
        None
    } else {
        best_move
    };
    ctx.tt.store(key, depth, best_score, bound, store_move, ply);

    best_score
}

/// Quiescence search: resolve captures before trusting the evaluation.
///
/// Fail-hard: the result is clamped to `[alpha, beta]`.
pub(crate) fn quiesce(
    pos: &mut Position,
    mut alpha: i32,
    beta: i32,
    qdepth: u32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.nodes += 1;

    if ctx.check_stop() || qdepth >= MAX_QDEPTH {
        return evaluate(pos);
    }

    let stand_pat = evaluate(pos);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut picker = MovePicker::new_quiescence(pos);
    while let Some(mv) = picker.pick_next() {
        let score = {
            let mut child = pos.make(mv);
            -quiesce(&mut child, -beta, -alpha, qdepth + 1, ctx)
        };

        if ctx.aborted {
            return alpha;
        }
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

/// Principal variation from the transposition table.
///
/// Follows stored best moves from `pos`, stopping at a missing or illegal
/// move, a repeated key, or `max_len` moves.
pub fn extract_pv(pos: &Position, tt: &TranspositionTable, max_len: usize) -> Vec<Move> {
    let mut walk = pos.clone();
    let mut seen = HashSet::new();
    let mut pv = Vec::new();

    while pv.len() < max_len && seen.insert(walk.key()) {
        let Some(mv) = tt.best_move(walk.key()) else {
            break;
        };
        if !walk.board().legal(mv) {
            break;
        }
        walk.push(mv);
        pv.push(mv);
    }

    pv
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use crate::eval::MATE_VALUE;

    struct Harness {
        tt: TranspositionTable,
        killers: KillerTable,
        history: HistoryTable,
        control: SearchControl,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                tt: TranspositionTable::new(1),
                killers: KillerTable::new(),
                history: HistoryTable::new(),
                control: SearchControl::new_infinite(Arc::new(AtomicBool::new(false))),
            }
        }

        fn ctx(&mut self) -> SearchContext<'_> {
            SearchContext {
                nodes: 0,
                tt: &mut self.tt,
                killers: &mut self.killers,
                history: &mut self.history,
                control: &self.control,
                root_best: None,
                aborted: false,
            }
        }
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    /// Full-width minimax over the same leaves as `negamax`.
    fn minimax(pos: &mut Position, depth: i32, ply: usize, ctx: &mut SearchContext<'_>) -> i32 {
        if ply > 0
            && let Some(score) = terminal_score(pos, ply)
        {
            return score;
        }
        if depth == 0 {
            return quiesce(pos, -INF, INF, 0, ctx);
        }
        let mut best = -INF;
        for mv in pos.legal_moves() {
            let mut child = pos.make(mv);
            best = best.max(-minimax(&mut child, depth - 1, ply + 1, ctx));
        }
        best
    }

    #[test]
    fn alpha_beta_matches_minimax_at_depth_3() {
        for fen in [
            "4k3/8/3p4/2p5/3P4/2N5/8/4K2R w K - 0 30",
            "r3k3/1p3p2/p1n5/4p3/2B5/5N2/PP3PPP/3R2K1 b q - 0 25",
        ] {
            let mut p = pos(fen);

            let mut plain = Harness::new();
            let expected = minimax(&mut p, 3, 0, &mut plain.ctx());

            let mut pruned = Harness::new();
            let got = negamax(&mut p, 3, 0, -INF, INF, true, &mut pruned.ctx());

            assert_eq!(got, expected, "{fen}");
        }
    }

    #[test]
    fn search_leaves_position_unchanged() {
        let mut p = pos("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        let before = p.clone();
        let mut h = Harness::new();
        negamax(&mut p, 4, 0, -INF, INF, true, &mut h.ctx());
        assert_eq!(p, before);
    }

    #[test]
    fn mate_in_one_scores_mate_at_ply_one() {
        let mut p = pos("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let score = negamax(&mut p, 2, 0, -INF, INF, true, &mut ctx);
        assert_eq!(score, MATE_VALUE - 1);
        assert_eq!(ctx.root_best.map(|m| m.to_string()), Some("a1a8".into()));
    }

    #[test]
    fn mated_child_scores_from_its_ply() {
        let mut p = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        let mut h = Harness::new();
        let score = negamax(&mut p, 3, 2, -INF, INF, true, &mut h.ctx());
        assert_eq!(score, -MATE_VALUE + 2);
    }

    #[test]
    fn stalemate_below_root_is_zero() {
        let mut p = pos("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
        let mut h = Harness::new();
        assert_eq!(negamax(&mut p, 3, 1, -INF, INF, true, &mut h.ctx()), 0);
    }

    #[test]
    fn quiescence_sees_hanging_piece() {
        // White to move can take the undefended rook.
        let mut p = pos("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 40");
        let mut h = Harness::new();
        let stand_pat = evaluate(&p);
        let q = quiesce(&mut p, -INF, INF, 0, &mut h.ctx());
        assert!(q > stand_pat + 300, "q {q} stand pat {stand_pat}");
    }

    #[test]
    fn quiescence_is_fail_hard() {
        let mut p = pos("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 40");
        let mut h = Harness::new();
        assert_eq!(quiesce(&mut p, -50, 50, 0, &mut h.ctx()), 50);
    }

    #[test]
    fn quiescence_depth_cap_returns_static_eval() {
        let mut p = pos("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 40");
        let mut h = Harness::new();
        let q = quiesce(&mut p, -INF, INF, MAX_QDEPTH, &mut h.ctx());
        assert_eq!(q, evaluate(&p));
    }

    #[test]
    fn null_move_skipped_without_pieces() {
        let p = pos("4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 30");
        assert!(!has_non_pawn_material(&p));
        let p = pos("4k3/pppp4/8/8/8/8/PPPP4/4KN2 w - - 0 30");
        assert!(has_non_pawn_material(&p));
    }

    #[test]
    fn promotion_cutoff_is_remembered() {
        let mut p = pos("8/P6k/8/8/8/8/8/K7 w - - 0 1");
        let promote = p.parse_uci_move("a7a8q").unwrap();
        let mut h = Harness::new();
        let score = {
            let mut ctx = h.ctx();
            negamax(&mut p, 2, 0, -INF, 0, true, &mut ctx)
        };
        assert!(score >= 0);
        assert!(h.killers.is_killer(0, promote));
        assert_eq!(h.history.score(promote), 4);
    }

    #[test]
    fn aborted_search_sets_flag() {
        let mut h = Harness::new();
        h.control.stop();
        let mut p = Position::startpos();
        let mut ctx = h.ctx();
        negamax(&mut p, 5, 0, -INF, INF, true, &mut ctx);
        assert!(ctx.aborted);
        assert_eq!(ctx.root_best, None);
    }

    #[test]
    fn pv_is_legal_and_starts_with_root_move() {
        let mut p = Position::startpos();
        let mut h = Harness::new();
        let root_best = {
            let mut ctx = h.ctx();
            negamax(&mut p, 4, 0, -INF, INF, true, &mut ctx);
            ctx.root_best
        };
        let pv = extract_pv(&p, &h.tt, 4);
        assert!(!pv.is_empty());
        assert_eq!(Some(pv[0]), root_best);

        let mut walk = p.clone();
        for mv in pv {
            assert!(walk.board().legal(mv));
            walk.push(mv);
        }
    }

    #[test]
    fn pv_extraction_stops_on_cycle() {
        let p = Position::startpos();
        let mut tt = TranspositionTable::new(1);
        let mut walk = p.clone();
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = walk.parse_uci_move(uci).unwrap();
            tt.store(walk.key(), 1, 0, Bound::Exact, Some(mv), 0);
            walk.push(mv);
        }
        assert_eq!(extract_pv(&p, &tt, 64).len(), 4);
    }
}
