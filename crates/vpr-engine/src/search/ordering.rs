//! Move ordering.
//!
//! Each legal move gets a score from a fixed band hierarchy and a
//! selection-sort picker yields them best first:
//!
//! | Band           | Score                          |
//! |----------------|--------------------------------|
//! | TT move        | 1,000,000                      |
//! | Mating move    | 900,000                        |
//! | Check          | 500,000                        |
//! | Good capture   | 400,000 + MVV-LVA              |
//! | Bad capture    | 350,000 + MVV-LVA              |
//! | Killer         | 300,000                        |
//! | Promotion      | 200,000 + promoted value       |
//! | Pawn advance   | 100,000 + 1,000 × relative rank |
//! | Quiet          | history (< 100,000)            |
//!
//! Captures are split into good and bad by [`TradePolicy`] on their SEE value.

use vpr_core::{Color, Move, Piece, Position};

use crate::eval::material::value;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::see::see;
use crate::search::trade::TradePolicy;

const TT_MOVE: i32 = 1_000_000;
const MATE: i32 = 900_000;
const CHECK: i32 = 500_000;
const GOOD_CAPTURE: i32 = 400_000;
const BAD_CAPTURE: i32 = 350_000;
const KILLER: i32 = 300_000;
const PROMOTION: i32 = 200_000;
const PAWN_ADVANCE: i32 = 100_000;

/// Relative rank index (0-based) from which a pawn push counts as an advance.
const ADVANCE_FROM_RANK: usize = 5;

/// Most valuable victim, least valuable attacker: `victim × 10 − attacker`.
pub fn mvv_lva(pos: &Position, mv: Move) -> i32 {
    let victim = pos.captured_piece(mv).map_or(0, value);
    let attacker = pos.moving_piece(mv).map_or(0, value);
    victim * 10 - attacker
}

/// Ordering context for quiet moves.
pub struct OrderingHints<'a> {
    pub tt_move: Option<Move>,
    pub killers: &'a KillerTable,
    pub history: &'a HistoryTable,
    pub ply: usize,
}

/// Score one move of `pos` for the main search.
fn score_move(pos: &mut Position, mv: Move, policy: TradePolicy, hints: &OrderingHints<'_>) -> i32 {
    if hints.tt_move == Some(mv) {
        return TT_MOVE;
    }

    {
        let child = pos.make(mv);
        if child.is_checkmate() {
            return MATE;
        }
        if child.is_check() {
            return CHECK;
        }
    }

    if pos.is_capture(mv) {
        let band = if policy.accepts(see(pos, mv)) {
            GOOD_CAPTURE
        } else {
            BAD_CAPTURE
        };
        return band + mvv_lva(pos, mv);
    }

    if hints.killers.is_killer(hints.ply, mv) {
        return KILLER;
    }

    if let Some(promoted) = mv.get_promotion() {
        return PROMOTION + value(promoted);
    }

    if pos.moving_piece(mv) == Some(Piece::Pawn) {
        let rank = mv.get_dest().get_rank().to_index();
        let relative = match pos.side_to_move() {
            Color::White => rank,
            Color::Black => 7 - rank,
        };
        if relative >= ADVANCE_FROM_RANK {
            return PAWN_ADVANCE + relative as i32 * 1_000;
        }
    }

    hints.history.score(mv)
}

/// Incremental move picker using selection sort.
///
/// Yields every scored move exactly once, in descending score order.
pub struct MovePicker {
    moves: Vec<(Move, i32)>,
    cursor: usize,
}

impl MovePicker {
    /// Picker over all legal moves of `pos`, ordered by the band hierarchy.
    pub fn new(pos: &mut Position, hints: &OrderingHints<'_>) -> Self {
        let policy = TradePolicy::for_position(pos);
        let moves = pos
            .legal_moves()
            .into_iter()
            .map(|mv| (mv, score_move(pos, mv, policy, hints)))
            .collect();
        Self { moves, cursor: 0 }
    }

    /// Picker over the captures of `pos`, ordered by MVV-LVA.
    pub fn new_quiescence(pos: &Position) -> Self {
        let moves = pos
            .capture_moves()
            .into_iter()
            .map(|mv| (mv, mvv_lva(pos, mv)))
            .collect();
        Self { moves, cursor: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Yield the next highest-scored move.
    pub fn pick_next(&mut self) -> Option<Move> {
        if self.cursor >= self.moves.len() {
            return None;
        }

        let mut best = self.cursor;
        for i in (self.cursor + 1)..self.moves.len() {
            if self.moves[i].1 > self.moves[best].1 {
                best = i;
            }
        }

        self.moves.swap(self.cursor, best);
        let mv = self.moves[self.cursor].0;
        self.cursor += 1;
        Some(mv)
    }
}

/// All legal moves of `pos` in search order.
pub fn order_moves(pos: &mut Position, hints: &OrderingHints<'_>) -> Vec<Move> {
    let mut picker = MovePicker::new(pos, hints);
    std::iter::from_fn(|| picker.pick_next()).collect()
}
