//! Game phase: a coarse label for policy decisions and a material count for
//! tapering the evaluation.

use vpr_core::{Color, Piece, Position};

/// Maximum material phase, a full complement of non-pawn material.
///
/// Weights: Knight=1, Bishop=1, Rook=2, Queen=4.
/// Starting totals: 4×1 + 4×1 + 4×2 + 2×4 = 24.
pub const MAX_PHASE: i32 = 24;

/// Full-move number from which a game is no longer in the opening.
const OPENING_LAST_MOVE: u32 = 11;

/// Non-pawn, non-king piece count (both sides) at or below which a position
/// counts as an endgame once past the first moves.
const ENDGAME_PIECES: u32 = 5;

/// Full-move number from which [`ENDGAME_PIECES`] applies.
const ENDGAME_FROM_MOVE: u32 = 10;

/// Material phase at or below which a position is an endgame at any move.
const ENDGAME_PHASE: i32 = 4;

/// Coarse stage of the game, used by time allocation and the trade policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

impl GamePhase {
    /// Classify a position from its move number and remaining material.
    pub fn detect(pos: &Position) -> GamePhase {
        let pieces: u32 = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .into_iter()
            .map(|piece| pos.count(piece, Color::White) + pos.count(piece, Color::Black))
            .sum();
        let move_number = pos.fullmove_number();

        if material_phase(pos) <= ENDGAME_PHASE
            || (pieces <= ENDGAME_PIECES && move_number >= ENDGAME_FROM_MOVE)
        {
            GamePhase::Endgame
        } else if move_number <= OPENING_LAST_MOVE {
            GamePhase::Opening
        } else {
            GamePhase::Middlegame
        }
    }
}

/// Calculate the material phase from non-pawn, non-king material.
///
/// Returns a value in `0..=MAX_PHASE`; promoted pieces cannot push it above
/// the maximum.
pub fn material_phase(pos: &Position) -> i32 {
    let weighted = |piece: Piece, weight: i32| {
        (pos.count(piece, Color::White) + pos.count(piece, Color::Black)) as i32 * weight
    };

    let phase = weighted(Piece::Knight, 1)
        + weighted(Piece::Bishop, 1)
        + weighted(Piece::Rook, 2)
        + weighted(Piece::Queen, 4);
    phase.min(MAX_PHASE)
}
