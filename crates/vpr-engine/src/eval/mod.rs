//! Static evaluation.

pub mod material;
pub mod phase;
pub mod pst;
pub mod score;

use vpr_core::{Color, Outcome, Position};

use self::material::material;
use self::phase::material_phase;
use self::pst::pst;

/// Base score for checkmate; a mate found `ply` plies below the root scores
/// `-(MATE_VALUE - ply)` for the mated side.
pub const MATE_VALUE: i32 = 30_000;

/// Evaluate a position in centipawns from the side to move's perspective.
///
/// Material (with the dynamic bishop term) plus piece-square values tapered
/// by the remaining material. Does not look at game-over conditions; see
/// [`terminal_score`].
pub fn evaluate(pos: &Position) -> i32 {
    let white = material(pos) + pst(pos).taper(material_phase(pos));
    match pos.side_to_move() {
        Color::White => white,
        Color::Black => -white,
    }
}

/// Score of a finished game `ply` plies below the root, or `None` while play
/// continues. Checkmate prefers the shortest mate; every draw scores exactly 0.
pub fn terminal_score(pos: &Position, ply: usize) -> Option<i32> {
    pos.outcome().map(|outcome| match outcome {
        Outcome::Checkmate => -MATE_VALUE + ply as i32,
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn starting_position_is_zero() {
        assert_eq!(evaluate(&Position::startpos()), 0);
    }

    #[test]
    fn perspective_flips_with_side_to_move() {
        let white = pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let black = pos("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert!(evaluate(&white) > 400);
        assert_eq!(evaluate(&black), -evaluate(&white));
    }

    #[test]
    fn checkmate_scores_prefer_short_mates() {
        let mated = pos("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1");
        assert_eq!(terminal_score(&mated, 1), Some(-MATE_VALUE + 1));
        assert!(terminal_score(&mated, 1) < terminal_score(&mated, 3));
    }

    #[test]
    fn draws_score_zero() {
        let stalemate = pos("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
        assert_eq!(terminal_score(&stalemate, 4), Some(0));
        let bare = pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(terminal_score(&bare, 0), Some(0));
    }

    #[test]
    fn ongoing_game_has_no_terminal_score() {
        assert_eq!(terminal_score(&Position::startpos(), 0), None);
    }
}
