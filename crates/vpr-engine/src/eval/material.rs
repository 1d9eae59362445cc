//! Material balance with a dynamic bishop value.
//!
//! All scores are returned from White's perspective (positive = White ahead).

use vpr_core::{Color, Piece, Position};

/// Base material values indexed by `Piece::to_index()` (Pawn..King).
pub const PIECE_VALUE: [i32; 6] = [100, 300, 325, 500, 900, 0];

/// Bonus per bishop for a side that still owns the pair.
const BISHOP_PAIR_BONUS: i32 = 25;

/// Penalty for a side left with a single bishop.
const LONE_BISHOP_PENALTY: i32 = 50;

/// Bonus per non-king piece, so that equal material favours keeping pieces.
const PIECE_PRESENCE_BONUS: i32 = 5;

/// Value of a piece kind in centipawns.
#[inline]
pub fn value(piece: Piece) -> i32 {
    PIECE_VALUE[piece.to_index()]
}

/// Material owned by `color`, including the bishop adjustment.
pub fn side_material(pos: &Position, color: Color) -> i32 {
    let mut total = 0;
    for piece in [Piece::Pawn, Piece::Knight, Piece::Rook, Piece::Queen] {
        total += pos.count(piece, color) as i32 * value(piece);
    }

    let bishops = pos.count(Piece::Bishop, color) as i32;
    let bishop_value = match bishops {
        1 => value(Piece::Bishop) - LONE_BISHOP_PENALTY,
        2 => value(Piece::Bishop) + BISHOP_PAIR_BONUS,
        _ => value(Piece::Bishop),
    };
    total + bishops * bishop_value
}

/// Material balance, White minus Black.
pub fn material(pos: &Position) -> i32 {
    let pieces = |color| -> i32 {
        [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .into_iter()
            .map(|piece| pos.count(piece, color) as i32)
            .sum()
    };

    side_material(pos, Color::White) - side_material(pos, Color::Black)
        + (pieces(Color::White) - pieces(Color::Black)) * PIECE_PRESENCE_BONUS
}

/// Material lead of `color` over its opponent, without the presence bonus.
pub fn lead(pos: &Position, color: Color) -> i32 {
    side_material(pos, color) - side_material(pos, !color)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(material(&Position::startpos()), 0);
    }

    #[test]
    fn missing_black_queen() {
        let p = pos("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(material(&p), 900 + PIECE_PRESENCE_BONUS);
    }

    #[test]
    fn pair_versus_lone_bishop() {
        // White keeps both bishops, Black lost the f8 bishop.
        let p = pos("rnbqk1nr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let white_bishops = 2 * (325 + BISHOP_PAIR_BONUS);
        let black_bishop = 325 - LONE_BISHOP_PENALTY;
        assert_eq!(
            material(&p),
            white_bishops - black_bishop + PIECE_PRESENCE_BONUS
        );
    }

    #[test]
    fn lead_is_antisymmetric() {
        let p = pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(lead(&p, Color::White), 500);
        assert_eq!(lead(&p, Color::Black), -500);
    }
}
