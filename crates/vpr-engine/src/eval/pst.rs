//! Piece-square tables.
//!
//! Tables are written as seen from White's side of the board: the first row
//! is rank 8, the last row rank 1. Black squares are mirrored vertically.

use vpr_core::{Color, Piece, Position, Square};

use crate::eval::score::{S, Score};

#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
    50,  50,  50,  50,  50,  50,  50,  50,
    10,  10,  20,  30,  30,  20,  10,  10,
     5,   5,  10,  25,  25,  10,   5,   5,
     0,   0,   0,  20,  20,   0,   0,   0,
     5,  -5, -10,   0,   0, -10,  -5,   5,
     5,  10,  10, -20, -20,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
    90,  90,  90,  90,  90,  90,  90,  90,
    50,  50,  50,  50,  50,  50,  50,  50,
    30,  30,  30,  30,  30,  30,  30,  30,
    15,  15,  15,  15,  15,  15,  15,  15,
     5,   5,   5,   5,   5,   5,   5,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
     5,  10,  10,  10,  10,  10,  10,   5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,   5,   5,   5,   0, -10,
    -5,   0,   5,   5,   5,   5,   0,  -5,
     0,   0,   5,   5,   5,   5,   0,  -5,
   -10,   5,   5,   5,   5,   5,   0, -10,
   -10,   0,   5,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -10, -20, -20, -20, -20, -20, -20, -10,
    20,  20,   0,   0,   0,   0,  20,  20,
    20,  30,  10,   0,   0,  10,  30,  20,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
   -50, -40, -30, -20, -20, -30, -40, -50,
   -30, -20, -10,   0,   0, -10, -20, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -30,   0,   0,   0,   0, -30, -30,
   -50, -30, -30, -30, -30, -30, -30, -50,
];

/// Table index of `sq` for a piece of `color`.
#[inline]
fn table_index(sq: Square, color: Color) -> usize {
    let file = sq.get_file().to_index();
    let rank = sq.get_rank().to_index();
    match color {
        Color::White => (7 - rank) * 8 + file,
        Color::Black => rank * 8 + file,
    }
}

/// Positional value of `piece` of `color` standing on `sq`.
pub fn pst_value(piece: Piece, color: Color, sq: Square) -> Score {
    let i = table_index(sq, color);
    match piece {
        Piece::Pawn => S(PAWN_MG[i], PAWN_EG[i]),
        Piece::Knight => S(KNIGHT[i], KNIGHT[i]),
        Piece::Bishop => S(BISHOP[i], BISHOP[i]),
        Piece::Rook => S(ROOK[i], ROOK[i]),
        Piece::Queen => S(QUEEN[i], QUEEN[i]),
        Piece::King => S(KING_MG[i], KING_EG[i]),
    }
}

/// Sum of piece-square values, White minus Black.
pub fn pst(pos: &Position) -> Score {
    let board = pos.board();
    let mut score = Score::ZERO;
    for sq in *board.combined() {
        let Some((piece, color)) = pos.piece_at(sq) else {
            continue;
        };
        match color {
            Color::White => score += pst_value(piece, color, sq),
            Color::Black => score = score - pst_value(piece, color, sq),
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_str(name).unwrap()
    }

    #[test]
    fn starting_position_is_symmetric() {
        assert_eq!(pst(&Position::startpos()), Score::ZERO);
    }

    #[test]
    fn mirrored_squares_match() {
        assert_eq!(
            pst_value(Piece::Knight, Color::White, sq("f3")),
            pst_value(Piece::Knight, Color::Black, sq("f6"))
        );
        assert_eq!(
            pst_value(Piece::King, Color::White, sq("g1")),
            pst_value(Piece::King, Color::Black, sq("g8"))
        );
    }

    #[test]
    fn advanced_pawns_are_worth_more() {
        let seventh = pst_value(Piece::Pawn, Color::White, sq("e7"));
        let third = pst_value(Piece::Pawn, Color::White, sq("e3"));
        assert!(seventh.mg > third.mg);
        assert!(seventh.eg > third.eg);
    }

    #[test]
    fn central_knight_beats_rim_knight() {
        let centre = pst_value(Piece::Knight, Color::White, sq("d4"));
        let rim = pst_value(Piece::Knight, Color::White, sq("a4"));
        assert!(centre.mg > rim.mg);
    }
}
