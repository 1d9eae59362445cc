//! Static Exchange Evaluation (SEE).
//!
//! Plays out the capture sequence on one square on the real position, each
//! side recapturing with its least valuable piece, then folds the list of
//! captured values back to the material outcome for the initial mover.

use vpr_core::{Move, Piece, Position, Rank, Square};

use crate::eval::material::value;

/// Upper bound on exchanges on one square (32 pieces on the board).
const MAX_EXCHANGES: usize = 32;

/// Recapture order, cheapest first.
const BY_VALUE: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

/// Material outcome of `mv` for the side making it.
///
/// Non-captures return 0. The initial capture is forced; every recapture
/// after it is made only if it pays off. The position is identical before
/// and after the call.
pub fn see(pos: &mut Position, mv: Move) -> i32 {
    let Some(victim) = pos.captured_piece(mv) else {
        return 0;
    };

    let mut gains = Vec::with_capacity(MAX_EXCHANGES);
    gains.push(value(victim));
    play_out(pos, mv, mv.get_dest(), &mut gains);

    // gains[i] = value captured by the i-th capture. Resolve backwards: a
    // recapture is only made if it beats standing pat.
    let mut tail = 0;
    for &gain in gains[1..].iter().rev() {
        tail = (gain - tail).max(0);
    }
    gains[0] - tail
}

/// Push `mv`, then recurse on the cheapest legal recapture on `target`.
fn play_out(pos: &mut Position, mv: Move, target: Square, gains: &mut Vec<i32>) {
    let mut child = pos.make(mv);
    if gains.len() >= MAX_EXCHANGES {
        return;
    }
    let Some(reply) = cheapest_recapture(&child, target) else {
        return;
    };
    let Some((on_target, _)) = child.piece_at(target) else {
        return;
    };
    gains.push(value(on_target));
    play_out(&mut child, reply, target, gains);
}

/// Cheapest legal capture on `target` by the side to move.
fn cheapest_recapture(pos: &Position, target: Square) -> Option<Move> {
    let attackers = pos.attackers(target, pos.side_to_move());
    let board = pos.board();
    let promotes = target.get_rank() == Rank::First || target.get_rank() == Rank::Eighth;

    BY_VALUE.iter().find_map(|&piece| {
        (attackers & *board.pieces(piece))
            .map(|from| {
                let promotion = (piece == Piece::Pawn && promotes).then_some(Piece::Queen);
                Move::new(from, target, promotion)
            })
            .find(|candidate| board.legal(*candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(fen: &str, uci: &str) -> (Position, Move) {
        let pos = Position::from_fen(fen).unwrap();
        let mv = pos.parse_uci_move(uci).unwrap();
        (pos, mv)
    }

    #[test]
    fn pawn_takes_undefended_pawn() {
        let (mut pos, mv) = setup("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5");
        assert_eq!(see(&mut pos, mv), 100);
    }

    #[test]
    fn pawn_takes_pawn_defended_by_pawn() {
        let (mut pos, mv) = setup("4k3/8/4p3/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5");
        assert_eq!(see(&mut pos, mv), 0);
    }

    #[test]
    fn pawn_takes_pawn_defended_by_queen() {
        let (mut pos, mv) = setup(
            "rnbqkbnr/ppp2ppp/8/3pp3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3",
            "e4d5",
        );
        assert_eq!(see(&mut pos, mv), 0);
    }

    #[test]
    fn queen_takes_rook_defended_by_pawn() {
        let (mut pos, mv) = setup("4k3/8/2p5/3r4/8/8/3Q4/4K3 w - - 0 1", "d2d5");
        assert_eq!(see(&mut pos, mv), 500 - 900);
    }

    #[test]
    fn pawn_takes_defended_knight() {
        let (mut pos, mv) = setup("4k3/8/4p3/3n4/4P3/8/8/4K3 w - - 0 1", "e4d5");
        assert_eq!(see(&mut pos, mv), 300 - 100);
    }

    #[test]
    fn xray_backup_wins_the_exchange() {
        // Rd2xd5, rd8xd5, Rd1xd5.
        let (mut pos, mv) = setup("3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1", "d2d5");
        assert_eq!(see(&mut pos, mv), 100);
    }

    #[test]
    fn en_passant_uses_pawn_value() {
        let (mut pos, mv) = setup("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5d6");
        assert_eq!(see(&mut pos, mv), 100);
    }

    #[test]
    fn quiet_move_is_zero() {
        let (mut pos, mv) = setup("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e1d1");
        assert_eq!(see(&mut pos, mv), 0);
    }

    #[test]
    fn king_cannot_recapture_into_protection() {
        // Qxe7 is defended only by the king, but the queen is backed by the e1 rook.
        let (mut pos, mv) = setup("4k3/4p3/8/8/8/8/4Q3/4RK2 w - - 0 1", "e2e7");
        assert_eq!(see(&mut pos, mv), 100);
    }

    #[test]
    fn position_is_unchanged() {
        let (mut pos, mv) = setup("3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1", "d2d5");
        let before = pos.clone();
        see(&mut pos, mv);
        assert_eq!(pos, before);
    }
}
