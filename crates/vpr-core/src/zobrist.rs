//! Zobrist keys for transposition lookups and repetition detection.
//!
//! Keys are generated at compile time from a fixed xorshift64 seed, so a
//! position hashes to the same value on every run and every machine.

use chess::{ALL_PIECES, Board, Color};

/// Full key table, laid out in generation order.
struct Keys {
    /// Indexed by `[color * 6 + piece][square]`.
    pieces: [[u64; 64]; 12],
    black_to_move: u64,
    /// White king-side, White queen-side, Black king-side, Black queen-side.
    castling: [u64; 4],
    /// Indexed by the file of the en-passant square.
    en_passant: [u64; 8],
}

const SEED: u64 = 0x5a4f_4252_4953_5421; // "ZOBRIST!"

/// Xorshift64 PRNG. Returns (value, next_state).
const fn xorshift64(mut state: u64) -> (u64, u64) {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    (state, state)
}

static KEYS: Keys = {
    let mut keys = Keys {
        pieces: [[0; 64]; 12],
        black_to_move: 0,
        castling: [0; 4],
        en_passant: [0; 8],
    };
    let mut state = SEED;

    let mut piece = 0;
    while piece < 12 {
        let mut sq = 0;
        while sq < 64 {
            let (val, next) = xorshift64(state);
            keys.pieces[piece][sq] = val;
            state = next;
            sq += 1;
        }
        piece += 1;
    }

    let (val, next) = xorshift64(state);
    keys.black_to_move = val;
    state = next;

    let mut i = 0;
    while i < 4 {
        let (val, next) = xorshift64(state);
        keys.castling[i] = val;
        state = next;
        i += 1;
    }

    let mut file = 0;
    while file < 8 {
        let (val, next) = xorshift64(state);
        keys.en_passant[file] = val;
        state = next;
        file += 1;
    }

    keys
};

/// Compute the Zobrist key of `board` from scratch.
///
/// Covers piece placement, side to move, each held castling right and the
/// file of a capturable en-passant pawn.
pub fn hash(board: &Board) -> u64 {
    let mut key = 0u64;

    for color in [Color::White, Color::Black] {
        let side = *board.color_combined(color);
        for piece in ALL_PIECES {
            for sq in *board.pieces(piece) & side {
                key ^= KEYS.pieces[color.to_index() * 6 + piece.to_index()][sq.to_index()];
            }
        }

        let rights = board.castle_rights(color);
        if rights.has_kingside() {
            key ^= KEYS.castling[color.to_index() * 2];
        }
        if rights.has_queenside() {
            key ^= KEYS.castling[color.to_index() * 2 + 1];
        }
    }

    if board.side_to_move() == Color::Black {
        key ^= KEYS.black_to_move;
    }

    if let Some(sq) = board.en_passant() {
        key ^= KEYS.en_passant[sq.get_file().to_index()];
    }

    key
}
