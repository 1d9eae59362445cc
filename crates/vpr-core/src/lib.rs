//! Position oracle for vpr: rules from the `chess` crate, plus a move stack,
//! game counters, draw detection and reproducible Zobrist keys.

mod error;
mod position;
pub mod zobrist;

pub use chess::{BitBoard, Board, ChessMove as Move, Color, File, Piece, Rank, Square};
pub use error::{FenError, PositionError};
pub use position::{MoveGuard, MoveList, Outcome, Position, STARTING_FEN};
