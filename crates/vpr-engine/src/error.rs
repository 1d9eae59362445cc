//! Errors raised by the engine facade.

use vpr_core::{FenError, PositionError};

/// Errors from setting up the engine's position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The FEN could not be parsed.
    #[error(transparent)]
    Fen(#[from] FenError),

    /// A move in the move list is not legal where it is played.
    #[error(transparent)]
    Move(#[from] PositionError),
}
