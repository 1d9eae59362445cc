//! Error types for position setup and move input.

/// Errors that occur when parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// Fewer than the four mandatory fields (placement, side, castling, en passant).
    #[error("expected at least 4 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },

    /// A move counter (halfmove clock or fullmove number) is not a valid number.
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter {
        /// The field name ("halfmove clock" or "fullmove number").
        field: &'static str,
        /// The invalid string.
        found: String,
    },

    /// The rules library refused the board description.
    #[error("rejected FEN \"{fen}\": {reason}")]
    Rejected {
        /// The placement/side/castling/en-passant prefix that was rejected.
        fen: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised at the position boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The text is not a legal move in the current position.
    #[error("illegal move \"{uci}\" in position {fen}")]
    IllegalMove {
        /// The offending move text.
        uci: String,
        /// Position the move was checked against.
        fen: String,
    },

    /// `pop` was called with nothing on the move stack.
    #[error("no move to take back")]
    EmptyStack,
}
