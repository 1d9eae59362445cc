//! Game position with an undo stack.
//!
//! [`Position`] wraps a [`chess::Board`] and adds what the rules library does
//! not track: halfmove/fullmove counters, the move history needed for
//! repetition detection, and a cached Zobrist key per frame. Moves are applied
//! with [`Position::push`] and taken back with [`Position::pop`]; search code
//! uses [`Position::make`], whose guard pops on drop so that no exit path can
//! leave a move applied.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use chess::{BitBoard, Board, BoardStatus, ChessMove, Color, EMPTY, MoveGen, Piece, Square};
use tracing::debug;

use crate::error::{FenError, PositionError};
use crate::zobrist;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Legal moves of a position, in generation order.
pub type MoveList = Vec<ChessMove>;

/// Why a game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The side to move is checkmated.
    Checkmate,
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side can possibly deliver mate.
    InsufficientMaterial,
    /// 100 halfmoves without a capture or pawn move.
    FiftyMoveRule,
    /// The position occurred for the third time.
    Repetition,
}

impl Outcome {
    /// Every outcome except checkmate is a draw.
    pub fn is_draw(self) -> bool {
        self != Outcome::Checkmate
    }
}

/// One entry of the move stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    board: Board,
    key: u64,
    halfmove: u32,
    fullmove: u32,
    /// Move that produced this frame; `None` for the root or a null move.
    last_move: Option<ChessMove>,
}

impl Frame {
    fn new(board: Board, halfmove: u32, fullmove: u32, last_move: Option<ChessMove>) -> Self {
        Self {
            key: zobrist::hash(&board),
            board,
            halfmove,
            fullmove,
            last_move,
        }
    }
}

/// A chess position plus the stack of positions that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    current: Frame,
    history: Vec<Frame>,
}

impl Position {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self {
            current: Frame::new(Board::default(), 0, 1, None),
            history: Vec::new(),
        }
    }

    /// Parse a FEN string.
    ///
    /// The four board fields are mandatory; the halfmove clock and fullmove
    /// number default to `0` and `1` when absent.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let halfmove = parse_counter(fields.get(4), "halfmove clock", 0)?;
        let fullmove = parse_counter(fields.get(5), "fullmove number", 1)?.max(1);

        let placement = fields[..4].join(" ");
        let board = Board::from_str(&format!("{placement} 0 1")).map_err(|e| {
            FenError::Rejected {
                fen: placement.clone(),
                reason: format!("{e:?}"),
            }
        })?;

        debug!(fen = %placement, halfmove, fullmove, "position set up from FEN");
        Ok(Self {
            current: Frame::new(board, halfmove, fullmove, None),
            history: Vec::new(),
        })
    }

    // ── Move stack ──────────────────────────────────────────────────────────

    /// Apply a legal move.
    pub fn push(&mut self, mv: ChessMove) {
        let before = self.current.board;
        let resets_clock =
            before.piece_on(mv.get_source()) == Some(Piece::Pawn) || self.is_capture(mv);
        let halfmove = if resets_clock {
            0
        } else {
            self.current.halfmove + 1
        };
        let fullmove = self.current.fullmove + u32::from(before.side_to_move() == Color::Black);

        let next = Frame::new(before.make_move_new(mv), halfmove, fullmove, Some(mv));
        self.history.push(std::mem::replace(&mut self.current, next));
    }

    /// Pass the turn to the opponent. Refused (returns `false`) when in check.
    pub fn push_null(&mut self) -> bool {
        let Some(board) = self.current.board.null_move() else {
            return false;
        };
        let fullmove =
            self.current.fullmove + u32::from(self.current.board.side_to_move() == Color::Black);
        let next = Frame::new(board, self.current.halfmove + 1, fullmove, None);
        self.history.push(std::mem::replace(&mut self.current, next));
        true
    }

    /// Take back the most recent push.
    ///
    /// Returns the move that was undone, or `None` if it was a null move.
    pub fn pop(&mut self) -> Result<Option<ChessMove>, PositionError> {
        let previous = self.history.pop().ok_or(PositionError::EmptyStack)?;
        let undone = std::mem::replace(&mut self.current, previous);
        Ok(undone.last_move)
    }

    /// Apply `mv` for the lifetime of the returned guard.
    pub fn make(&mut self, mv: ChessMove) -> MoveGuard<'_> {
        self.push(mv);
        MoveGuard { pos: self }
    }

    /// Apply a null move for the lifetime of the returned guard.
    pub fn make_null(&mut self) -> Option<MoveGuard<'_>> {
        if self.push_null() {
            Some(MoveGuard { pos: self })
        } else {
            None
        }
    }

    /// Number of moves (including null moves) on the stack.
    pub fn stack_len(&self) -> usize {
        self.history.len()
    }

    /// Move that produced the current position, if any.
    pub fn last_move(&self) -> Option<ChessMove> {
        self.current.last_move
    }

    /// Parse a move in UCI long algebraic notation (`e2e4`, `e7e8q`).
    ///
    /// Only moves legal in the current position are accepted.
    pub fn parse_uci_move(&self, text: &str) -> Result<ChessMove, PositionError> {
        let wanted = text.trim().to_ascii_lowercase();
        MoveGen::new_legal(&self.current.board)
            .find(|mv| mv.to_string() == wanted)
            .ok_or_else(|| PositionError::IllegalMove {
                uci: text.to_string(),
                fen: self.to_fen(),
            })
    }

    /// Apply a sequence of UCI moves. On error the position is left unchanged.
    pub fn apply_uci_moves<I, S>(&mut self, moves: I) -> Result<(), PositionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scratch = self.clone();
        for text in moves {
            let mv = scratch.parse_uci_move(text.as_ref())?;
            scratch.push(mv);
        }
        *self = scratch;
        Ok(())
    }

    // ── Move queries ────────────────────────────────────────────────────────

    /// All legal moves.
    pub fn legal_moves(&self) -> MoveList {
        MoveGen::new_legal(&self.current.board).collect()
    }

    /// Legal captures, including en passant and capturing promotions.
    pub fn capture_moves(&self) -> MoveList {
        let targets = *self.current.board.color_combined(!self.side_to_move());
        let mut movegen = MoveGen::new_legal(&self.current.board);
        let mut moves: MoveList = Vec::new();
        movegen.set_iterator_mask(targets);
        moves.extend(&mut movegen);
        if let Some(ep) = self.en_passant_target() {
            movegen.set_iterator_mask(BitBoard::from_square(ep));
            moves.extend(movegen.filter(|mv| self.is_en_passant(*mv)));
        }
        moves
    }

    /// Square a pawn lands on when capturing en passant, if one is available.
    fn en_passant_target(&self) -> Option<Square> {
        let pawn = self.current.board.en_passant()?;
        match self.side_to_move() {
            Color::White => pawn.up(),
            Color::Black => pawn.down(),
        }
    }

    /// Whether `mv` captures a piece.
    pub fn is_capture(&self, mv: ChessMove) -> bool {
        self.current.board.piece_on(mv.get_dest()).is_some() || self.is_en_passant(mv)
    }

    /// Whether `mv` is an en-passant capture (a pawn moving diagonally to an empty square).
    pub fn is_en_passant(&self, mv: ChessMove) -> bool {
        let board = &self.current.board;
        board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file()
            && board.piece_on(mv.get_dest()).is_none()
    }

    /// Piece standing on the origin square of `mv`.
    pub fn moving_piece(&self, mv: ChessMove) -> Option<Piece> {
        self.current.board.piece_on(mv.get_source())
    }

    /// Piece removed by `mv`, if it is a capture.
    pub fn captured_piece(&self, mv: ChessMove) -> Option<Piece> {
        if self.is_en_passant(mv) {
            Some(Piece::Pawn)
        } else {
            self.current.board.piece_on(mv.get_dest())
        }
    }

    // ── Board queries ───────────────────────────────────────────────────────

    /// Underlying rules-library board.
    pub fn board(&self) -> &Board {
        &self.current.board
    }

    /// Zobrist key of the current position.
    pub fn key(&self) -> u64 {
        self.current.key
    }

    pub fn side_to_move(&self) -> Color {
        self.current.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.current.halfmove
    }

    pub fn fullmove_number(&self) -> u32 {
        self.current.fullmove
    }

    /// Piece and owner on `sq`.
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        let board = &self.current.board;
        Some((board.piece_on(sq)?, board.color_on(sq)?))
    }

    /// Squares of `color`'s pieces that attack `sq`, ignoring pins.
    pub fn attackers(&self, sq: Square, color: Color) -> BitBoard {
        let board = &self.current.board;
        let occupied = *board.combined();
        let queens = *board.pieces(Piece::Queen);

        let attackers = (chess::get_knight_moves(sq) & *board.pieces(Piece::Knight))
            | (chess::get_king_moves(sq) & *board.pieces(Piece::King))
            | (chess::get_rook_moves(sq, occupied) & (*board.pieces(Piece::Rook) | queens))
            | (chess::get_bishop_moves(sq, occupied) & (*board.pieces(Piece::Bishop) | queens))
            | chess::get_pawn_attacks(sq, !color, *board.pieces(Piece::Pawn));

        attackers & *board.color_combined(color)
    }

    /// Number of `color`'s pieces of kind `piece`.
    pub fn count(&self, piece: Piece, color: Color) -> u32 {
        (*self.current.board.pieces(piece) & *self.current.board.color_combined(color)).popcnt()
    }

    // ── Game state ──────────────────────────────────────────────────────────

    pub fn is_check(&self) -> bool {
        *self.current.board.checkers() != EMPTY
    }

    pub fn is_checkmate(&self) -> bool {
        self.current.board.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.current.board.status() == BoardStatus::Stalemate
    }

    /// Neither side has mating material: bare kings, a single minor piece, or
    /// only bishops that all stand on squares of one colour.
    pub fn is_insufficient_material(&self) -> bool {
        let board = &self.current.board;
        let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }

        const DARK_SQUARES: BitBoard = BitBoard(0xAA55_AA55_AA55_AA55);
        (bishops & DARK_SQUARES) == EMPTY || (bishops & !DARK_SQUARES) == EMPTY
    }

    /// The fifty-move rule applies (and the side to move is not mated).
    pub fn is_fifty_move_draw(&self) -> bool {
        self.current.halfmove >= 100 && !self.is_checkmate()
    }

    /// The current position occurred at least twice before with the same
    /// side to move and rights.
    pub fn is_repetition(&self) -> bool {
        let key = self.current.key;
        let reversible = self.current.halfmove as usize;
        self.history
            .iter()
            .rev()
            .take(reversible)
            .filter(|frame| frame.key == key)
            .count()
            >= 2
    }

    /// How the game ended, if it did.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.current.board.status() {
            BoardStatus::Checkmate => return Some(Outcome::Checkmate),
            BoardStatus::Stalemate => return Some(Outcome::Stalemate),
            BoardStatus::Ongoing => {}
        }
        if self.is_insufficient_material() {
            Some(Outcome::InsufficientMaterial)
        } else if self.is_fifty_move_draw() {
            Some(Outcome::FiftyMoveRule)
        } else if self.is_repetition() {
            Some(Outcome::Repetition)
        } else {
            None
        }
    }

    /// FEN of the current position, including the real move counters.
    pub fn to_fen(&self) -> String {
        let rendered = self.current.board.to_string();
        let board_fields: Vec<&str> = rendered.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            board_fields.join(" "),
            self.current.halfmove,
            self.current.fullmove
        )
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

fn parse_counter(field: Option<&&str>, name: &'static str, default: u32) -> Result<u32, FenError> {
    match field {
        None => Ok(default),
        Some(text) => text.parse().map_err(|_| FenError::InvalidMoveCounter {
            field: name,
            found: text.to_string(),
        }),
    }
}

/// A move applied to a [`Position`] that is taken back when the guard drops.
///
/// Dereferences to the position so the child node can be searched through it.
pub struct MoveGuard<'a> {
    pos: &'a mut Position,
}

impl Deref for MoveGuard<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.pos
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        self.pos
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        // The guard pushed exactly one frame, so the stack cannot be empty.
        let _ = self.pos.pop();
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
