//! UCI command parsing.

use std::time::Duration;

use vpr_core::Color;
use vpr_engine::{Clock, PositionSpec};

use crate::error::UciError;

/// Largest accepted `Hash` value in megabytes.
pub const MAX_HASH_MB: usize = 65_536;

/// Largest accepted `MaxDepth` value.
pub const MAX_DEPTH: u32 = 100;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches until the depth limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Search to this depth only, ignoring the clock.
    pub depth: Option<u32>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search until `stop` (no time limit).
    pub infinite: bool,
}

impl GoParams {
    /// The clock of the side to move.
    pub fn clock_for(&self, side: Color) -> Clock {
        let (time_left, increment) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        Clock {
            time_left,
            increment: increment.unwrap_or(Duration::ZERO),
            movetime: self.movetime,
            infinite: self.infinite,
        }
    }
}

/// A `setoption` the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciOption {
    /// Transposition table size in megabytes.
    Hash(usize),
    /// Iterative-deepening ceiling.
    MaxDepth(u32),
}

/// A parsed `position` command; moves are checked when applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCommand {
    pub spec: PositionSpec,
    pub moves: Vec<String>,
}

/// A parsed UCI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `setoption name <id> value <x>`.
    SetOption(UciOption),
    /// `position` -- set up a board position with optional moves applied.
    Position(PositionCommand),
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command (silently ignored per UCI convention).
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "setoption" => parse_setoption(rest),
        "position" => parse_position(rest),
        "go" => parse_go(rest),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-fields> [moves e2e4 d7d5 ...]`
///
/// The FEN runs up to the `moves` keyword, so the move counters are optional.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens
        .iter()
        .position(|&t| t == "moves")
        .unwrap_or(tokens.len());
    let (setup, moves) = tokens.split_at(moves_at);

    let spec = match setup {
        ["startpos"] => PositionSpec::StartPos,
        ["fen", fen @ ..] if !fen.is_empty() => PositionSpec::Fen(fen.join(" ")),
        _ => return Err(UciError::MalformedPosition),
    };

    let moves = moves
        .iter()
        .skip(1)
        .map(|m| m.to_string())
        .collect();

    Ok(Command::Position(PositionCommand { spec, moves }))
}

/// Parse the `go` command arguments.
///
/// Supports: wtime, btime, winc, binc, depth, movetime, infinite.
/// Unknown tokens are silently skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "depth" => params.depth = Some(parse_int(value, "depth")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                // Unknown token -- skip per UCI convention
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(params))
}

/// Parse `setoption name <id> value <x>`; the id may contain spaces.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let value_at = tokens
        .iter()
        .position(|&t| t == "value")
        .ok_or(UciError::MalformedOption)?;
    let (name, value) = tokens.split_at(value_at);
    let name = match name {
        ["name", id @ ..] if !id.is_empty() => id.join(" "),
        _ => return Err(UciError::MalformedOption),
    };
    let value = value.get(1);

    let option = match name.to_ascii_lowercase().as_str() {
        "hash" => {
            let mb: usize = parse_int(value, "Hash")?;
            UciOption::Hash(mb.clamp(1, MAX_HASH_MB))
        }
        "maxdepth" => {
            let depth: u32 = parse_int(value, "MaxDepth")?;
            UciOption::MaxDepth(depth.clamp(1, MAX_DEPTH))
        }
        _ => return Err(UciError::UnknownOption { name }),
    };

    Ok(Command::SetOption(option))
}

/// Parse a millisecond value from a token.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    // GUIs occasionally send a negative clock when flagging.
    let ms: i64 = parse_int(token, param)?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
