//! UCI protocol handling for vpr.

pub mod command;
pub mod engine;
pub mod error;

pub use command::{Command, GoParams, PositionCommand, UciOption, parse_command};
pub use engine::UciEngine;
pub use error::UciError;
