//! Search and evaluation for vpr.

mod engine;
mod error;
pub mod eval;
pub mod search;
pub mod time;

pub use engine::{Engine, EngineConfig, PositionSpec};
pub use error::EngineError;
pub use eval::evaluate;
pub use search::control::SearchControl;
pub use search::{ScoreReport, SearchInfo, SearchLimits, SearchResult, Searcher};
pub use time::{Clock, allocate};
