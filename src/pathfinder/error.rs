//! Search error type.

use thiserror::Error;

use crate::models::Position;

/// Errors produced by a path search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Every position reachable from the start was explored without
    /// reaching the target.
    #[error("no path found from {from} to {to}")]
    NoPathFound { from: Position, to: Position },

    /// A configured motion is not in the catalog.
    #[error("unknown motion '{0}'")]
    UnknownMotion(String),

    /// Start or target is not a valid cursor position in the buffer.
    #[error("position {0} is outside the buffer")]
    OutOfBounds(Position),
}

pub type SearchResult<T> = Result<T, SearchError>;
