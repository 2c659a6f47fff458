use thiserror::Error;

/// Errors that can occur while searching a game tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Invalid undo token: issued at ply {found}, state is at ply {expected}")]
    InvalidUndoToken { expected: u32, found: u32 },

    #[error("State invariant violated: {0}")]
    InvariantViolation(String),

    #[error("No legal actions available")]
    NoLegalActions,

    #[error("An asynchronous search is already running")]
    SearchInProgress,

    #[error("No search result is available yet")]
    NotReady,
}

/// Convenience Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
