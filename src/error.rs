use thiserror::Error;

use crate::models::ExecutionState;

#[derive(Error, Debug)]
pub enum FlotillaError {
    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Execution already exists: {0}")]
    ExecutionAlreadyExists(String),

    #[error("Invalid state for execution {execution_id}: {current} not in expected states {expected:?}")]
    InvalidState {
        execution_id: String,
        current: ExecutionState,
        expected: Vec<ExecutionState>,
    },

    #[error("Unexpected payload type: expected {expected}, got {actual}")]
    UnexpectedPayloadType { expected: String, actual: String },

    #[error("Bid strategy {strategy} failed: {message}")]
    Strategy { strategy: String, message: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlotillaError {
    /// True when a conditional store update was rejected by its
    /// expected-states guard. Duplicate deliveries surface as this.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, FlotillaError::InvalidState { .. })
    }
}

pub type Result<T> = std::result::Result<T, FlotillaError>;
