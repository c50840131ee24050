//! Execution persistence and the conditional-update primitive.
//!
//! The store is the system's single serialization point: every state
//! change flows through [`ExecutionStore::update_execution_state`], which
//! applies an expected-states guard before mutating. Out-of-order and
//! duplicate messages are rejected by the guard rather than silently
//! honored.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Event, Execution, ExecutionState};

pub use memory::InMemoryExecutionStore;

/// Conditional state-update request. The sole mutating path for an
/// execution's state, message, and event history.
#[derive(Debug, Clone)]
pub struct UpdateExecutionStateRequest {
    pub execution_id: String,
    /// When non-empty, the update applies only if the current state is a
    /// member; otherwise the store fails with `InvalidState` and leaves
    /// the record untouched.
    pub expected_states: Vec<ExecutionState>,
    pub new_state: ExecutionState,
    pub message: Option<String>,
    pub events: Vec<Event>,
}

impl UpdateExecutionStateRequest {
    pub fn new(execution_id: impl Into<String>, new_state: ExecutionState) -> Self {
        Self {
            execution_id: execution_id.into(),
            expected_states: Vec::new(),
            new_state,
            message: None,
            events: Vec::new(),
        }
    }

    pub fn with_expected_states(mut self, states: Vec<ExecutionState>) -> Self {
        self.expected_states = states;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }
}

/// Persistent mapping of execution id to execution record.
///
/// Implementations must make every accepted mutation durable before
/// returning and must serialize conditional updates per execution id.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a new execution. Fails with `ExecutionAlreadyExists` if the
    /// id is present.
    async fn create_execution(&self, execution: Execution) -> Result<()>;

    /// Fetch the current record for an execution id.
    async fn get_execution(&self, execution_id: &str) -> Result<Execution>;

    /// All executions belonging to a job, in no particular order.
    async fn get_executions(&self, job_id: &str) -> Result<Vec<Execution>>;

    /// Apply a guarded state update. On success the update time is
    /// stamped and the request's events are appended to the record's
    /// history.
    async fn update_execution_state(&self, request: UpdateExecutionStateRequest) -> Result<()>;

    /// Remove a record. Garbage collection of terminal executions past
    /// retention only; never part of the scheduling hot path.
    async fn delete_execution(&self, execution_id: &str) -> Result<()>;
}
