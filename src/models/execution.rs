use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::Job;

/// Compute-side lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    New,
    AskForBid,
    AskForBidAccepted,
    AskForBidRejected,
    BidAccepted,
    BidRejected,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::AskForBidRejected
                | ExecutionState::BidRejected
                | ExecutionState::Completed
                | ExecutionState::Failed
                | ExecutionState::Cancelled
        )
    }

    /// Running covers executions the orchestrator considers placed:
    /// approved bids and bids awaiting approval.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            ExecutionState::AskForBidAccepted | ExecutionState::BidAccepted
        )
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionState::New => "New",
            ExecutionState::AskForBid => "AskForBid",
            ExecutionState::AskForBidAccepted => "AskForBidAccepted",
            ExecutionState::AskForBidRejected => "AskForBidRejected",
            ExecutionState::BidAccepted => "BidAccepted",
            ExecutionState::BidRejected => "BidRejected",
            ExecutionState::Completed => "Completed",
            ExecutionState::Failed => "Failed",
            ExecutionState::Cancelled => "Cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A state-change event appended to an execution's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A single attempt to run one job on one compute node.
///
/// The (id, job, node) triple is fixed at creation. State, message,
/// update time, events, and metadata change only through the execution
/// store's conditional update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub job: Job,
    pub node_id: String,
    pub state: ExecutionState,
    /// Human-readable reason attached to the latest transition.
    pub message: Option<String>,
    pub update_time: DateTime<Utc>,
    /// Append-only history of state-change events.
    pub events: Vec<Event>,
    pub metadata: HashMap<String, String>,
}

impl Execution {
    pub fn new(job: Job, node_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job,
            node_id: node_id.into(),
            state: ExecutionState::New,
            message: None,
            update_time: Utc::now(),
            events: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job.id
    }
}
