//! Orchestrator-to-compute message envelopes.
//!
//! An envelope pairs a string metadata map with a typed payload. The
//! `message-type` metadata key is authoritative for dispatch; a payload
//! whose variant disagrees with the declared type is an error at the
//! handler boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Event, Execution};

/// Mandatory envelope metadata key identifying the payload variant.
pub const KEY_MESSAGE_TYPE: &str = "message-type";

pub const ASK_FOR_BID_MESSAGE_TYPE: &str = "AskForBid";
pub const BID_ACCEPTED_MESSAGE_TYPE: &str = "BidAccepted";
pub const BID_REJECTED_MESSAGE_TYPE: &str = "BidRejected";
pub const CANCEL_EXECUTION_MESSAGE_TYPE: &str = "CancelExecution";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskForBidRequest {
    pub execution: Execution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidAcceptedRequest {
    pub execution_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRejectedRequest {
    pub execution_id: String,
    pub message: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelExecutionRequest {
    pub execution_id: String,
    pub message: String,
    pub events: Vec<Event>,
}

/// Typed payload variants carried by an [`Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    AskForBid(AskForBidRequest),
    BidAccepted(BidAcceptedRequest),
    BidRejected(BidRejectedRequest),
    CancelExecution(CancelExecutionRequest),
}

impl Payload {
    /// The message-type tag this variant is expected to travel under.
    pub fn message_type(&self) -> &'static str {
        match self {
            Payload::AskForBid(_) => ASK_FOR_BID_MESSAGE_TYPE,
            Payload::BidAccepted(_) => BID_ACCEPTED_MESSAGE_TYPE,
            Payload::BidRejected(_) => BID_REJECTED_MESSAGE_TYPE,
            Payload::CancelExecution(_) => CANCEL_EXECUTION_MESSAGE_TYPE,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Payload::AskForBid(_) => "AskForBidRequest",
            Payload::BidAccepted(_) => "BidAcceptedRequest",
            Payload::BidRejected(_) => "BidRejectedRequest",
            Payload::CancelExecution(_) => "CancelExecutionRequest",
        }
    }
}

/// A wire message: metadata map plus typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub metadata: HashMap<String, String>,
    pub payload: Payload,
}

impl Envelope {
    /// Wrap a payload, stamping its message-type into the metadata.
    pub fn new(payload: Payload) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(KEY_MESSAGE_TYPE.to_string(), payload.message_type().to_string());
        Self { metadata, payload }
    }

    pub fn ask_for_bid(execution: Execution) -> Self {
        Self::new(Payload::AskForBid(AskForBidRequest { execution }))
    }

    pub fn bid_accepted(execution_id: impl Into<String>) -> Self {
        Self::new(Payload::BidAccepted(BidAcceptedRequest {
            execution_id: execution_id.into(),
        }))
    }

    pub fn bid_rejected(
        execution_id: impl Into<String>,
        message: impl Into<String>,
        events: Vec<Event>,
    ) -> Self {
        Self::new(Payload::BidRejected(BidRejectedRequest {
            execution_id: execution_id.into(),
            message: message.into(),
            events,
        }))
    }

    pub fn cancel_execution(
        execution_id: impl Into<String>,
        message: impl Into<String>,
        events: Vec<Event>,
    ) -> Self {
        Self::new(Payload::CancelExecution(CancelExecutionRequest {
            execution_id: execution_id.into(),
            message: message.into(),
            events,
        }))
    }

    /// The declared message type, if any.
    pub fn message_type(&self) -> Option<&str> {
        self.metadata.get(KEY_MESSAGE_TYPE).map(String::as_str)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Transport seam for delivering envelopes to a compute node. Delivery
/// is at-least-once; receivers are expected to be idempotent.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, node_id: &str, message: Envelope) -> Result<()>;
}
