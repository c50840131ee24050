use std::sync::Arc;

use crate::error::{FlotillaError, Result};
use crate::messages::{
    AskForBidRequest, BidAcceptedRequest, BidRejectedRequest, CancelExecutionRequest, Envelope,
    Payload, ASK_FOR_BID_MESSAGE_TYPE, BID_ACCEPTED_MESSAGE_TYPE, BID_REJECTED_MESSAGE_TYPE,
    CANCEL_EXECUTION_MESSAGE_TYPE,
};
use crate::models::{ExecutionState, META_ORCHESTRATOR_PROTOCOL, PROTOCOL_NCL_V1};
use crate::store::{ExecutionStore, UpdateExecutionStateRequest};

/// Demultiplexes orchestrator envelopes by their declared message type
/// and applies the corresponding store mutation.
///
/// Messaging is fire-and-forget at this layer: every error from the
/// store or from payload validation is logged with the full envelope
/// metadata and swallowed. The orchestrator retries by resending, and
/// the store's expected-states guards make duplicates harmless.
pub struct MessageHandler {
    store: Arc<dyn ExecutionStore>,
}

impl MessageHandler {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }

    /// Filter gate: only envelopes with a recognized message type are
    /// processed. Everything else is ignored for forward compatibility.
    pub fn should_process(&self, message: &Envelope) -> bool {
        matches!(
            message.message_type(),
            Some(ASK_FOR_BID_MESSAGE_TYPE)
                | Some(BID_ACCEPTED_MESSAGE_TYPE)
                | Some(BID_REJECTED_MESSAGE_TYPE)
                | Some(CANCEL_EXECUTION_MESSAGE_TYPE)
        )
    }

    pub async fn handle_message(&self, message: &Envelope) {
        let result = match message.message_type() {
            Some(ASK_FOR_BID_MESSAGE_TYPE) => self.handle_ask_for_bid(message).await,
            Some(BID_ACCEPTED_MESSAGE_TYPE) => self.handle_bid_accepted(message).await,
            Some(BID_REJECTED_MESSAGE_TYPE) => self.handle_bid_rejected(message).await,
            Some(CANCEL_EXECUTION_MESSAGE_TYPE) => self.handle_cancel(message).await,
            _ => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!(metadata = ?message.metadata, error = %e, "Error handling message");
        }
    }

    fn unexpected_payload(expected: &str, payload: &Payload) -> FlotillaError {
        FlotillaError::UnexpectedPayloadType {
            expected: expected.to_string(),
            actual: payload.variant_name().to_string(),
        }
    }

    async fn handle_ask_for_bid(&self, message: &Envelope) -> Result<()> {
        let request: &AskForBidRequest = match &message.payload {
            Payload::AskForBid(r) => r,
            other => return Err(Self::unexpected_payload("AskForBidRequest", other)),
        };

        let mut execution = request.execution.clone();
        if execution.job.id.is_empty() {
            return Err(FlotillaError::MissingField("job"));
        }
        execution.job.metadata.insert(
            META_ORCHESTRATOR_PROTOCOL.to_string(),
            PROTOCOL_NCL_V1.to_string(),
        );

        self.store.create_execution(execution).await
    }

    async fn handle_bid_accepted(&self, message: &Envelope) -> Result<()> {
        let request: &BidAcceptedRequest = match &message.payload {
            Payload::BidAccepted(r) => r,
            other => return Err(Self::unexpected_payload("BidAcceptedRequest", other)),
        };

        tracing::debug!(execution_id = %request.execution_id, "Bid accepted");
        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(
                    &request.execution_id,
                    ExecutionState::BidAccepted,
                )
                .with_expected_states(vec![
                    ExecutionState::New,
                    ExecutionState::AskForBidAccepted,
                ]),
            )
            .await
    }

    async fn handle_bid_rejected(&self, message: &Envelope) -> Result<()> {
        let request: &BidRejectedRequest = match &message.payload {
            Payload::BidRejected(r) => r,
            other => return Err(Self::unexpected_payload("BidRejectedRequest", other)),
        };

        tracing::debug!(
            execution_id = %request.execution_id,
            reason = %request.message,
            "Bid rejected"
        );
        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(
                    &request.execution_id,
                    ExecutionState::BidRejected,
                )
                .with_expected_states(vec![
                    ExecutionState::New,
                    ExecutionState::AskForBidAccepted,
                ])
                .with_message(request.message.clone())
                .with_events(request.events.clone()),
            )
            .await
    }

    async fn handle_cancel(&self, message: &Envelope) -> Result<()> {
        let request: &CancelExecutionRequest = match &message.payload {
            Payload::CancelExecution(r) => r,
            other => return Err(Self::unexpected_payload("CancelExecutionRequest", other)),
        };

        tracing::debug!(
            execution_id = %request.execution_id,
            reason = %request.message,
            "Canceling execution"
        );
        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(&request.execution_id, ExecutionState::Cancelled)
                    .with_message(request.message.clone())
                    .with_events(request.events.clone()),
            )
            .await
    }
}
