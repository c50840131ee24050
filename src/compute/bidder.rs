use std::sync::Arc;

use crate::bidstrategy::{BidStrategyRequest, BidStrategyResponse, ChainedBidStrategy};
use crate::error::Result;
use crate::models::{Event, ExecutionState, Resources};
use crate::store::{ExecutionStore, UpdateExecutionStateRequest};

/// Drives the compute-local half of an execution's bid lifecycle.
///
/// Takes an execution in `New`, marks it `AskForBid`, consults the
/// semantic and resource strategy pipelines, and records the verdict as
/// `AskForBidAccepted` or `AskForBidRejected`. The orchestrator observes
/// the outcome through the store on its next pass.
pub struct Bidder {
    node_id: String,
    strategy: Arc<ChainedBidStrategy>,
    store: Arc<dyn ExecutionStore>,
}

impl Bidder {
    pub fn new(
        node_id: impl Into<String>,
        strategy: Arc<ChainedBidStrategy>,
        store: Arc<dyn ExecutionStore>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            strategy,
            store,
        }
    }

    pub async fn run_bidding(&self, execution_id: &str, usage: &Resources) -> Result<()> {
        let execution = self.store.get_execution(execution_id).await?;

        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(execution_id, ExecutionState::AskForBid)
                    .with_expected_states(vec![ExecutionState::New])
                    .with_events(vec![Event::new("bid requested")]),
            )
            .await?;

        let request = BidStrategyRequest {
            node_id: self.node_id.clone(),
            job: execution.job,
        };

        let response = self.evaluate(&request, usage).await?;

        let (new_state, event) = if response.should_bid {
            (ExecutionState::AskForBidAccepted, Event::new("bid accepted"))
        } else {
            (ExecutionState::AskForBidRejected, Event::new("bid rejected"))
        };

        tracing::info!(
            execution_id = %execution_id,
            node_id = %self.node_id,
            should_bid = response.should_bid,
            reason = %response.reason,
            "Bidding complete"
        );

        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(execution_id, new_state)
                    .with_expected_states(vec![ExecutionState::AskForBid])
                    .with_message(response.reason)
                    .with_events(vec![event]),
            )
            .await
    }

    /// Semantic pipeline first; resource pipeline only consulted when the
    /// semantic verdict is positive. Accept reasons from both pipelines
    /// are joined.
    async fn evaluate(
        &self,
        request: &BidStrategyRequest,
        usage: &Resources,
    ) -> Result<BidStrategyResponse> {
        let semantic = self.strategy.should_bid(request).await?;
        if !semantic.should_bid {
            return Ok(semantic);
        }

        let resource = self.strategy.should_bid_based_on_usage(request, usage).await?;
        if !resource.should_bid {
            return Ok(resource);
        }

        let reasons: Vec<String> = [semantic.reason, resource.reason]
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect();
        Ok(BidStrategyResponse::accept(reasons.join("; ")))
    }
}
