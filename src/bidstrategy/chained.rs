use std::sync::Arc;

use crate::bidstrategy::{
    BidStrategyRequest, BidStrategyResponse, ResourceBidStrategy, SemanticBidStrategy,
};
use crate::error::{FlotillaError, Result};
use crate::models::Resources;

/// Ordered composition of bid strategies.
///
/// Strategies run in registration order. The first strategy that
/// declines wins and its response is returned as-is; the first strategy
/// that errors aborts the chain. When every strategy accepts, the
/// non-empty reasons are joined with `"; "`.
///
/// A chain is immutable once built; compose a new one to change it.
pub struct ChainedBidStrategy {
    semantics: Vec<Arc<dyn SemanticBidStrategy>>,
    resources: Vec<Arc<dyn ResourceBidStrategy>>,
}

#[derive(Default)]
pub struct ChainedBidStrategyBuilder {
    semantics: Vec<Arc<dyn SemanticBidStrategy>>,
    resources: Vec<Arc<dyn ResourceBidStrategy>>,
}

impl ChainedBidStrategyBuilder {
    pub fn semantic(mut self, strategy: Arc<dyn SemanticBidStrategy>) -> Self {
        self.semantics.push(strategy);
        self
    }

    pub fn resource(mut self, strategy: Arc<dyn ResourceBidStrategy>) -> Self {
        self.resources.push(strategy);
        self
    }

    pub fn build(self) -> ChainedBidStrategy {
        ChainedBidStrategy {
            semantics: self.semantics,
            resources: self.resources,
        }
    }
}

impl ChainedBidStrategy {
    pub fn builder() -> ChainedBidStrategyBuilder {
        ChainedBidStrategyBuilder::default()
    }

    /// Run the semantic pipeline.
    pub async fn should_bid(&self, request: &BidStrategyRequest) -> Result<BidStrategyResponse> {
        let mut reasons = Vec::with_capacity(self.semantics.len());

        for strategy in &self.semantics {
            let response = strategy.should_bid(request).await.map_err(|e| {
                tracing::error!(strategy = strategy.name(), error = %e, "Bid strategy failed");
                FlotillaError::Strategy {
                    strategy: strategy.name().to_string(),
                    message: e.to_string(),
                }
            })?;

            if !response.should_bid {
                tracing::debug!(
                    strategy = strategy.name(),
                    reason = %response.reason,
                    "Bid strategy declined"
                );
                return Ok(response);
            }
            if !response.reason.is_empty() {
                reasons.push(response.reason);
            }
        }

        Ok(BidStrategyResponse::accept(reasons.join("; ")))
    }

    /// Run the resource pipeline against a usage snapshot.
    pub async fn should_bid_based_on_usage(
        &self,
        request: &BidStrategyRequest,
        usage: &Resources,
    ) -> Result<BidStrategyResponse> {
        let mut reasons = Vec::with_capacity(self.resources.len());

        for strategy in &self.resources {
            let response = strategy
                .should_bid_based_on_usage(request, usage)
                .await
                .map_err(|e| {
                    tracing::error!(strategy = strategy.name(), error = %e, "Bid strategy failed");
                    FlotillaError::Strategy {
                        strategy: strategy.name().to_string(),
                        message: e.to_string(),
                    }
                })?;

            if !response.should_bid {
                tracing::debug!(
                    strategy = strategy.name(),
                    reason = %response.reason,
                    "Bid strategy declined"
                );
                return Ok(response);
            }
            if !response.reason.is_empty() {
                reasons.push(response.reason);
            }
        }

        Ok(BidStrategyResponse::accept(reasons.join("; ")))
    }
}
