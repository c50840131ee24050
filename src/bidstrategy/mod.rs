//! Bid strategies decide whether a compute node offers to run an
//! execution.
//!
//! Two pipelines run per request: semantic strategies judge the request
//! alone, resource strategies additionally consider the node's current
//! utilization. [`ChainedBidStrategy`] composes either kind in
//! registration order with short-circuit semantics.

pub mod chained;
pub mod fixed;
pub mod resource;
pub mod semantic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Job, Resources};

pub use chained::{ChainedBidStrategy, ChainedBidStrategyBuilder};
pub use fixed::FixedBidStrategy;
pub use resource::{AvailableCapacityStrategy, MaxCapacityStrategy};
pub use semantic::{JobTypeStrategy, LabelMatchStrategy};

/// The question put to a strategy: should this node bid on this job?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidStrategyRequest {
    pub node_id: String,
    pub job: Job,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidStrategyResponse {
    pub should_bid: bool,
    pub reason: String,
}

impl BidStrategyResponse {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            should_bid: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            should_bid: false,
            reason: reason.into(),
        }
    }
}

/// A judgment that depends only on the request.
#[async_trait]
pub trait SemanticBidStrategy: Send + Sync {
    /// Stable identifier surfaced in logs and strategy errors.
    fn name(&self) -> &'static str;

    async fn should_bid(&self, request: &BidStrategyRequest) -> Result<BidStrategyResponse>;
}

/// A judgment that also considers current node utilization.
#[async_trait]
pub trait ResourceBidStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn should_bid_based_on_usage(
        &self,
        request: &BidStrategyRequest,
        usage: &Resources,
    ) -> Result<BidStrategyResponse>;
}
