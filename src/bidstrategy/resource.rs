use async_trait::async_trait;

use crate::bidstrategy::{BidStrategyRequest, BidStrategyResponse, ResourceBidStrategy};
use crate::error::Result;
use crate::models::Resources;

/// Rejects jobs whose requirements exceed the node's total capacity,
/// regardless of current load.
pub struct MaxCapacityStrategy {
    max_capacity: Resources,
}

impl MaxCapacityStrategy {
    pub fn new(max_capacity: Resources) -> Self {
        Self { max_capacity }
    }
}

#[async_trait]
impl ResourceBidStrategy for MaxCapacityStrategy {
    fn name(&self) -> &'static str {
        "max-capacity"
    }

    async fn should_bid_based_on_usage(
        &self,
        request: &BidStrategyRequest,
        _usage: &Resources,
    ) -> Result<BidStrategyResponse> {
        if self.max_capacity.can_hold(&request.job.requirements) {
            Ok(BidStrategyResponse::accept(""))
        } else {
            Ok(BidStrategyResponse::reject(
                "job requirements exceed node capacity",
            ))
        }
    }
}

/// Rejects jobs that do not fit in the capacity left over after current
/// usage.
pub struct AvailableCapacityStrategy {
    total_capacity: Resources,
}

impl AvailableCapacityStrategy {
    pub fn new(total_capacity: Resources) -> Self {
        Self { total_capacity }
    }
}

#[async_trait]
impl ResourceBidStrategy for AvailableCapacityStrategy {
    fn name(&self) -> &'static str {
        "available-capacity"
    }

    async fn should_bid_based_on_usage(
        &self,
        request: &BidStrategyRequest,
        usage: &Resources,
    ) -> Result<BidStrategyResponse> {
        let projected = usage.add(&request.job.requirements);
        if self.total_capacity.can_hold(&projected) {
            Ok(BidStrategyResponse::accept(""))
        } else {
            Ok(BidStrategyResponse::reject(
                "insufficient capacity available for job requirements",
            ))
        }
    }
}
