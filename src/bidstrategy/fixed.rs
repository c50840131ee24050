use async_trait::async_trait;

use crate::bidstrategy::{
    BidStrategyRequest, BidStrategyResponse, ResourceBidStrategy, SemanticBidStrategy,
};
use crate::error::{FlotillaError, Result};
use crate::models::Resources;

/// Always answers with a pre-configured response, or always errors.
/// Useful as a policy endpoint (accept-all / reject-all) and in tests.
pub struct FixedBidStrategy {
    response: BidStrategyResponse,
    fail: bool,
}

impl FixedBidStrategy {
    pub fn new(should_bid: bool, reason: impl Into<String>) -> Self {
        Self {
            response: BidStrategyResponse {
                should_bid,
                reason: reason.into(),
            },
            fail: false,
        }
    }

    /// A strategy that errors on every call.
    pub fn erroring() -> Self {
        Self {
            response: BidStrategyResponse::default(),
            fail: true,
        }
    }

    fn respond(&self) -> Result<BidStrategyResponse> {
        if self.fail {
            return Err(FlotillaError::Internal(
                "fixed strategy configured to fail".to_string(),
            ));
        }
        Ok(self.response.clone())
    }
}

#[async_trait]
impl SemanticBidStrategy for FixedBidStrategy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn should_bid(&self, _request: &BidStrategyRequest) -> Result<BidStrategyResponse> {
        self.respond()
    }
}

#[async_trait]
impl ResourceBidStrategy for FixedBidStrategy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn should_bid_based_on_usage(
        &self,
        _request: &BidStrategyRequest,
        _usage: &Resources,
    ) -> Result<BidStrategyResponse> {
        self.respond()
    }
}
