use async_trait::async_trait;

use crate::bidstrategy::{BidStrategyRequest, BidStrategyResponse, SemanticBidStrategy};
use crate::error::Result;

/// Accepts only jobs whose type appears in a whitelist.
pub struct JobTypeStrategy {
    accepted_types: Vec<String>,
}

impl JobTypeStrategy {
    pub fn new(accepted_types: Vec<String>) -> Self {
        Self { accepted_types }
    }
}

#[async_trait]
impl SemanticBidStrategy for JobTypeStrategy {
    fn name(&self) -> &'static str {
        "job-type"
    }

    async fn should_bid(&self, request: &BidStrategyRequest) -> Result<BidStrategyResponse> {
        if self.accepted_types.iter().any(|t| t == &request.job.job_type) {
            Ok(BidStrategyResponse::accept(format!(
                "job type {} is supported",
                request.job.job_type
            )))
        } else {
            Ok(BidStrategyResponse::reject(format!(
                "job type {} is not supported by this node",
                request.job.job_type
            )))
        }
    }
}

/// Requires the job to carry every configured label with the exact value.
pub struct LabelMatchStrategy {
    required: Vec<(String, String)>,
}

impl LabelMatchStrategy {
    pub fn new(required: Vec<(String, String)>) -> Self {
        Self { required }
    }
}

#[async_trait]
impl SemanticBidStrategy for LabelMatchStrategy {
    fn name(&self) -> &'static str {
        "label-match"
    }

    async fn should_bid(&self, request: &BidStrategyRequest) -> Result<BidStrategyResponse> {
        for (key, value) in &self.required {
            match request.job.labels.get(key) {
                Some(v) if v == value => {}
                _ => {
                    return Ok(BidStrategyResponse::reject(format!(
                        "job is missing required label {}={}",
                        key, value
                    )))
                }
            }
        }
        Ok(BidStrategyResponse::accept(""))
    }
}
