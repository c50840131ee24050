pub mod execution;
pub mod job;
pub mod node;

pub use execution::{Event, Execution, ExecutionState};
pub use job::{Job, Resources};
pub use node::NodeInfo;

/// Job metadata key carrying the orchestrator protocol tag.
pub const META_ORCHESTRATOR_PROTOCOL: &str = "orchestrator.protocol";

/// Protocol tag written into job metadata when an execution is created
/// from an ask-for-bid request.
pub const PROTOCOL_NCL_V1: &str = "ncl/v1";
