use crate::models::Resources;

/// Configuration for a compute node.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    pub node_id: String,
    pub capacity: Resources,
    /// Job types this node will bid on.
    pub accepted_job_types: Vec<String>,
    /// How often the node scans its store for work.
    pub poll_interval_ms: u64,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            node_id: "compute-1".to_string(),
            capacity: Resources {
                cpu: 4.0,
                memory_bytes: 8 * 1024 * 1024 * 1024,
                disk_bytes: 64 * 1024 * 1024 * 1024,
                gpus: 0,
            },
            accepted_job_types: vec!["batch".to_string()],
            poll_interval_ms: 100,
        }
    }
}

impl ComputeConfig {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ..Default::default()
        }
    }

    pub fn with_capacity(mut self, capacity: Resources) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_accepted_job_types(mut self, types: Vec<String>) -> Self {
        self.accepted_job_types = types;
        self
    }
}

/// Configuration for the orchestrator's scheduling loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between scheduling passes over each job.
    pub interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}
