use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource requirements or usage, depending on context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
    pub gpus: u64,
}

impl Resources {
    /// True when every dimension of `other` fits within `self`.
    pub fn can_hold(&self, other: &Resources) -> bool {
        self.cpu >= other.cpu
            && self.memory_bytes >= other.memory_bytes
            && self.disk_bytes >= other.disk_bytes
            && self.gpus >= other.gpus
    }

    pub fn add(&self, other: &Resources) -> Resources {
        Resources {
            cpu: self.cpu + other.cpu,
            memory_bytes: self.memory_bytes + other.memory_bytes,
            disk_bytes: self.disk_bytes + other.disk_bytes,
            gpus: self.gpus + other.gpus,
        }
    }
}

/// A user-submitted work unit. The orchestrator core reads only the
/// desired execution count and metadata; everything else rides along for
/// bid strategies to judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub job_type: String,
    /// Desired number of executions (replication factor).
    pub count: usize,
    pub labels: HashMap<String, String>,
    pub requirements: Resources,
    pub metadata: HashMap<String, String>,
}

impl Job {
    pub fn new(name: impl Into<String>, job_type: impl Into<String>, count: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            job_type: job_type.into(),
            count,
            labels: HashMap::new(),
            requirements: Resources::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_requirements(mut self, requirements: Resources) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
