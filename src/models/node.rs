use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Membership record for a compute node. Presence of a node's id in the
/// current membership snapshot is what defines it as healthy; the
/// scheduler never interprets the other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    pub last_seen: DateTime<Utc>,
}

impl NodeInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_seen: Utc::now(),
        }
    }
}
