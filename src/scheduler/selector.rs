use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Job, NodeInfo};

/// Supplies the scheduler's view of cluster membership and candidate
/// nodes for new placements.
#[async_trait]
pub trait NodeSelector: Send + Sync {
    /// Snapshot of the current membership, keyed by node id. Executions
    /// on nodes absent from this map are considered lost.
    async fn all_nodes(&self) -> Result<HashMap<String, NodeInfo>>;

    /// Up to `count` nodes suitable for running `job`.
    async fn matching_nodes(&self, job: &Job, count: usize) -> Result<Vec<NodeInfo>>;
}

/// Fixed membership selector. Placement candidates are returned in id
/// order, which keeps scheduling decisions reproducible.
#[derive(Debug, Default)]
pub struct StaticNodeSelector {
    nodes: RwLock<HashMap<String, NodeInfo>>,
}

impl StaticNodeSelector {
    pub fn new(nodes: impl IntoIterator<Item = NodeInfo>) -> Self {
        Self {
            nodes: RwLock::new(nodes.into_iter().map(|n| (n.id.clone(), n)).collect()),
        }
    }

    pub async fn add_node(&self, node: NodeInfo) {
        self.nodes.write().await.insert(node.id.clone(), node);
    }

    /// Drop a node from membership, e.g. to simulate a crash.
    pub async fn remove_node(&self, node_id: &str) {
        self.nodes.write().await.remove(node_id);
    }
}

#[async_trait]
impl NodeSelector for StaticNodeSelector {
    async fn all_nodes(&self) -> Result<HashMap<String, NodeInfo>> {
        Ok(self.nodes.read().await.clone())
    }

    async fn matching_nodes(&self, _job: &Job, count: usize) -> Result<Vec<NodeInfo>> {
        let nodes = self.nodes.read().await;
        let mut candidates: Vec<NodeInfo> = nodes.values().cloned().collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates.truncate(count);
        Ok(candidates)
    }
}
