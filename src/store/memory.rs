use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{FlotillaError, Result};
use crate::models::Execution;
use crate::store::{ExecutionStore, UpdateExecutionStateRequest};

/// In-memory execution store.
///
/// All mutations take the map's write lock, so conditional updates are
/// linearizable per execution id (and in fact across the whole map).
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    executions: RwLock<HashMap<String, Execution>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, terminal ones included.
    pub async fn len(&self) -> usize {
        self.executions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.executions.read().await.is_empty()
    }

    /// Every record in the store. Inspection and single-process wiring
    /// only; the scheduling path goes through `get_executions`.
    pub async fn all_executions(&self) -> Vec<Execution> {
        self.executions.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn create_execution(&self, execution: Execution) -> Result<()> {
        let mut executions = self.executions.write().await;
        if executions.contains_key(&execution.id) {
            return Err(FlotillaError::ExecutionAlreadyExists(execution.id));
        }
        tracing::debug!(
            execution_id = %execution.id,
            job_id = %execution.job.id,
            node_id = %execution.node_id,
            state = %execution.state,
            "Execution created"
        );
        executions.insert(execution.id.clone(), execution);
        Ok(())
    }

    async fn get_execution(&self, execution_id: &str) -> Result<Execution> {
        self.executions
            .read()
            .await
            .get(execution_id)
            .cloned()
            .ok_or_else(|| FlotillaError::ExecutionNotFound(execution_id.to_string()))
    }

    async fn get_executions(&self, job_id: &str) -> Result<Vec<Execution>> {
        Ok(self
            .executions
            .read()
            .await
            .values()
            .filter(|e| e.job_id() == job_id)
            .cloned()
            .collect())
    }

    async fn update_execution_state(&self, request: UpdateExecutionStateRequest) -> Result<()> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&request.execution_id)
            .ok_or_else(|| FlotillaError::ExecutionNotFound(request.execution_id.clone()))?;

        if !request.expected_states.is_empty()
            && !request.expected_states.contains(&execution.state)
        {
            return Err(FlotillaError::InvalidState {
                execution_id: request.execution_id,
                current: execution.state,
                expected: request.expected_states,
            });
        }

        tracing::debug!(
            execution_id = %execution.id,
            from = %execution.state,
            to = %request.new_state,
            "Execution state updated"
        );

        execution.state = request.new_state;
        if request.message.is_some() {
            execution.message = request.message;
        }
        execution.events.extend(request.events);
        // Clamped so a clock step backwards cannot regress the record.
        execution.update_time = Utc::now().max(execution.update_time);
        Ok(())
    }

    async fn delete_execution(&self, execution_id: &str) -> Result<()> {
        let mut executions = self.executions.write().await;
        executions
            .remove(execution_id)
            .ok_or_else(|| FlotillaError::ExecutionNotFound(execution_id.to_string()))?;
        Ok(())
    }
}
