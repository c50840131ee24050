//! In-process wiring of an orchestrator and a fleet of compute nodes.
//!
//! A single-process deployment shares one execution store between the
//! orchestrator and its compute nodes; duplicate writes arriving over
//! the message path are absorbed by the store's guards. Across
//! processes each side would hold its own store replica, kept in sync
//! by the same messages.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use async_trait::async_trait;

use crate::bidstrategy::{
    AvailableCapacityStrategy, ChainedBidStrategy, JobTypeStrategy, MaxCapacityStrategy,
};
use crate::compute::{Bidder, MessageHandler};
use crate::config::{ComputeConfig, SchedulerConfig};
use crate::error::{FlotillaError, Result};
use crate::messages::{Envelope, MessagePublisher};
use crate::models::{Event, Execution, ExecutionState, Job, Resources};
use crate::scheduler::Scheduler;
use crate::store::{ExecutionStore, InMemoryExecutionStore, UpdateExecutionStateRequest};

const ENVELOPE_BUFFER: usize = 64;

/// Routes envelopes to per-node channels.
#[derive(Default)]
pub struct LocalTransport {
    senders: RwLock<HashMap<String, mpsc::Sender<Envelope>>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and hand back its inbound message stream.
    pub async fn register(&self, node_id: impl Into<String>) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(ENVELOPE_BUFFER);
        self.senders.write().await.insert(node_id.into(), tx);
        rx
    }
}

#[async_trait]
impl MessagePublisher for LocalTransport {
    async fn publish(&self, node_id: &str, message: Envelope) -> Result<()> {
        let sender = self
            .senders
            .read()
            .await
            .get(node_id)
            .cloned()
            .ok_or_else(|| FlotillaError::Internal(format!("unknown node {}", node_id)))?;
        sender
            .send(message)
            .await
            .map_err(|e| FlotillaError::Internal(format!("send to {} failed: {}", node_id, e)))
    }
}

/// A compute node: message handler plus a polling loop that bids on new
/// executions and runs approved ones. Work is simulated; real workload
/// execution is out of scope.
pub struct ComputeNode {
    config: ComputeConfig,
    store: Arc<InMemoryExecutionStore>,
    handler: MessageHandler,
    bidder: Bidder,
}

impl ComputeNode {
    pub fn new(config: ComputeConfig, store: Arc<InMemoryExecutionStore>) -> Self {
        let strategy = Arc::new(
            ChainedBidStrategy::builder()
                .semantic(Arc::new(JobTypeStrategy::new(
                    config.accepted_job_types.clone(),
                )))
                .resource(Arc::new(MaxCapacityStrategy::new(config.capacity)))
                .resource(Arc::new(AvailableCapacityStrategy::new(config.capacity)))
                .build(),
        );
        let handler = MessageHandler::new(store.clone() as Arc<dyn ExecutionStore>);
        let bidder = Bidder::new(
            &config.node_id,
            strategy,
            store.clone() as Arc<dyn ExecutionStore>,
        );
        Self {
            config,
            store,
            handler,
            bidder,
        }
    }

    /// Drain inbound messages and poll the store until cancelled.
    pub async fn run(self, mut messages: mpsc::Receiver<Envelope>, token: CancellationToken) {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_millis(self.config.poll_interval_ms));
        tracing::info!(node_id = %self.config.node_id, "Compute node started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(node_id = %self.config.node_id, "Compute node stopping");
                    break;
                }
                message = messages.recv() => {
                    match message {
                        Some(message) if self.handler.should_process(&message) => {
                            self.handler.handle_message(&message).await;
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.poll().await {
                        tracing::error!(node_id = %self.config.node_id, error = %e, "Poll failed");
                    }
                }
            }
        }
    }

    async fn poll(&self) -> Result<()> {
        let executions = self.local_executions().await?;
        let usage = self.current_usage(&executions);

        for execution in executions {
            match execution.state {
                ExecutionState::New => {
                    if let Err(e) = self.bidder.run_bidding(&execution.id, &usage).await {
                        // A concurrent update beat us to it; the next
                        // poll sees the settled state.
                        if !e.is_invalid_state() {
                            return Err(e);
                        }
                    }
                }
                ExecutionState::BidAccepted => {
                    self.complete(&execution.id).await?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn local_executions(&self) -> Result<Vec<Execution>> {
        Ok(self
            .store
            .all_executions()
            .await
            .into_iter()
            .filter(|e| e.node_id == self.config.node_id)
            .collect())
    }

    fn current_usage(&self, executions: &[Execution]) -> Resources {
        executions
            .iter()
            .filter(|e| e.state == ExecutionState::BidAccepted)
            .fold(Resources::default(), |acc, e| acc.add(&e.job.requirements))
    }

    async fn complete(&self, execution_id: &str) -> Result<()> {
        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(execution_id, ExecutionState::Completed)
                    .with_expected_states(vec![ExecutionState::BidAccepted])
                    .with_message("execution completed")
                    .with_events(vec![Event::new("execution completed")]),
            )
            .await
    }
}

/// The orchestrator: holds submitted jobs and runs scheduling passes
/// over each on a fixed interval.
pub struct OrchestratorNode {
    scheduler: Scheduler,
    jobs: RwLock<HashMap<String, Job>>,
    config: SchedulerConfig,
}

impl OrchestratorNode {
    pub fn new(scheduler: Scheduler, config: SchedulerConfig) -> Self {
        Self {
            scheduler,
            jobs: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub async fn submit_job(&self, job: Job) {
        tracing::info!(job_id = %job.id, name = %job.name, count = job.count, "Job submitted");
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    pub async fn run(&self, token: CancellationToken) {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_millis(self.config.interval_ms));

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Orchestrator stopping");
                    break;
                }
                _ = interval.tick() => {
                    let jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
                    for job in jobs {
                        if let Err(e) = self.scheduler.process(&job).await {
                            tracing::error!(job_id = %job.id, error = %e, "Scheduling pass failed");
                        }
                    }
                }
            }
        }
    }
}
