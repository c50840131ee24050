use std::sync::Arc;

use crate::error::Result;
use crate::messages::{Envelope, MessagePublisher};
use crate::models::{Event, Execution, ExecutionState, Job};
use crate::scheduler::exec_set::ExecSet;
use crate::scheduler::selector::NodeSelector;
use crate::store::{ExecutionStore, UpdateExecutionStateRequest};

const REASON_OVER_TARGET: &str = "execution over replication target";
const REASON_JOB_COMPLETED: &str = "job already completed";

/// Per-job scheduling pass.
///
/// Each pass observes the store's view of a job, classifies its
/// executions, and emits approve / reject / cancel decisions plus new
/// placements to close the gap to the desired replica count. A pass is
/// idempotent: re-running it against unchanged state produces no new
/// decisions. No lock is held across publishes; the store's conditional
/// updates are the only synchronization.
pub struct Scheduler {
    store: Arc<dyn ExecutionStore>,
    publisher: Arc<dyn MessagePublisher>,
    selector: Arc<dyn NodeSelector>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        publisher: Arc<dyn MessagePublisher>,
        selector: Arc<dyn NodeSelector>,
    ) -> Self {
        Self {
            store,
            publisher,
            selector,
        }
    }

    pub async fn process(&self, job: &Job) -> Result<()> {
        let executions = self.store.get_executions(&job.id).await?;
        let all: ExecSet = executions.into_iter().collect();
        let non_terminal = all.filter_non_terminal();

        let node_infos = self.selector.all_nodes().await?;
        let (healthy, lost) = non_terminal.filter_by_node_health(&node_infos);

        // Executions on departed nodes are failed in place. There is no
        // node left to message. Guarded on the snapshot state: a message
        // that lands between the snapshot and this write wins, and the
        // next pass re-observes.
        for execution in lost.values() {
            tracing::warn!(
                execution_id = %execution.id,
                node_id = %execution.node_id,
                "Marking execution lost"
            );
            let result = self
                .store
                .update_execution_state(
                    UpdateExecutionStateRequest::new(&execution.id, ExecutionState::Failed)
                        .with_expected_states(vec![execution.state])
                        .with_message(format!("compute node {} lost", execution.node_id))
                        .with_events(vec![Event::new("compute node disconnected")]),
                )
                .await;
            if let Err(e) = result {
                if !e.is_invalid_state() {
                    return Err(e);
                }
                tracing::debug!(
                    execution_id = %execution.id,
                    "Execution moved on while being marked lost"
                );
            }
        }

        let desired = job.count;

        if all.count_completed() >= desired {
            tracing::info!(job_id = %job.id, desired, "Job reached replica target, retiring");
            self.cancel_set(&healthy, REASON_JOB_COMPLETED).await?;
            return Ok(());
        }

        let approval = healthy.filter_by_approval_status(desired);

        // Approved-but-redundant running executions, newest first.
        let (_, over_subscribed) = approval.running.filter_by_over_subscriptions(desired);
        self.cancel_set(&over_subscribed, REASON_OVER_TARGET).await?;

        for execution in approval.to_approve.values() {
            self.approve(execution).await?;
        }
        for execution in approval.to_reject.values() {
            self.reject(execution, REASON_OVER_TARGET).await?;
        }

        let shortfall = desired.saturating_sub(approval.active_count());
        if shortfall > 0 {
            self.place_new_executions(job, shortfall).await?;
        }

        Ok(())
    }

    async fn approve(&self, execution: &Execution) -> Result<()> {
        tracing::info!(
            execution_id = %execution.id,
            node_id = %execution.node_id,
            "Approving bid"
        );
        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(&execution.id, ExecutionState::BidAccepted)
                    .with_expected_states(vec![
                        ExecutionState::New,
                        ExecutionState::AskForBidAccepted,
                    ])
                    .with_events(vec![Event::new("bid approved")]),
            )
            .await?;
        self.publisher
            .publish(&execution.node_id, Envelope::bid_accepted(&execution.id))
            .await
    }

    async fn reject(&self, execution: &Execution, reason: &str) -> Result<()> {
        tracing::info!(
            execution_id = %execution.id,
            node_id = %execution.node_id,
            reason,
            "Rejecting bid"
        );
        let events = vec![Event::new(reason)];
        self.store
            .update_execution_state(
                UpdateExecutionStateRequest::new(&execution.id, ExecutionState::BidRejected)
                    .with_expected_states(vec![
                        ExecutionState::New,
                        ExecutionState::AskForBidAccepted,
                    ])
                    .with_message(reason)
                    .with_events(events.clone()),
            )
            .await?;
        self.publisher
            .publish(
                &execution.node_id,
                Envelope::bid_rejected(&execution.id, reason, events),
            )
            .await
    }

    async fn cancel_set(&self, set: &ExecSet, reason: &str) -> Result<()> {
        for execution in set.values() {
            tracing::info!(
                execution_id = %execution.id,
                node_id = %execution.node_id,
                reason,
                "Canceling execution"
            );
            let events = vec![Event::new(reason)];
            self.store
                .update_execution_state(
                    UpdateExecutionStateRequest::new(&execution.id, ExecutionState::Cancelled)
                        .with_message(reason)
                        .with_events(events.clone()),
                )
                .await?;
            self.publisher
                .publish(
                    &execution.node_id,
                    Envelope::cancel_execution(&execution.id, reason, events),
                )
                .await?;
        }
        Ok(())
    }

    async fn place_new_executions(&self, job: &Job, count: usize) -> Result<()> {
        let candidates = self.selector.matching_nodes(job, count).await?;
        if candidates.is_empty() {
            tracing::warn!(job_id = %job.id, count, "No nodes available for placement");
            return Ok(());
        }

        for node in candidates {
            let execution = Execution::new(job.clone(), &node.id);
            tracing::info!(
                execution_id = %execution.id,
                job_id = %job.id,
                node_id = %node.id,
                "Placing new execution"
            );
            self.store.create_execution(execution.clone()).await?;
            self.publisher
                .publish(&node.id, Envelope::ask_for_bid(execution))
                .await?;
        }
        Ok(())
    }
}
