use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use flotilla::messages::{
    Envelope, MessagePublisher, ASK_FOR_BID_MESSAGE_TYPE, BID_ACCEPTED_MESSAGE_TYPE,
    BID_REJECTED_MESSAGE_TYPE, CANCEL_EXECUTION_MESSAGE_TYPE,
};
use flotilla::models::{Execution, ExecutionState, Job, NodeInfo};
use flotilla::scheduler::{Scheduler, StaticNodeSelector};
use flotilla::store::{ExecutionStore, InMemoryExecutionStore};
use flotilla::Result;

/// Captures published envelopes for assertions.
#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<(String, Envelope)>>,
}

impl RecordingPublisher {
    async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }

    async fn of_type(&self, message_type: &str) -> Vec<(String, Envelope)> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(_, m)| m.message_type() == Some(message_type))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, node_id: &str, message: Envelope) -> Result<()> {
        self.sent.lock().await.push((node_id.to_string(), message));
        Ok(())
    }
}

struct Harness {
    store: Arc<InMemoryExecutionStore>,
    publisher: Arc<RecordingPublisher>,
    selector: Arc<StaticNodeSelector>,
    scheduler: Scheduler,
}

fn harness(node_ids: &[&str]) -> Harness {
    let store = Arc::new(InMemoryExecutionStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let selector = Arc::new(StaticNodeSelector::new(
        node_ids.iter().map(|id| NodeInfo::new(*id)),
    ));
    let scheduler = Scheduler::new(
        store.clone() as Arc<dyn ExecutionStore>,
        publisher.clone(),
        selector.clone(),
    );
    Harness {
        store,
        publisher,
        selector,
        scheduler,
    }
}

async fn seed(
    store: &InMemoryExecutionStore,
    job: &Job,
    id: &str,
    node_id: &str,
    state: ExecutionState,
    update_time: DateTime<Utc>,
) {
    let mut execution = Execution::new(job.clone(), node_id);
    execution.id = id.to_string();
    execution.state = state;
    execution.update_time = update_time;
    store.create_execution(execution).await.unwrap();
}

async fn state_of(store: &InMemoryExecutionStore, id: &str) -> ExecutionState {
    store.get_execution(id).await.unwrap().state
}

#[tokio::test]
async fn test_approves_oldest_awaiting_and_rejects_excess() {
    let h = harness(&["node1"]);
    let job = Job::new("test", "batch", 3);
    let now = Utc::now();

    seed(&h.store, &job, "exec1", "node1", ExecutionState::AskForBidAccepted, now).await;
    seed(
        &h.store, &job, "exec2", "node1",
        ExecutionState::AskForBidAccepted,
        now + Duration::seconds(1),
    )
    .await;
    seed(
        &h.store, &job, "exec3", "node1",
        ExecutionState::BidAccepted,
        now + Duration::seconds(2),
    )
    .await;
    seed(
        &h.store, &job, "exec4", "node1",
        ExecutionState::BidAccepted,
        now + Duration::seconds(3),
    )
    .await;
    seed(
        &h.store, &job, "exec5", "node1",
        ExecutionState::Completed,
        now + Duration::seconds(4),
    )
    .await;

    h.scheduler.process(&job).await.unwrap();

    assert_eq!(state_of(&h.store, "exec1").await, ExecutionState::BidAccepted);
    assert_eq!(state_of(&h.store, "exec2").await, ExecutionState::BidRejected);
    assert_eq!(state_of(&h.store, "exec3").await, ExecutionState::BidAccepted);
    assert_eq!(state_of(&h.store, "exec4").await, ExecutionState::BidAccepted);

    let accepted = h.publisher.of_type(BID_ACCEPTED_MESSAGE_TYPE).await;
    assert_eq!(accepted.len(), 1);
    let rejected = h.publisher.of_type(BID_REJECTED_MESSAGE_TYPE).await;
    assert_eq!(rejected.len(), 1);
    assert!(h.publisher.of_type(CANCEL_EXECUTION_MESSAGE_TYPE).await.is_empty());
    assert!(h.publisher.of_type(ASK_FOR_BID_MESSAGE_TYPE).await.is_empty());
}

#[tokio::test]
async fn test_places_new_executions_to_cover_shortfall() {
    let h = harness(&["node1", "node2", "node3"]);
    let job = Job::new("test", "batch", 2);

    h.scheduler.process(&job).await.unwrap();

    let placements = h.publisher.of_type(ASK_FOR_BID_MESSAGE_TYPE).await;
    assert_eq!(placements.len(), 2);
    let mut targets: Vec<&str> = placements.iter().map(|(n, _)| n.as_str()).collect();
    targets.sort();
    assert_eq!(targets, vec!["node1", "node2"]);

    let executions = h.store.get_executions(&job.id).await.unwrap();
    assert_eq!(executions.len(), 2);
    assert!(executions.iter().all(|e| e.state == ExecutionState::New));
}

#[tokio::test]
async fn test_retires_job_once_replica_target_completed() {
    let h = harness(&["node1"]);
    let job = Job::new("test", "batch", 1);
    let now = Utc::now();

    seed(&h.store, &job, "exec1", "node1", ExecutionState::Completed, now).await;
    seed(
        &h.store, &job, "exec2", "node1",
        ExecutionState::BidAccepted,
        now + Duration::seconds(1),
    )
    .await;

    h.scheduler.process(&job).await.unwrap();

    assert_eq!(state_of(&h.store, "exec2").await, ExecutionState::Cancelled);
    let cancels = h.publisher.of_type(CANCEL_EXECUTION_MESSAGE_TYPE).await;
    assert_eq!(cancels.len(), 1);
    assert_eq!(h.publisher.count().await, 1);
}

#[tokio::test]
async fn test_cancels_over_subscribed_running_newest_first() {
    let h = harness(&["node1"]);
    let job = Job::new("test", "batch", 2);
    let now = Utc::now();

    for i in 0..4i64 {
        seed(
            &h.store,
            &job,
            &format!("exec{}", i + 1),
            "node1",
            ExecutionState::BidAccepted,
            now + Duration::seconds(i),
        )
        .await;
    }

    h.scheduler.process(&job).await.unwrap();

    assert_eq!(state_of(&h.store, "exec1").await, ExecutionState::BidAccepted);
    assert_eq!(state_of(&h.store, "exec2").await, ExecutionState::BidAccepted);
    assert_eq!(state_of(&h.store, "exec3").await, ExecutionState::Cancelled);
    assert_eq!(state_of(&h.store, "exec4").await, ExecutionState::Cancelled);

    let cancels = h.publisher.of_type(CANCEL_EXECUTION_MESSAGE_TYPE).await;
    assert_eq!(cancels.len(), 2);
}

#[tokio::test]
async fn test_marks_executions_on_departed_nodes_lost() {
    let h = harness(&["node1"]);
    let job = Job::new("test", "batch", 1);

    seed(
        &h.store, &job, "exec1", "node2",
        ExecutionState::BidAccepted,
        Utc::now(),
    )
    .await;

    h.scheduler.process(&job).await.unwrap();

    let failed = h.store.get_execution("exec1").await.unwrap();
    assert_eq!(failed.state, ExecutionState::Failed);
    assert!(failed.message.as_deref().unwrap().contains("lost"));

    // a replacement was placed on the surviving node
    let placements = h.publisher.of_type(ASK_FOR_BID_MESSAGE_TYPE).await;
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].0, "node1");
    // no message was sent to the departed node
    assert!(h.publisher.of_type(CANCEL_EXECUTION_MESSAGE_TYPE).await.is_empty());
}

#[tokio::test]
async fn test_second_pass_on_settled_state_emits_nothing() {
    let h = harness(&["node1"]);
    let job = Job::new("test", "batch", 3);
    let now = Utc::now();

    seed(&h.store, &job, "exec1", "node1", ExecutionState::AskForBidAccepted, now).await;
    seed(
        &h.store, &job, "exec2", "node1",
        ExecutionState::AskForBidAccepted,
        now + Duration::seconds(1),
    )
    .await;
    seed(
        &h.store, &job, "exec3", "node1",
        ExecutionState::BidAccepted,
        now + Duration::seconds(2),
    )
    .await;
    seed(
        &h.store, &job, "exec4", "node1",
        ExecutionState::BidAccepted,
        now + Duration::seconds(3),
    )
    .await;
    seed(
        &h.store, &job, "exec5", "node1",
        ExecutionState::Completed,
        now + Duration::seconds(4),
    )
    .await;

    h.scheduler.process(&job).await.unwrap();
    let after_first = h.publisher.count().await;

    h.scheduler.process(&job).await.unwrap();
    assert_eq!(h.publisher.count().await, after_first);
}

#[tokio::test]
async fn test_no_placement_when_no_nodes_match() {
    let h = harness(&[]);
    let job = Job::new("test", "batch", 2);

    h.scheduler.process(&job).await.unwrap();

    assert_eq!(h.publisher.count().await, 0);
    assert!(h.store.get_executions(&job.id).await.unwrap().is_empty());

    // membership restored on a later pass
    h.selector.add_node(NodeInfo::new("node1")).await;
    h.scheduler.process(&job).await.unwrap();
    assert_eq!(h.publisher.of_type(ASK_FOR_BID_MESSAGE_TYPE).await.len(), 1);
}
