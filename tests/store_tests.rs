use flotilla::models::{Event, Execution, ExecutionState, Job};
use flotilla::store::{ExecutionStore, InMemoryExecutionStore, UpdateExecutionStateRequest};
use flotilla::FlotillaError;

fn make_execution(job: &Job) -> Execution {
    Execution::new(job.clone(), "node1")
}

#[tokio::test]
async fn test_create_and_get() {
    let store = InMemoryExecutionStore::new();
    let job = Job::new("test", "batch", 1);
    let execution = make_execution(&job);
    let id = execution.id.clone();

    store.create_execution(execution).await.unwrap();

    let fetched = store.get_execution(&id).await.unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.state, ExecutionState::New);
    assert_eq!(fetched.job.id, job.id);
    assert_eq!(fetched.node_id, "node1");
}

#[tokio::test]
async fn test_create_duplicate_fails() {
    let store = InMemoryExecutionStore::new();
    let execution = make_execution(&Job::new("test", "batch", 1));

    store.create_execution(execution.clone()).await.unwrap();
    let err = store.create_execution(execution).await.unwrap_err();
    assert!(matches!(err, FlotillaError::ExecutionAlreadyExists(_)));
}

#[tokio::test]
async fn test_get_missing_execution() {
    let store = InMemoryExecutionStore::new();
    let err = store.get_execution("nope").await.unwrap_err();
    assert!(matches!(err, FlotillaError::ExecutionNotFound(_)));
}

#[tokio::test]
async fn test_get_executions_by_job() {
    let store = InMemoryExecutionStore::new();
    let job1 = Job::new("one", "batch", 2);
    let job2 = Job::new("two", "batch", 1);

    store.create_execution(make_execution(&job1)).await.unwrap();
    store.create_execution(make_execution(&job1)).await.unwrap();
    store.create_execution(make_execution(&job2)).await.unwrap();

    assert_eq!(store.len().await, 3);
    assert_eq!(store.get_executions(&job1.id).await.unwrap().len(), 2);
    assert_eq!(store.get_executions(&job2.id).await.unwrap().len(), 1);
    assert!(store.get_executions("unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conditional_update_applies() {
    let store = InMemoryExecutionStore::new();
    let execution = make_execution(&Job::new("test", "batch", 1));
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    store
        .update_execution_state(
            UpdateExecutionStateRequest::new(&id, ExecutionState::BidAccepted)
                .with_expected_states(vec![ExecutionState::New, ExecutionState::AskForBidAccepted])
                .with_message("approved")
                .with_events(vec![Event::new("bid approved")]),
        )
        .await
        .unwrap();

    let updated = store.get_execution(&id).await.unwrap();
    assert_eq!(updated.state, ExecutionState::BidAccepted);
    assert_eq!(updated.message.as_deref(), Some("approved"));
    assert_eq!(updated.events.len(), 1);
    assert_eq!(updated.events[0].message, "bid approved");
}

#[tokio::test]
async fn test_conditional_update_rejected_leaves_record_untouched() {
    let store = InMemoryExecutionStore::new();
    let mut execution = make_execution(&Job::new("test", "batch", 1));
    execution.state = ExecutionState::Cancelled;
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    let before = store.get_execution(&id).await.unwrap();

    let err = store
        .update_execution_state(
            UpdateExecutionStateRequest::new(&id, ExecutionState::BidAccepted)
                .with_expected_states(vec![ExecutionState::New, ExecutionState::AskForBidAccepted])
                .with_events(vec![Event::new("bid approved")]),
        )
        .await
        .unwrap_err();

    assert!(err.is_invalid_state());

    let after = store.get_execution(&id).await.unwrap();
    assert_eq!(after.state, ExecutionState::Cancelled);
    assert_eq!(after.update_time, before.update_time);
    assert!(after.events.is_empty());
}

#[tokio::test]
async fn test_unconditional_update_ignores_current_state() {
    let store = InMemoryExecutionStore::new();
    let mut execution = make_execution(&Job::new("test", "batch", 1));
    execution.state = ExecutionState::BidAccepted;
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    store
        .update_execution_state(
            UpdateExecutionStateRequest::new(&id, ExecutionState::Cancelled)
                .with_message("user requested cancellation"),
        )
        .await
        .unwrap();

    let updated = store.get_execution(&id).await.unwrap();
    assert_eq!(updated.state, ExecutionState::Cancelled);
}

#[tokio::test]
async fn test_update_time_is_non_decreasing() {
    let store = InMemoryExecutionStore::new();
    let execution = make_execution(&Job::new("test", "batch", 1));
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    let mut last = store.get_execution(&id).await.unwrap().update_time;
    for state in [
        ExecutionState::AskForBid,
        ExecutionState::AskForBidAccepted,
        ExecutionState::BidAccepted,
        ExecutionState::Completed,
    ] {
        store
            .update_execution_state(UpdateExecutionStateRequest::new(&id, state))
            .await
            .unwrap();
        let now = store.get_execution(&id).await.unwrap().update_time;
        assert!(now >= last);
        last = now;
    }
}

#[tokio::test]
async fn test_events_are_append_only() {
    let store = InMemoryExecutionStore::new();
    let execution = make_execution(&Job::new("test", "batch", 1));
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    store
        .update_execution_state(
            UpdateExecutionStateRequest::new(&id, ExecutionState::AskForBid)
                .with_events(vec![Event::new("first")]),
        )
        .await
        .unwrap();
    store
        .update_execution_state(
            UpdateExecutionStateRequest::new(&id, ExecutionState::AskForBidAccepted)
                .with_events(vec![Event::new("second"), Event::new("third")]),
        )
        .await
        .unwrap();

    let updated = store.get_execution(&id).await.unwrap();
    let messages: Vec<&str> = updated.events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_duplicate_guarded_update_is_a_rejected_no_op() {
    let store = InMemoryExecutionStore::new();
    let execution = make_execution(&Job::new("test", "batch", 1));
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    let request = UpdateExecutionStateRequest::new(&id, ExecutionState::BidAccepted)
        .with_expected_states(vec![ExecutionState::New, ExecutionState::AskForBidAccepted]);

    store.update_execution_state(request.clone()).await.unwrap();
    let first = store.get_execution(&id).await.unwrap();

    // second delivery of the same message
    let err = store.update_execution_state(request).await.unwrap_err();
    assert!(err.is_invalid_state());

    let second = store.get_execution(&id).await.unwrap();
    assert_eq!(second.state, first.state);
    assert_eq!(second.update_time, first.update_time);
}

#[tokio::test]
async fn test_delete_execution() {
    let store = InMemoryExecutionStore::new();
    let execution = make_execution(&Job::new("test", "batch", 1));
    let id = execution.id.clone();
    store.create_execution(execution).await.unwrap();

    store.delete_execution(&id).await.unwrap();
    assert!(store.get_execution(&id).await.is_err());

    let err = store.delete_execution(&id).await.unwrap_err();
    assert!(matches!(err, FlotillaError::ExecutionNotFound(_)));
}
