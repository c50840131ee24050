use std::collections::HashMap;

use crate::models::{Execution, ExecutionState, NodeInfo};

/// A set of execution records keyed by execution id.
///
/// Value semantics throughout: every operation returns a new set and
/// leaves its inputs untouched. Where ordering matters the records are
/// sorted explicitly by (update time, id) rather than relying on map
/// iteration order.
#[derive(Debug, Clone, Default)]
pub struct ExecSet {
    executions: HashMap<String, Execution>,
}

impl ExecSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, execution: Execution) {
        self.executions.insert(execution.id.clone(), execution);
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    pub fn has(&self, execution_id: &str) -> bool {
        self.executions.contains_key(execution_id)
    }

    pub fn get(&self, execution_id: &str) -> Option<&Execution> {
        self.executions.get(execution_id)
    }

    pub fn keys(&self) -> Vec<String> {
        self.executions.keys().cloned().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &Execution> {
        self.executions.values()
    }

    fn filter(&self, predicate: impl Fn(&Execution) -> bool) -> ExecSet {
        self.executions
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Records whose state equals `state`.
    pub fn filter_by_state(&self, state: ExecutionState) -> ExecSet {
        self.filter(|e| e.state == state)
    }

    /// Records whose state admits further transitions.
    pub fn filter_non_terminal(&self) -> ExecSet {
        self.filter(|e| !e.state.is_terminal())
    }

    /// Records in a running state (bid accepted or awaiting approval).
    pub fn filter_running(&self) -> ExecSet {
        self.filter(|e| e.state.is_running())
    }

    pub fn filter_failed(&self) -> ExecSet {
        self.filter_by_state(ExecutionState::Failed)
    }

    /// Key-union of two sets. On key collision the record from `other`
    /// wins, which lets callers overlay fresh updates onto a snapshot.
    pub fn union(&self, other: &ExecSet) -> ExecSet {
        let mut merged = self.executions.clone();
        for (id, execution) in &other.executions {
            merged.insert(id.clone(), execution.clone());
        }
        ExecSet { executions: merged }
    }

    pub fn count_by_state(&self) -> HashMap<ExecutionState, usize> {
        let mut counts = HashMap::new();
        for execution in self.executions.values() {
            *counts.entry(execution.state).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_completed(&self) -> usize {
        self.executions
            .values()
            .filter(|e| e.state == ExecutionState::Completed)
            .count()
    }

    /// The most recently updated record. Ties on update time break by
    /// id, lexicographically largest winning, so the result is stable.
    pub fn latest(&self) -> Option<&Execution> {
        self.executions
            .values()
            .max_by(|a, b| (a.update_time, &a.id).cmp(&(b.update_time, &b.id)))
    }

    /// Partition by node membership: executions whose node id appears in
    /// `node_infos` are healthy, the rest are lost.
    pub fn filter_by_node_health(
        &self,
        node_infos: &HashMap<String, NodeInfo>,
    ) -> (ExecSet, ExecSet) {
        let healthy = self.filter(|e| node_infos.contains_key(&e.node_id));
        let lost = self.filter(|e| !node_infos.contains_key(&e.node_id));
        (healthy, lost)
    }

    /// Keep the `desired` oldest records; the newer remainder is the
    /// over-subscribed tail. Older executions are more settled, so
    /// redundancy is shed newest-first.
    pub fn filter_by_over_subscriptions(&self, desired: usize) -> (ExecSet, ExecSet) {
        let mut sorted: Vec<&Execution> = self.executions.values().collect();
        sorted.sort_by(|a, b| (a.update_time, &a.id).cmp(&(b.update_time, &b.id)));

        let remaining: ExecSet = sorted.iter().take(desired).map(|e| (*e).clone()).collect();
        let over: ExecSet = sorted.iter().skip(desired).map(|e| (*e).clone()).collect();
        (remaining, over)
    }

    /// Classify non-terminal members against a desired replica count.
    pub fn filter_by_approval_status(&self, desired: usize) -> ApprovalStatus {
        let running = self.filter_by_state(ExecutionState::BidAccepted);
        let awaiting = self.filter_by_state(ExecutionState::AskForBidAccepted);

        let needed = desired.saturating_sub(running.len());
        let (to_approve, to_reject) = awaiting.filter_by_over_subscriptions(needed);

        let pending = self.filter(|e| {
            !e.state.is_terminal()
                && e.state != ExecutionState::BidAccepted
                && e.state != ExecutionState::AskForBidAccepted
        });

        ApprovalStatus {
            running,
            to_approve,
            to_reject,
            pending,
        }
    }
}

impl FromIterator<Execution> for ExecSet {
    fn from_iter<I: IntoIterator<Item = Execution>>(iter: I) -> Self {
        let mut set = ExecSet::new();
        for execution in iter {
            set.insert(execution);
        }
        set
    }
}

impl std::fmt::Display for ExecSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.executions.keys().collect();
        keys.sort();
        write!(f, "len({}) [", self.executions.len())?;
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {}", key, self.executions[*key].state)?;
        }
        write!(f, "]")
    }
}

/// Disjoint buckets produced by [`ExecSet::filter_by_approval_status`].
#[derive(Debug, Clone)]
pub struct ApprovalStatus {
    /// Already running with an approved bid.
    pub running: ExecSet,
    /// Awaiting approval, within the replica budget (oldest first).
    pub to_approve: ExecSet,
    /// Awaiting approval, beyond the replica budget.
    pub to_reject: ExecSet,
    /// Live but not yet classifiable (bid still in flight).
    pub pending: ExecSet,
}

impl ApprovalStatus {
    /// Executions that count against the job's replica target.
    pub fn active_count(&self) -> usize {
        self.running.len() + self.to_approve.len() + self.pending.len()
    }
}
