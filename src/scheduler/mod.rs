//! Orchestrator-side scheduling over execution populations.

pub mod batch;
pub mod exec_set;
pub mod selector;

pub use batch::Scheduler;
pub use exec_set::{ApprovalStatus, ExecSet};
pub use selector::{NodeSelector, StaticNodeSelector};
