//! Compute-node side of the orchestrator protocol.
//!
//! - [`MessageHandler`]: turns inbound envelopes into execution store
//!   mutations.
//! - [`Bidder`]: runs the bid strategy chain for a newly created
//!   execution and records the verdict.

pub mod bidder;
pub mod handler;

pub use bidder::Bidder;
pub use handler::MessageHandler;
