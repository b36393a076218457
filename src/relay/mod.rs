//! Session coordination: the per-connection state machine that turns inbound
//! transport events into registry mutations and outbound message batches.

mod coordinator;

pub use coordinator::{Outbound, Recipient, SessionCoordinator};
