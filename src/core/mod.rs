//! Core module - the message pipeline.
//!
//! - Bounded per-agent inboxes
//! - Emission and routing through the capability gate
//! - Cooperative scheduler and agent registry
//! - Conservation ledger

pub mod inbox;
pub mod ledger;
pub mod routing;
pub mod scheduler;

pub use inbox::Inbox;
pub use ledger::{Ledger, LedgerSnapshot};
pub use routing::{DropReason, Outcome, Router};
pub use scheduler::{Registry, Scheduler};
