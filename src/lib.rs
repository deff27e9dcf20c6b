//! doer library root.
//!
//! A single-process runtime where agents exchange messages only through
//! capability-gated emission, drained by a cooperative scheduler and
//! accounted for by a ledger that must always balance.

pub mod agent;
pub mod capability;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod logging;
pub mod protocol;
pub mod runtime;
pub mod transcript;

pub use agent::{Agent, AgentStats, Behavior, Handler};
pub use capability::{Capability, CapabilityMinter, CapabilitySet};
pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use crate::core::{DropReason, Inbox, Ledger, LedgerSnapshot, Outcome, Registry, Router, Scheduler};
pub use error::{Error, Result};
pub use protocol::{Draft, Message, MessageId, MessageKind, Target};
pub use runtime::Runtime;
pub use transcript::{Event, Transcript};
