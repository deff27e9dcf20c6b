//! Error types for the doer runtime.
//!
//! Message-level failures (capability rejection, inbox overflow) are not
//! errors: they resolve into a drop and are reported through
//! [`crate::core::routing::Outcome`]. This type covers everything else.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Agent '{0}' already exists")]
    DuplicateAgent(String),

    #[error("Agent name '{0}' is reserved")]
    ReservedName(String),

    #[error("Registry is full ({0} agents)")]
    RegistryFull(usize),

    #[error("Capability set of '{agent}' is full ({limit} capabilities)")]
    CapabilitySetFull { agent: String, limit: usize },

    #[error("Capability token space exhausted")]
    CapabilitiesExhausted,

    #[error("Capability {0} was never issued")]
    UnknownCapability(u64),

    #[error(
        "Ledger imbalance: created={created} handled={handled} dropped={dropped} pending={pending} balance={balance}"
    )]
    Imbalance {
        created: u64,
        handled: u64,
        dropped: u64,
        pending: u64,
        balance: i64,
    },
}
