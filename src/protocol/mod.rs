//! Message protocol for the doer runtime.
//!
//! - Message identities and the id sequence
//! - Kind tags and target selectors
//! - Drafts (pre-emission) and stamped messages

pub mod envelope;
pub mod types;

pub use envelope::{Draft, Message};
pub use types::{MessageId, MessageIds, MessageKind, Target};
