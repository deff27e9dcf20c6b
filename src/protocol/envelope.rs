//! Drafts and emitted messages.
//!
//! A [`Draft`] is what a caller hands to the router: capability, target,
//! payload and kind, but no identity. The router turns it into one
//! [`Message`] per resolved target, each with its own [`MessageId`].

use std::sync::Arc;

use crate::capability::Capability;

use super::types::{MessageId, MessageKind, Target};

/// A message that has not been emitted yet.
#[derive(Debug, Clone)]
pub struct Draft {
    pub capability: Capability,
    pub target: Target,
    pub kind: MessageKind,
    pub payload: Arc<str>,
}

impl Draft {
    /// Create an application message draft.
    pub fn new(capability: Capability, target: Target, payload: impl Into<Arc<str>>) -> Self {
        Self {
            capability,
            target,
            kind: MessageKind::App,
            payload: payload.into(),
        }
    }

    /// Set the kind tag.
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Stamp an identity and address the result to one concrete agent.
    pub(crate) fn stamp(&self, id: MessageId, to: &str) -> Message {
        Message {
            id,
            capability: self.capability,
            kind: self.kind,
            to: to.to_string(),
            payload: Arc::clone(&self.payload),
        }
    }
}

/// An emitted message. Immutable once stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    capability: Capability,
    kind: MessageKind,
    to: String,
    payload: Arc<str>,
}

impl Message {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Name of the agent this copy was addressed to.
    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}
