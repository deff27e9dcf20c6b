//! Message emission and routing.
//!
//! `route` resolves a draft's target selector against the registry and calls
//! `emit` once per resolved agent. `emit` is the only place messages come
//! into existence: it stamps a fresh identity, counts the message as created,
//! checks the capability and then either enqueues or drops.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::capability;
use crate::core::ledger::Ledger;
use crate::core::scheduler::Registry;
use crate::protocol::{Draft, Message, MessageId, MessageIds, Target};
use crate::transcript::{Event, Transcript};

/// Why a message was dropped. Both reasons count the same in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The target does not hold the attached capability.
    CapabilityRejected,
    /// The target's inbox was full.
    InboxOverflow,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::CapabilityRejected => write!(f, "capability_rejected"),
            DropReason::InboxOverflow => write!(f, "inbox_overflow"),
        }
    }
}

/// What happened to one emitted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Accepted into the target's inbox.
    Pending(MessageId),
    /// Dropped at emission; permanent.
    Dropped { id: MessageId, reason: DropReason },
}

impl Outcome {
    pub fn id(&self) -> MessageId {
        match self {
            Outcome::Pending(id) => *id,
            Outcome::Dropped { id, .. } => *id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }
}

/// Emits and routes messages. Owns the message identity sequence.
#[derive(Debug, Default)]
pub struct Router {
    ids: MessageIds,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one copy of `draft` to `agent`.
    pub fn emit(
        &mut self,
        draft: &Draft,
        agent: &mut Agent,
        ledger: &mut Ledger,
        transcript: &mut dyn Transcript,
    ) -> Outcome {
        let id = self.ids.next_id();
        ledger.record_created();
        let message = draft.stamp(id, agent.name());

        if !capability::validate(message.capability(), agent.capabilities()) {
            return record_drop(&message, DropReason::CapabilityRejected, ledger, transcript);
        }

        match agent.inbox_mut().push(message) {
            Ok(()) => {
                ledger.record_enqueued();
                tracing::debug!(
                    msg = id.get(),
                    cap = draft.capability.get(),
                    to = agent.name(),
                    "Enqueued message"
                );
                Outcome::Pending(id)
            }
            Err(message) => record_drop(&message, DropReason::InboxOverflow, ledger, transcript),
        }
    }

    /// Resolve `draft.target` and emit once per resolved agent.
    ///
    /// Unknown names are skipped; nothing is emitted for them.
    pub fn route(
        &mut self,
        draft: &Draft,
        registry: &mut Registry,
        ledger: &mut Ledger,
        transcript: &mut dyn Transcript,
    ) -> Vec<Outcome> {
        let targets = resolve(&draft.target, registry);
        let mut outcomes = Vec::with_capacity(targets.len());

        for index in targets {
            if let Some(agent) = registry.get_mut(index) {
                outcomes.push(self.emit(draft, agent, ledger, transcript));
            }
        }

        outcomes
    }
}

fn record_drop(
    message: &Message,
    reason: DropReason,
    ledger: &mut Ledger,
    transcript: &mut dyn Transcript,
) -> Outcome {
    ledger.record_drop(reason);
    tracing::info!(
        msg = message.id().get(),
        cap = message.capability().get(),
        to = message.to(),
        %reason,
        "Dropped message"
    );
    transcript.record(Event::Dropped {
        id: message.id().get(),
        capability: message.capability().get(),
        to: message.to().to_string(),
        payload: message.payload().to_string(),
        reason,
    });
    Outcome::Dropped {
        id: message.id(),
        reason,
    }
}

/// Registry indices a target selector resolves to, in delivery order.
fn resolve(target: &Target, registry: &Registry) -> Vec<usize> {
    match target {
        Target::Broadcast => (0..registry.len()).collect(),
        Target::Agent(name) => lookup(name, registry).into_iter().collect(),
        Target::Group(names) => {
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                if let Some(index) = lookup(name, registry) {
                    if !indices.contains(&index) {
                        indices.push(index);
                    }
                }
            }
            indices
        }
    }
}

fn lookup(name: &str, registry: &Registry) -> Option<usize> {
    let index = registry.position(name);
    if index.is_none() {
        tracing::warn!("Unknown target agent '{}', nothing emitted", name);
    }
    index
}
