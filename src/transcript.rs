//! Observable runtime events and where they go.
//!
//! The runtime never prints. It records [`Event`]s into a [`Transcript`]; the
//! binary writes them to stdout and tests collect them in a `Vec`.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::core::ledger::LedgerSnapshot;
use crate::core::routing::DropReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A handler consumed a message.
    Handled {
        agent: String,
        id: u64,
        capability: u64,
        lines: Vec<String>,
    },
    /// A message was dropped at emission.
    Dropped {
        id: u64,
        capability: u64,
        to: String,
        payload: String,
        reason: DropReason,
    },
    /// A new agent joined the registry.
    Spawned { name: String, capability: u64 },
    /// Ledger state after a full drain.
    Balance(LedgerSnapshot),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Handled { lines, .. } => write!(f, "{}", lines.join("\n")),
            Event::Dropped {
                id,
                capability,
                to,
                payload,
                reason,
            } => write!(
                f,
                "[DROP] msg={} cap={} to={} payload=\"{}\" reason={}",
                id, capability, to, payload, reason
            ),
            Event::Spawned { name, capability } => {
                write!(f, "[root] spawned Doer '{}' (cap={})", name, capability)
            }
            Event::Balance(snapshot) => write!(f, "{}", snapshot),
        }
    }
}

/// Sink for runtime events.
pub trait Transcript {
    fn record(&mut self, event: Event);
}

impl Transcript for Vec<Event> {
    fn record(&mut self, event: Event) {
        self.push(event);
    }
}

/// Writes each event as text, one event per line.
pub struct WriterTranscript<W: Write> {
    writer: W,
}

impl<W: Write> WriterTranscript<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transcript for WriterTranscript<W> {
    fn record(&mut self, event: Event) {
        if let Event::Handled { lines, .. } = &event {
            if lines.is_empty() {
                return;
            }
        }
        if let Err(e) = writeln!(self.writer, "{}", event).and_then(|_| self.writer.flush()) {
            tracing::warn!("Failed to write transcript line: {}", e);
        }
    }
}
