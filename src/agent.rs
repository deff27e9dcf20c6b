//! Agents (doers): a capability set, an inbox and a handler.
//!
//! Every agent shares the same lifecycle; only the handler differs. New kinds
//! of agent implement [`Handler`]; the router and scheduler never change.

use std::fmt;

use serde::Serialize;

use crate::capability::{Capability, CapabilitySet};
use crate::core::inbox::Inbox;
use crate::error::{Error, Result};
use crate::protocol::{Message, MessageKind};

/// Reacts to a message popped from the owning agent's inbox.
///
/// Returns the lines the runtime should report for this dispatch.
pub trait Handler {
    fn handle(&mut self, agent: &str, message: &Message) -> Vec<String>;
}

/// Built-in handler behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Agent A: notes stdin-originated messages before printing.
    Primary,
    /// Agent B: prints the message.
    Secondary,
    /// Spawned agents: prints with the agent's name and capability.
    Worker,
}

impl Handler for Behavior {
    fn handle(&mut self, agent: &str, message: &Message) -> Vec<String> {
        match self {
            Behavior::Primary => {
                let mut lines = Vec::with_capacity(2);
                if message.kind() == MessageKind::StdinLine {
                    lines.push(format!("[{}]:message from stdin", agent));
                }
                lines.push(format!(
                    "msg {} cap {} [{}]:{}",
                    message.id(),
                    message.capability(),
                    agent,
                    message.payload()
                ));
                lines
            }
            Behavior::Secondary => vec![format!(
                "msg {} cap {} [{}]:{}",
                message.id(),
                message.capability(),
                agent,
                message.payload()
            )],
            Behavior::Worker => vec![format!(
                "[Doer {} / cap={}] {}",
                agent,
                message.capability(),
                message.payload()
            )],
        }
    }
}

/// An isolated unit of execution.
pub struct Agent {
    name: String,
    capabilities: CapabilitySet,
    inbox: Inbox,
    handler: Box<dyn Handler>,
    handled: u64,
}

impl Agent {
    /// Create an agent with an empty capability set.
    pub fn new(name: impl Into<String>, inbox_capacity: usize, handler: impl Handler + 'static) -> Self {
        Self {
            name: name.into(),
            capabilities: CapabilitySet::new(),
            inbox: Inbox::with_capacity(inbox_capacity),
            handler: Box::new(handler),
            handled: 0,
        }
    }

    /// Grant a capability this agent will accept.
    pub fn grant(&mut self, capability: Capability) -> Result<()> {
        self.capabilities
            .insert(capability)
            .map_err(|_| Error::CapabilitySetFull {
                agent: self.name.clone(),
                limit: crate::capability::MAX_CAPABILITIES,
            })
    }

    /// Builder-style [`Agent::grant`].
    pub fn with_capability(mut self, capability: Capability) -> Result<Self> {
        self.grant(capability)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    pub(crate) fn inbox_mut(&mut self) -> &mut Inbox {
        &mut self.inbox
    }

    /// Pop one message and run the handler on it.
    pub(crate) fn dispatch_one(&mut self) -> Option<(Message, Vec<String>)> {
        let message = self.inbox.pop()?;
        let lines = self.handler.handle(&self.name, &message);
        self.handled += 1;
        Some((message, lines))
    }

    pub fn stats(&self) -> AgentStats {
        AgentStats {
            name: self.name.clone(),
            capabilities: self.capabilities.iter().map(|c| c.get()).collect(),
            pending: self.inbox.len(),
            inbox_capacity: self.inbox.capacity(),
            handled: self.handled,
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("pending", &self.inbox.len())
            .field("handled", &self.handled)
            .finish()
    }
}

/// Per-agent statistics.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStats {
    pub name: String,
    pub capabilities: Vec<u64>,
    pub pending: usize,
    pub inbox_capacity: usize,
    pub handled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityMinter, MAX_CAPABILITIES};
    use crate::protocol::{Draft, MessageIds, Target};

    /// Records payloads so tests can see what a handler was given.
    struct Recorder(std::rc::Rc<std::cell::RefCell<Vec<String>>>);

    impl Handler for Recorder {
        fn handle(&mut self, _agent: &str, message: &Message) -> Vec<String> {
            self.0.borrow_mut().push(message.payload().to_string());
            Vec::new()
        }
    }

    #[test]
    fn test_primary_marks_stdin_lines() {
        let cap = CapabilityMinter::new().mint().unwrap();
        let mut ids = MessageIds::new();
        let msg = Draft::new(cap, Target::agent("A"), "hello")
            .with_kind(MessageKind::StdinLine)
            .stamp(ids.next_id(), "A");

        let lines = Behavior::Primary.handle("A", &msg);
        assert_eq!(lines, vec!["[A]:message from stdin", "msg 1 cap 1 [A]:hello"]);

        let lines = Behavior::Secondary.handle("B", &msg);
        assert_eq!(lines, vec!["msg 1 cap 1 [B]:hello"]);
    }

    #[test]
    fn test_worker_format() {
        let cap = CapabilityMinter::new().mint().unwrap();
        let msg = Draft::new(cap, Target::agent("C"), "yo").stamp(MessageIds::new().next_id(), "C");

        assert_eq!(Behavior::Worker.handle("C", &msg), vec!["[Doer C / cap=1] yo"]);
    }

    #[test]
    fn test_custom_handler_dispatch() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut minter = CapabilityMinter::new();
        let cap = minter.mint().unwrap();
        let mut agent = Agent::new("A", 4, Recorder(seen.clone()))
            .with_capability(cap)
            .unwrap();

        let mut ids = MessageIds::new();
        let draft = Draft::new(cap, Target::agent("A"), "ping");
        agent.inbox_mut().push(draft.stamp(ids.next_id(), "A")).unwrap();

        let (msg, _) = agent.dispatch_one().unwrap();
        assert_eq!(msg.payload(), "ping");
        assert_eq!(*seen.borrow(), vec!["ping"]);
        assert_eq!(agent.stats().handled, 1);
        assert!(agent.dispatch_one().is_none());
    }

    #[test]
    fn test_grant_overflow_is_error() {
        let mut minter = CapabilityMinter::new();
        let mut agent = Agent::new("A", 4, Behavior::Primary);
        for _ in 0..MAX_CAPABILITIES {
            agent.grant(minter.mint().unwrap()).unwrap();
        }

        let err = agent.grant(minter.mint().unwrap()).unwrap_err();
        assert!(matches!(err, Error::CapabilitySetFull { .. }));
    }
}
