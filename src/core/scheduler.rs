//! Cooperative scheduler over an ordered agent registry.
//!
//! Agents are serviced in registry (insertion) order. A round pops at most one
//! message per agent; a drain repeats rounds until every inbox is empty. The
//! scheduler only moves messages and counts them as handled. It never
//! validates capabilities or touches capability sets.

use crate::agent::Agent;
use crate::core::ledger::Ledger;
use crate::error::{Error, Result};
use crate::transcript::{Event, Transcript};

/// Default upper bound on registered agents.
pub const DEFAULT_MAX_AGENTS: usize = 8;

/// Ordered, append-only set of agents with unique names.
#[derive(Debug)]
pub struct Registry {
    agents: Vec<Agent>,
    max_agents: usize,
}

impl Registry {
    pub fn new(max_agents: usize) -> Self {
        Self {
            agents: Vec::with_capacity(max_agents),
            max_agents,
        }
    }

    /// Append an agent. Names must be unique.
    pub fn add(&mut self, agent: Agent) -> Result<()> {
        if self.position(agent.name()).is_some() {
            return Err(Error::DuplicateAgent(agent.name().to_string()));
        }
        if self.agents.len() >= self.max_agents {
            return Err(Error::RegistryFull(self.max_agents));
        }
        tracing::debug!(
            agent = agent.name(),
            capabilities = %agent.capabilities(),
            "Registered agent"
        );
        self.agents.push(agent);
        Ok(())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.name() == name)
    }

    pub fn find(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn get(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Agent> {
        self.agents.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn max_agents(&self) -> usize {
        self.max_agents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Agent names in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }
}

/// Drains inboxes in fixed registry order.
#[derive(Debug)]
pub struct Scheduler {
    registry: Registry,
}

impl Scheduler {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// True if any inbox holds a message.
    pub fn has_work(&self) -> bool {
        self.registry.iter().any(|a| !a.inbox().is_empty())
    }

    /// One pass over the registry. Returns how many messages were handled.
    pub fn round(&mut self, ledger: &mut Ledger, transcript: &mut dyn Transcript) -> usize {
        let mut handled = 0;

        for agent in self.registry.agents.iter_mut() {
            if let Some((message, lines)) = agent.dispatch_one() {
                ledger.record_handled();
                handled += 1;
                tracing::debug!(
                    msg = message.id().get(),
                    agent = agent.name(),
                    "Handled message"
                );
                transcript.record(Event::Handled {
                    agent: agent.name().to_string(),
                    id: message.id().get(),
                    capability: message.capability().get(),
                    lines,
                });
            }
        }

        handled
    }

    /// Run rounds until no inbox holds a message. Returns the total handled.
    pub fn drain_all(&mut self, ledger: &mut Ledger, transcript: &mut dyn Transcript) -> usize {
        let mut total = 0;
        while self.has_work() {
            total += self.round(ledger, transcript);
        }
        total
    }
}
