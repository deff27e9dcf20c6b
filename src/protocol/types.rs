//! Message identity, kind and target selectors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity stamped on a message at emission. Strictly increasing per runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out message identities, starting at 1.
#[derive(Debug, Default)]
pub struct MessageIds {
    last: u64,
}

impl MessageIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> MessageId {
        self.last += 1;
        MessageId(self.last)
    }
}

/// Message kind tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Sent by the runtime or by an explicit command
    #[default]
    App,
    /// Raw line read from standard input
    StdinLine,
}

/// Which agents a message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A single agent by name
    Agent(String),
    /// An explicit list of agents, delivered in the listed order
    Group(Vec<String>),
    /// Every registered agent, in registry order
    Broadcast,
}

impl Target {
    pub fn agent(name: impl Into<String>) -> Self {
        Self::Agent(name.into())
    }

    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Group(names.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Agent(name) => write!(f, "{}", name),
            Target::Group(names) => write!(f, "{}", names.join(",")),
            Target::Broadcast => write!(f, "*"),
        }
    }
}
