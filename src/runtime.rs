//! The runtime: one minter, one router, one scheduler and one ledger.
//!
//! Events are processed one at a time. Every message an event causes is
//! drained before the next event is read, and the ledger is reported after
//! each drain.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::agent::{Agent, Behavior, Handler};
use crate::capability::{Capability, CapabilityMinter};
use crate::config::Settings;
use crate::core::{Ledger, LedgerSnapshot, Outcome, Registry, Router, Scheduler};
use crate::error::{Error, Result};
use crate::input::{parse_line, Command, BROADCAST_TARGET};
use crate::protocol::{Draft, Target};
use crate::transcript::{Event, Transcript};

/// Name reserved for the runtime itself.
pub const ROOT_NAME: &str = "root";

/// Names no agent may take: the runtime's own, and the broadcast selector,
/// which would make the agent unaddressable on its own.
pub const RESERVED_NAMES: [&str; 2] = [ROOT_NAME, BROADCAST_TARGET];

fn check_name(name: &str) -> Result<()> {
    if RESERVED_NAMES.contains(&name) {
        return Err(Error::ReservedName(name.to_string()));
    }
    Ok(())
}

/// Whether the driving loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct Runtime {
    settings: Settings,
    minter: CapabilityMinter,
    router: Router,
    scheduler: Scheduler,
    ledger: Ledger,
}

impl Runtime {
    /// A runtime with an empty registry.
    pub fn new(settings: Settings) -> Self {
        let registry = Registry::new(settings.max_agents);
        Self {
            settings,
            minter: CapabilityMinter::new(),
            router: Router::new(),
            scheduler: Scheduler::new(registry),
            ledger: Ledger::new(),
        }
    }

    /// A runtime with agent A accepting capability 1 and agent B accepting 2.
    pub fn with_seed_agents(settings: Settings) -> Result<Self> {
        let mut runtime = Self::new(settings);
        let one = runtime.mint()?;
        let two = runtime.mint()?;
        runtime.register("A", Behavior::Primary, &[one])?;
        runtime.register("B", Behavior::Secondary, &[two])?;
        Ok(runtime)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        self.scheduler.registry()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Mint a fresh capability.
    pub fn mint(&mut self) -> Result<Capability> {
        self.minter.mint()
    }

    /// Resolve a capability number named by external input.
    pub fn capability(&self, raw: u64) -> Result<Capability> {
        self.minter.issued(raw).ok_or(Error::UnknownCapability(raw))
    }

    /// Register an agent at the end of the registry.
    pub fn register(
        &mut self,
        name: &str,
        handler: impl Handler + 'static,
        capabilities: &[Capability],
    ) -> Result<()> {
        check_name(name)?;
        let mut agent = Agent::new(name, self.settings.inbox_capacity, handler);
        for capability in capabilities {
            agent.grant(*capability)?;
        }
        self.scheduler.registry_mut().add(agent)
    }

    /// Create a worker agent holding a freshly minted capability.
    ///
    /// The capability is minted only after the name and registry size have
    /// been checked, so a failed spawn never consumes a token.
    pub fn spawn(&mut self, name: &str, transcript: &mut dyn Transcript) -> Result<Capability> {
        check_name(name)?;
        let registry = self.scheduler.registry();
        if registry.find(name).is_some() {
            return Err(Error::DuplicateAgent(name.to_string()));
        }
        if registry.len() >= registry.max_agents() {
            return Err(Error::RegistryFull(registry.max_agents()));
        }

        let capability = self.mint()?;
        self.register(name, Behavior::Worker, &[capability])?;
        tracing::info!(agent = name, cap = capability.get(), "Spawned agent");
        transcript.record(Event::Spawned {
            name: name.to_string(),
            capability: capability.get(),
        });
        Ok(capability)
    }

    /// Route a draft to its targets.
    pub fn route(&mut self, draft: &Draft, transcript: &mut dyn Transcript) -> Vec<Outcome> {
        self.router.route(
            draft,
            self.scheduler.registry_mut(),
            &mut self.ledger,
            transcript,
        )
    }

    /// Emit the fixed startup sequence. Does not drain.
    pub fn seed(&mut self, transcript: &mut dyn Transcript) -> Result<()> {
        let one = self.capability(1)?;
        let two = self.capability(2)?;
        let drafts = [
            Draft::new(one, Target::Broadcast, "hi Tony."),
            Draft::new(one, Target::agent("A"), "hi 大哥."),
            Draft::new(two, Target::agent("B"), "hi 小弟."),
            Draft::new(two, Target::group(["A", "B"]), "both"),
        ];
        for draft in &drafts {
            self.route(draft, transcript);
        }
        Ok(())
    }

    /// Whether any inbox holds a message.
    pub fn has_work(&self) -> bool {
        self.scheduler.has_work()
    }

    /// Drain every inbox. Returns how many messages were handled.
    pub fn drain(&mut self, transcript: &mut dyn Transcript) -> usize {
        self.scheduler.drain_all(&mut self.ledger, transcript)
    }

    /// Current ledger state.
    pub fn report(&self) -> LedgerSnapshot {
        self.ledger.report(self.scheduler.registry())
    }

    /// Current ledger state; an imbalance is an error.
    pub fn reconcile(&self) -> Result<LedgerSnapshot> {
        self.ledger.reconcile(self.scheduler.registry())
    }

    /// Drain, then record and check the ledger.
    pub fn cycle(&mut self, transcript: &mut dyn Transcript) -> Result<LedgerSnapshot> {
        self.drain(transcript);
        let snapshot = self.report();
        transcript.record(Event::Balance(snapshot));
        self.reconcile()
    }

    /// Apply one parsed input command. Does not drain.
    pub fn dispatch(&mut self, command: Command, transcript: &mut dyn Transcript) -> Flow {
        match command {
            Command::Send {
                target,
                capability,
                kind,
                payload,
            } => match self.capability(capability) {
                Ok(capability) => {
                    let draft = Draft::new(capability, target, payload).with_kind(kind);
                    self.route(&draft, transcript);
                }
                Err(e) => tracing::warn!("Ignoring input: {}", e),
            },
            Command::Spawn(name) => {
                if let Err(e) = self.spawn(&name, transcript) {
                    tracing::warn!("Spawn of '{}' refused: {}", name, e);
                }
            }
            Command::Terminate => return Flow::Stop,
            Command::Abstain => {}
        }
        Flow::Continue
    }

    /// Read lines until EOF or a terminate command, one full cycle per line.
    ///
    /// A line that is not valid UTF-8 abstains like any other malformed input.
    pub async fn drive<R>(&mut self, mut reader: R, transcript: &mut dyn Transcript) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let command = match std::str::from_utf8(&buf) {
                Ok(line) => parse_line(line),
                Err(e) => {
                    tracing::warn!("Ignoring undecodable input line: {}", e);
                    Command::Abstain
                }
            };
            if self.dispatch(command, transcript) == Flow::Stop {
                tracing::info!("Terminate requested");
                break;
            }
            self.cycle(transcript)?;
        }
        Ok(())
    }
}
