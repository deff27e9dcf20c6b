//! CLI commands for doer using clap.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::agent::{Agent, AgentStats};
use crate::config::{load_settings, Settings};
use crate::core::LedgerSnapshot;
use crate::runtime::Runtime;
use crate::transcript::{Transcript, WriterTranscript};

/// doer - capability-gated message runtime.
#[derive(Parser)]
#[command(name = "doer")]
#[command(version = "0.1.0")]
#[command(about = "doer - agents, capabilities and a message ledger that must balance", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Seed the runtime, then read commands from stdin (default)
    Run,

    /// Run only the seed cycle and fail if the ledger does not balance
    Check,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self, settings: Settings) -> Result<()> {
        match self.command.unwrap_or(Command::Run) {
            Command::Run => cmd_run(settings).await,
            Command::Check => cmd_check(settings),
        }
    }
}

/// Load settings for the process.
pub fn settings() -> Result<Settings> {
    Ok(load_settings()?)
}

fn seeded(settings: Settings, transcript: &mut dyn Transcript) -> Result<Runtime> {
    let mut runtime = Runtime::with_seed_agents(settings)?;
    runtime.seed(transcript)?;
    runtime.cycle(transcript)?;
    Ok(runtime)
}

async fn cmd_run(settings: Settings) -> Result<()> {
    let mut transcript = WriterTranscript::new(std::io::stdout());
    let mut runtime = seeded(settings, &mut transcript)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    runtime.drive(stdin, &mut transcript).await?;

    tracing::info!(snapshot = %runtime.report(), "Runtime stopped");
    Ok(())
}

/// What `doer check` prints once the seed cycle balances.
#[derive(Debug, Serialize)]
struct CheckReport {
    ledger: LedgerSnapshot,
    agents: Vec<AgentStats>,
}

impl CheckReport {
    fn new(runtime: &Runtime) -> Self {
        Self {
            ledger: runtime.report(),
            agents: runtime.registry().iter().map(Agent::stats).collect(),
        }
    }
}

fn cmd_check(settings: Settings) -> Result<()> {
    let mut transcript = WriterTranscript::new(std::io::stdout());
    let runtime = seeded(settings, &mut transcript)?;

    let report = CheckReport::new(&runtime);
    if !report.ledger.is_balanced() {
        bail!("ledger does not balance: {}", report.ledger);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
