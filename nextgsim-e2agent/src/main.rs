//! nextgsim E2 agent
//!
//! Connects a RAN node to a Near-RT RIC over E2AP/SCTP and keeps the E2
//! session up until interrupted.
//!
//! # Usage
//!
//! ```bash
//! nr-e2agent -c config/e2agent.yaml
//! nr-e2agent -c config/e2agent.yaml --log-level debug
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nextgsim_common::logging::{init_logging, LogLevel};
use tokio::signal;
use tracing::{error, info, warn};

use nextgsim_e2agent::{load_and_validate_e2_agent_config, AgentEvent, E2Agent, SctpConnector};

/// nextgsim E2 agent - O-RAN E2 node
#[derive(Parser, Debug)]
#[command(name = "nr-e2agent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the E2 agent configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run_agent(args).await {
        Ok(()) => {
            info!("E2 agent exited successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("E2 agent failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_agent(args: Args) -> Result<()> {
    info!("Loading configuration from: {}", args.config_file);
    let config = load_and_validate_e2_agent_config(&args.config_file)
        .with_context(|| format!("Failed to load configuration from {}", args.config_file))?;

    info!(
        "Configuration loaded: gNB ID={:#x}/{}, PLMN={}, RIC={}",
        config.node.gnb_id,
        config.node.gnb_id_length,
        config.node.plmn,
        config.ric_addr()
    );

    let tick_period = Duration::from_millis(config.timers.tick_period_ms);
    let mut agent = E2Agent::init(config, &SctpConnector::default())
        .await
        .context("Failed to initialize E2 agent")?;
    let mut events = agent.subscribe();
    let handle = agent.start();

    let mut ticker = tokio::time::interval(tick_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut outcome = Ok(());
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, initiating shutdown...");
                break;
            }
            _ = ticker.tick() => handle.tick(),
            event = events.recv() => match event {
                Some(AgentEvent::StateChanged { from, to }) => {
                    info!("E2 session {} -> {}", from, to);
                }
                Some(AgentEvent::SetupFailed { attempts }) => {
                    outcome = Err(anyhow::anyhow!("E2 Setup failed after {attempts} attempt(s)"));
                    break;
                }
                Some(AgentEvent::TransportLost { reason }) => {
                    warn!("E2 transport lost: {}", reason);
                    outcome = Err(anyhow::anyhow!("E2 transport lost: {reason}"));
                    break;
                }
                Some(AgentEvent::Stopped) | None => break,
            },
        }
    }

    handle.stop().await;
    outcome
}
