use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::env;
use std::process::{Command, Stdio};
use std::sync::Arc;

use suez_canal::domain::canal::protocol::PortSide;
use suez_canal::domain::config::{MAX_NUMBER_OF_VESSELS, MIN_NUMBER_OF_VESSELS};
use suez_canal::domain::simulator::simulator::Simulator;
use suez_canal::{load_settings, logger, run_destination_port, run_origin_port};

#[derive(Parser)]
#[command(name = "suez_canal", about = "Two-port canal crossing simulation")]
struct Cli {
    #[command(subcommand)]
    port: PortCommand,
}

#[derive(Subcommand)]
enum PortCommand {
    /// Run the Origin Port (Haifa). Starts the Destination Port as a child process.
    Origin {
        /// Number of vessels sailing from the port
        #[arg(value_parser = clap::value_parser!(u64).range(MIN_NUMBER_OF_VESSELS as u64..=MAX_NUMBER_OF_VESSELS as u64))]
        vessels: u64,

        /// Optional JSON settings file, handed on to the Destination Port
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Run the Destination Port (Eilat). Speaks the canal protocol over stdin/stdout.
    Destination {
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().port {
        PortCommand::Origin { vessels, config } => run_origin(vessels as usize, config),
        PortCommand::Destination { config } => run_destination(config),
    }
}

fn run_origin(vessels: usize, config: Option<String>) -> anyhow::Result<()> {
    logger::init(PortSide::Origin);
    let settings = load_settings(config.as_deref()).context("Haifa Port: invalid settings")?;

    let mut destination = Command::new(env::current_exe().context("Haifa Port: cannot locate own executable")?);
    destination.arg("destination");
    if let Some(path) = &config {
        destination.arg("--config").arg(path);
    }

    let mut child = destination
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .context("Haifa Port: failed to start Eilat Port")?;

    let (Some(to_destination), Some(from_destination)) = (child.stdin.take(), child.stdout.take()) else {
        bail!("Haifa Port: Eilat Port started without canal pipes");
    };

    let simulator = Arc::new(Simulator::new(&settings));
    let report = run_origin_port(vessels, from_destination, to_destination, &settings, simulator)?;

    let status = child.wait().context("Haifa Port: failed to wait for Eilat Port")?;
    if !status.success() {
        bail!("Haifa Port: Eilat Port exited with {}", status);
    }

    if !report.failed_workers.is_empty() {
        bail!("Haifa Port: {} vessel(s) failed: {:?}", report.failed_workers.len(), report.failed_workers);
    }
    Ok(())
}

fn run_destination(config: Option<String>) -> anyhow::Result<()> {
    logger::init(PortSide::Destination);
    let settings = load_settings(config.as_deref()).context("Eilat Port: invalid settings")?;

    let simulator = Arc::new(Simulator::new(&settings));
    let report = run_destination_port(std::io::stdin(), std::io::stdout(), &settings, simulator)?;

    if !report.failed_workers.is_empty() {
        bail!("Eilat Port: {} worker(s) failed: {:?}", report.failed_workers.len(), report.failed_workers);
    }
    Ok(())
}
