//! packweave - runtime pack ordering for resource and data reloads
//!
//! Inspector executable: replays a pack layout and prints the resulting order.

mod config;
mod folder_source;
mod inspect;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::LayoutConfig;
use packweave_core::PackType;
use packweave_splice::global;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect how runtime packs are woven into a reload", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the pack order a layout file produces
    Inspect {
        /// Layout file (TOML)
        layout: PathBuf,

        /// Pack domain to order: `data` or `assets`
        #[arg(long, default_value = "data", value_parser = parse_domain)]
        domain: PackType,
    },
}

fn parse_domain(value: &str) -> Result<PackType, String> {
    PackType::parse(value).ok_or_else(|| format!("unknown pack domain '{value}'"))
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting packweave v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Inspect { layout, domain } => {
            let config = LayoutConfig::load(&layout)?;
            global::install(inspect::build_registry(&config)?.seal())
                .context("Failed to install pack callbacks")?;
            // Reload glue reads the process-wide table, as a host would.
            let callbacks = global::installed().context("No pack callbacks installed")?;
            let report = inspect::inspect(&config, domain, &callbacks)?;
            print!("{report}");
        }
    }
    Ok(())
}
