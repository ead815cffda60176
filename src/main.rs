// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use commute_planner::app::console::TerminalConsole;
use commute_planner::{Config, Planner, TomTomClient};

/// Tells you when to leave so you arrive on time.
///
/// Reads `API_KEY` (TomTom) from the environment or a `.env` file.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {}

fn main() -> Result<()> {
    // Load environment variables from .env file, if present
    dotenvy::dotenv().ok();

    // Diagnostics go to stderr so they never interleave with prompts
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {} = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(());
        }
    };
    tracing::debug!(?config, "Configuration loaded");

    let client = TomTomClient::new(config).context("Failed to build HTTP client")?;
    let console = TerminalConsole::new().context("Failed to set up console")?;

    println!("🚦 Commute Planner");
    println!("==================\n");

    Planner::new(client, console)
        .run()
        .context("Console failure")?;

    Ok(())
}
