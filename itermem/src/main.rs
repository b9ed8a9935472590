//! itermem - Tiered memory CLI for iterative agent loops
//!
//! Records what each iteration did, mines agent output for facts and renders
//! the memory block handed to the next iteration.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;
mod storage;

use cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing (stderr keeps stdout clean for --json)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("itermem=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(cli.dir.as_deref())?;

    // Execute command
    commands::execute(cli.command, &config, cli.iteration)
}
