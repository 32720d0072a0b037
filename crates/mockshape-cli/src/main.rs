//! # mockshape
//!
//! Shapes JSON Schemas into mock API responses.
//!
//! This binary provides:
//! - Path-addressed `flatten` / `unflatten` of JSON documents
//! - Schema envelope collapsing and property description
//! - Example responses generated from a response schema
//!
//! ## Running
//!
//! ```bash
//! # Example response for a schema file
//! mockshape mock schema.json
//!
//! # Property descriptors from stdin, single-line output
//! cat schema.json | mockshape --compact describe
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::Context;
use clap::Parser;
use tracing::info;

use mockshape_cli::cli::Cli;
use mockshape_cli::{commands, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config =
        commands::load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let format = cli.log_format.unwrap_or(config.logging.format);
    let _log_guard = logging::init(&config.logging, format)?;

    info!(command = cli.command.name(), "Starting mockshape");

    let input = commands::read_input(cli.command.input().input.as_deref())
        .context("Failed to read input document")?;
    let output = commands::execute(&cli.command, &config, input)
        .with_context(|| format!("'{}' failed", cli.command.name()))?;

    println!("{}", commands::render(&output, cli.compact)?);

    Ok(())
}
