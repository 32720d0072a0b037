//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mockshape_core::LogFormat;

/// Shape JSON Schemas into mock API responses.
#[derive(Debug, Parser)]
#[command(name = "mockshape", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config location).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print single-line JSON instead of pretty output.
    #[arg(long, global = true)]
    pub compact: bool,

    /// Console log format, overriding the configuration file.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands. Each reads one JSON document.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Flatten a JSON value into path-addressed chunks.
    Flatten(InputArgs),

    /// Rebuild a JSON value from a list of chunks.
    Unflatten(InputArgs),

    /// Remove `properties` / `items` envelope layers from a schema.
    Collapse(InputArgs),

    /// Describe every node of a schema as a property descriptor.
    ///
    /// `items` schemas are merged into their array property, so the
    /// descriptor carries the item's attributes.
    Describe(InputArgs),

    /// Expand a properties map back into descriptor chunks.
    Chunks(InputArgs),

    /// Produce an example response for a schema.
    ///
    /// Array shapes are not kept: an array property's `items` schema is merged
    /// into the property itself, so it mocks as a single item value (an array
    /// `example` or `default` is still used as given).
    Mock(InputArgs),
}

/// Where the input document comes from.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// JSON file to read. Reads stdin when omitted or `-`.
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,
}

impl Command {
    /// The input arguments shared by every subcommand.
    #[must_use]
    pub const fn input(&self) -> &InputArgs {
        match self {
            Self::Flatten(args)
            | Self::Unflatten(args)
            | Self::Collapse(args)
            | Self::Describe(args)
            | Self::Chunks(args)
            | Self::Mock(args) => args,
        }
    }

    /// Subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Flatten(_) => "flatten",
            Self::Unflatten(_) => "unflatten",
            Self::Collapse(_) => "collapse",
            Self::Describe(_) => "describe",
            Self::Chunks(_) => "chunks",
            Self::Mock(_) => "mock",
        }
    }
}
