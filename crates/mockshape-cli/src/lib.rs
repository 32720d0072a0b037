//! # mockshape-cli
//!
//! Command-line front end for mockshape.
//!
//! This library provides the argument definitions, subcommand execution and
//! logging setup used by the `mockshape` binary.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod cli;
pub mod commands;
pub mod logging;
