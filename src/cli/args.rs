//! Defines the command-line arguments and subcommands for the niyama CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "niyama",
    version,
    about = "Declarative validation engine and validator code generator for resource schemas."
)]
pub struct NiyamaArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load schema declarations, plan validators, and write generated code.
    Generate {
        /// Input files or directories containing schema declarations.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Path of the generated source file to write.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Extract validations and report errors without emitting anything.
    Check {
        /// Input files or directories containing schema declarations.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// List all registered validation tags with their documentation.
    Docs,
}
