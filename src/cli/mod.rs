//! The niyama command-line interface.
//!
//! This module is the entry point for all CLI commands and orchestrates the
//! core library functions.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use thiserror::Error;

use crate::cli::args::{Command, NiyamaArgs};
use crate::errors::GenError;
use crate::schema::loader;
use crate::tags::registry::build_default_registry;

pub mod args;
pub mod output;

/// Failures surfaced by CLI command handlers.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("generation failed")]
    Gen(#[from] GenError),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The main entry point for the CLI.
pub fn run() {
    let args = NiyamaArgs::parse();

    let result = match args.command {
        Command::Generate { inputs, output } => handle_generate(&inputs, &output),
        Command::Check { inputs } => handle_check(&inputs),
        Command::Docs => handle_docs(),
    };

    if let Err(e) = result {
        output::print_failure(&e.to_string());
        if let CliError::Gen(gen) = e {
            crate::errors::print_error(gen);
        }
        process::exit(1);
    }
}

fn handle_generate(inputs: &[PathBuf], out_path: &Path) -> Result<(), CliError> {
    let code = crate::gen::generate(inputs)?;
    fs::write(out_path, code).map_err(|source| CliError::Write {
        path: out_path.to_path_buf(),
        source,
    })?;
    output::print_success(&format!("wrote {}", out_path.display()));
    Ok(())
}

fn handle_check(inputs: &[PathBuf]) -> Result<(), CliError> {
    let universe = loader::load_universe(inputs)?;
    let registry = build_default_registry();
    let plans = crate::gen::traverse::plan(&universe, &registry)?;
    output::print_success(&format!(
        "ok: {} validator(s) planned from {} declared type(s)",
        plans.len(),
        universe.iter().count()
    ));
    Ok(())
}

fn handle_docs() -> Result<(), CliError> {
    let registry = build_default_registry();
    output::print_tag_docs(&registry.docs());
    Ok(())
}
