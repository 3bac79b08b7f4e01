//! The code generator: schema traversal and source emission.

pub mod emit;
pub mod names;
pub mod traverse;

use std::path::PathBuf;

use crate::errors::GenError;
use crate::schema::loader;
use crate::tags::registry::build_default_registry;

/// Runs the full pipeline: load schema declarations, plan validators, emit
/// source. Returns the generated file contents.
pub fn generate(inputs: &[PathBuf]) -> Result<String, GenError> {
    let universe = loader::load_universe(inputs)?;
    let registry = build_default_registry();
    let plans = traverse::plan(&universe, &registry)?;
    Ok(emit::emit(&plans, universe.roots()))
}
