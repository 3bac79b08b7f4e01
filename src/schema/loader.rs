//! Schema declaration file loading.
//!
//! Declarations are JSON documents, one per package, discovered by walking
//! the input directories. Within a file, type and reference packages may be
//! left empty and default to the file's package.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::errors::{unspanned, ErrorReporting, GenContext, GenError, GenErrorKind, SourceContext};
use crate::schema::{TypeBody, TypeDef, TypeExpr, TypeName, Universe};

/// One schema declaration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Default package for types declared (and referenced) in this file.
    #[serde(default)]
    pub package: String,
    /// Names of types validation should be generated for. Everything they
    /// reach is pulled in transitively.
    #[serde(default)]
    pub roots: Vec<String>,
    pub types: Vec<TypeDef>,
}

/// Finds schema declaration files (`*.json`) under each input path, in a
/// stable order.
pub fn discover(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for input in inputs {
        if input.is_file() {
            found.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                found.push(path.to_path_buf());
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

/// Parses one declaration file.
pub fn load_file(path: &Path) -> Result<SchemaFile, GenError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| {
        let ctx = GenContext::new(SourceContext::fallback(&display), "load");
        ctx.report(
            GenErrorKind::Io {
                path: display.clone(),
                reason: e.to_string(),
            },
            unspanned(),
        )
    })?;
    let ctx = GenContext::new(
        SourceContext::from_input(display.as_str(), content.as_str()),
        "load",
    );
    serde_json::from_str::<SchemaFile>(&content).map_err(|e| {
        let offset = line_col_to_offset(&content, e.line(), e.column());
        ctx.report(
            GenErrorKind::MalformedSchema {
                reason: e.to_string(),
            },
            (offset..offset + 1).into(),
        )
    })
}

/// Loads every discovered file into a single [`Universe`], defaulting empty
/// packages, checking for duplicate declarations and dangling references.
pub fn load_universe(inputs: &[PathBuf]) -> Result<Universe, GenError> {
    let mut universe = Universe::new();
    for path in discover(inputs) {
        let file = load_file(&path)?;
        let display = path.display().to_string();
        let ctx = GenContext::new(SourceContext::fallback(&display), "load");
        for mut def in file.types {
            normalize(&mut def, &file.package);
            let name = def.name.clone();
            if universe.insert(def).is_err() {
                return Err(ctx.report(
                    GenErrorKind::DuplicateType {
                        type_name: name.to_string(),
                    },
                    unspanned(),
                ));
            }
        }
        for root in &file.roots {
            universe.add_root(TypeName::new(file.package.clone(), root.clone()));
        }
    }
    if let Some((reference, from)) = universe.dangling_references().into_iter().next() {
        let ctx = GenContext::new(SourceContext::fallback("schema universe"), "load");
        return Err(ctx.report(
            GenErrorKind::DanglingReference {
                type_name: reference.to_string(),
                referenced_from: from.to_string(),
            },
            unspanned(),
        ));
    }
    Ok(universe)
}

fn normalize(def: &mut TypeDef, package: &str) {
    if def.name.package.is_empty() {
        def.name.package = package.to_string();
    }
    match &mut def.body {
        TypeBody::Alias { of } => normalize_expr(of, package),
        TypeBody::Struct { fields } => {
            for field in fields {
                normalize_expr(&mut field.ty, package);
            }
        }
    }
}

fn normalize_expr(expr: &mut TypeExpr, package: &str) {
    match expr {
        TypeExpr::Named { package: p, .. } => {
            if p.is_empty() {
                *p = package.to_string();
            }
        }
        TypeExpr::Optional { elem } | TypeExpr::Slice { elem } => normalize_expr(elem, package),
        TypeExpr::Map { key, value } => {
            normalize_expr(key, package);
            normalize_expr(value, package);
        }
        _ => {}
    }
}

fn line_col_to_offset(content: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, l) in content.lines().enumerate() {
        if i + 1 == line {
            return offset + column.saturating_sub(1);
        }
        offset += l.len() + 1;
    }
    content.len().saturating_sub(1)
}
