//! Runtime validation library.
//!
//! Everything in this module tree is invoked by generated validator code.
//! All failures are values: validators accumulate [`ValidationError`]s into
//! an [`ErrorList`] and never panic. The only short-circuits are the ones
//! the generator plans explicitly (required/forbidden/maxItems), and those
//! suppress later validators on the same field only.

use std::fmt;

use serde::Serialize;

use crate::validate::path::FieldPath;

pub mod content;
pub mod each;
pub mod limits;
pub mod path;
pub mod presence;
pub mod ratchet;
pub mod union;

// ============================================================================
// OPERATION CONTEXT
// ============================================================================

/// The kind of write being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    Create,
    Update,
}

/// Context passed to every validator invocation.
///
/// `options` carries the caller's runtime feature toggles; validators read
/// it through [`OperationContext::has_option`] and never write it.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub operation: Operation,
    pub options: im::HashSet<String>,
    pub subresources: Vec<String>,
}

impl OperationContext {
    pub fn create() -> Self {
        Self {
            operation: Operation::Create,
            ..Self::default()
        }
    }

    pub fn update() -> Self {
        Self {
            operation: Operation::Update,
            ..Self::default()
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_update(&self) -> bool {
        self.operation == Operation::Update
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }
}

// ============================================================================
// ERROR MODEL
// ============================================================================

/// The machine-readable classification of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Invalid,
    Required,
    Forbidden,
    NotSupported,
    Duplicate,
    TooMany,
    TooLong,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Invalid => "Invalid value",
            Self::Required => "Required value",
            Self::Forbidden => "Forbidden value",
            Self::NotSupported => "Unsupported value",
            Self::Duplicate => "Duplicate value",
            Self::TooMany => "Too many",
            Self::TooLong => "Too long",
            Self::InternalError => "Internal error",
        };
        write!(f, "{s}")
    }
}

/// A single structured validation failure.
///
/// `detail` is human-facing and not part of any stability contract; machine
/// consumers match on `(kind, field, origin)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub field: FieldPath,
    pub bad_value: Option<serde_json::Value>,
    pub detail: String,
    pub origin: Option<String>,
}

impl ValidationError {
    /// Attaches the stable origin tag (e.g. `"minimum"`, `"maxLength"`).
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// True when two errors agree on the stable triple used by matchers.
    pub fn equivalent(&self, other: &ValidationError) -> bool {
        self.kind == other.kind && self.field == other.field && self.origin == other.origin
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)?;
        if let Some(v) = &self.bad_value {
            write!(f, ": {v}")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

fn to_bad_value<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

/// Error for a value that fails a constraint.
pub fn invalid<T: Serialize>(fld: &FieldPath, value: &T, detail: impl Into<String>) -> ValidationError {
    ValidationError {
        kind: ErrorKind::Invalid,
        field: fld.clone(),
        bad_value: to_bad_value(value),
        detail: detail.into(),
        origin: None,
    }
}

/// Error for a missing value.
pub fn required(fld: &FieldPath, detail: impl Into<String>) -> ValidationError {
    ValidationError {
        kind: ErrorKind::Required,
        field: fld.clone(),
        bad_value: None,
        detail: detail.into(),
        origin: None,
    }
}

/// Error for a value that may not be specified.
pub fn forbidden(fld: &FieldPath, detail: impl Into<String>) -> ValidationError {
    ValidationError {
        kind: ErrorKind::Forbidden,
        field: fld.clone(),
        bad_value: None,
        detail: detail.into(),
        origin: None,
    }
}

/// Error for a value outside a closed set of allowed symbols.
pub fn not_supported<T: Serialize>(fld: &FieldPath, value: &T, allowed: &[String]) -> ValidationError {
    let mut sorted = allowed.to_vec();
    sorted.sort();
    let quoted: Vec<String> = sorted.iter().map(|s| format!("\"{s}\"")).collect();
    ValidationError {
        kind: ErrorKind::NotSupported,
        field: fld.clone(),
        bad_value: to_bad_value(value),
        detail: format!("supported values: {}", quoted.join(", ")),
        origin: None,
    }
}

/// Error for a duplicated element.
pub fn duplicate<T: Serialize>(fld: &FieldPath, value: &T) -> ValidationError {
    ValidationError {
        kind: ErrorKind::Duplicate,
        field: fld.clone(),
        bad_value: to_bad_value(value),
        detail: String::new(),
        origin: None,
    }
}

/// Error for a container that exceeds its size limit.
pub fn too_many(fld: &FieldPath, actual: usize, max: i64) -> ValidationError {
    ValidationError {
        kind: ErrorKind::TooMany,
        field: fld.clone(),
        bad_value: to_bad_value(&actual),
        detail: format!("must have at most {max} items"),
        origin: None,
    }
}

/// Error for a string that exceeds its length limit.
pub fn too_long(fld: &FieldPath, max: i64) -> ValidationError {
    ValidationError {
        kind: ErrorKind::TooLong,
        field: fld.clone(),
        bad_value: None,
        detail: format!("may not be more than {max} bytes"),
        origin: None,
    }
}

/// Error reporting a bug in the validation machinery itself. Surfacing the
/// problem as a value lets the rest of validation proceed.
pub fn internal(fld: &FieldPath, cause: impl Into<String>) -> ValidationError {
    ValidationError {
        kind: ErrorKind::InternalError,
        field: fld.clone(),
        bad_value: None,
        detail: cause.into(),
        origin: None,
    }
}

// ============================================================================
// ERROR LIST
// ============================================================================

/// An ordered list of validation errors.
///
/// Order within a single validator call is deterministic: emission order
/// first, input iteration order within containers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList(Vec<ValidationError>);

impl ErrorList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn of(err: ValidationError) -> Self {
        Self(vec![err])
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Applies an origin tag to every error currently in the list.
    pub fn with_origin(mut self, origin: &str) -> Self {
        for err in &mut self.0 {
            err.origin = Some(origin.to_string());
        }
        self
    }
}

impl IntoIterator for ErrorList {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<ValidationError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}
