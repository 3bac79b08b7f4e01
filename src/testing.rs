//! Test support for validator behavior.
//!
//! [`ValidationTester`] drives a validator function the way the dispatcher
//! would, and matches results against expectations by the stable triple
//! `(kind, field, origin)`; the `detail` string is human-facing and not
//! part of any contract. Intended for `#[cfg(test)]` and integration tests;
//! expectation failures panic with a readable diff.

use std::fmt::Write as _;

use crate::dispatch::ValidateFn;
use crate::validate::path::FieldPath;
use crate::validate::{ErrorKind, ErrorList, Operation, OperationContext, ValidationError};

/// An expected validation error, matched on `(kind, field, origin)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedError {
    pub kind: ErrorKind,
    pub field: String,
    pub origin: Option<String>,
}

impl ExpectedError {
    pub fn new(kind: ErrorKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn matches(&self, err: &ValidationError) -> bool {
        self.kind == err.kind
            && self.field == err.field.to_string()
            && self.origin == err.origin
    }
}

/// Drives one validator function against a value (and optionally an old
/// value) with a fluent interface.
pub struct ValidationTester<'a, T> {
    validate: ValidateFn<T>,
    value: &'a T,
    old_value: Option<&'a T>,
    options: im::HashSet<String>,
}

impl<'a, T> ValidationTester<'a, T> {
    pub fn new(validate: ValidateFn<T>, value: &'a T) -> Self {
        Self {
            validate,
            value,
            old_value: None,
            options: im::HashSet::new(),
        }
    }

    /// Sets the old value; the run becomes an UPDATE.
    pub fn old_value(mut self, old: &'a T) -> Self {
        self.old_value = Some(old);
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.insert(option.into());
        self
    }

    /// Runs the validator with the configured operation.
    pub fn run(&self) -> ErrorList {
        let op = OperationContext {
            operation: if self.old_value.is_some() {
                Operation::Update
            } else {
                Operation::Create
            },
            options: self.options.clone(),
            subresources: Vec::new(),
        };
        (self.validate)(&op, &FieldPath::root(), Some(self.value), self.old_value)
    }

    /// Panics unless the run produced no errors.
    pub fn expect_valid(self) {
        let errs = self.run();
        assert!(errs.is_empty(), "want no errors, got:\n{}", render(&errs));
    }

    /// Panics unless the run produced exactly the expected errors (matched
    /// by kind, field, and origin; order-insensitive).
    pub fn expect_invalid(self, want: &[ExpectedError]) {
        let got = self.run();
        let mut unmatched_want: Vec<&ExpectedError> = want.iter().collect();
        let mut unmatched_got: Vec<&ValidationError> = Vec::new();
        for err in got.iter() {
            match unmatched_want.iter().position(|w| w.matches(err)) {
                Some(i) => {
                    unmatched_want.remove(i);
                }
                None => unmatched_got.push(err),
            }
        }
        if unmatched_want.is_empty() && unmatched_got.is_empty() {
            return;
        }
        let mut msg = String::from("validation errors differed from expected:\n");
        for w in &unmatched_want {
            let _ = writeln!(msg, "  missing: {:?} at {:?} (origin {:?})", w.kind, w.field, w.origin);
        }
        for g in &unmatched_got {
            let _ = writeln!(
                msg,
                "  unexpected: {:?} at {:?} (origin {:?}): {}",
                g.kind, g.field.to_string(), g.origin, g.detail
            );
        }
        panic!("{msg}");
    }
}

fn render(errs: &ErrorList) -> String {
    let mut out = String::new();
    for e in errs.iter() {
        let _ = writeln!(out, "  {e}");
    }
    out
}
