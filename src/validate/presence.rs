//! Presence validators: required, optional, forbidden.
//!
//! Presence is the one concern where a validator cares how the schema
//! declared the field: value, option, slice, or map each get a variant, and
//! the generator dispatches on the underlying type kind.
//!
//! `optional_*` never report a real problem. They exist to be emitted with
//! the non-error short-circuit flag: when the value is absent they return a
//! marker the generated code discards, stopping later validators from
//! running against a missing value. `forbidden_*` are emitted in a pair with
//! the matching `optional_*` check so that the failure path reports and
//! stops while the success path stops silently.

use std::collections::HashMap;

use crate::validate::path::FieldPath;
use crate::validate::{forbidden, required, ErrorList, OperationContext};

fn absent_marker(fld: &FieldPath) -> ErrorList {
    // Discarded by the NON_ERROR flag; never user-visible.
    ErrorList::of(required(fld, "optional value was not specified"))
}

/// Fails with `Required` when the value equals the zero value of its type.
pub fn required_value<T: Default + PartialEq>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
) -> ErrorList {
    match new {
        Some(v) if *v != T::default() => ErrorList::new(),
        _ => ErrorList::of(required(fld, "")),
    }
}

/// Fails with `Required` when the option is absent.
pub fn required_option<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&Option<T>>,
    _old: Option<&Option<T>>,
) -> ErrorList {
    match new {
        Some(Some(_)) => ErrorList::new(),
        _ => ErrorList::of(required(fld, "")),
    }
}

/// Fails with `Required` when the slice is absent or empty.
pub fn required_slice<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
) -> ErrorList {
    match new {
        Some(s) if !s.is_empty() => ErrorList::new(),
        _ => ErrorList::of(required(fld, "")),
    }
}

/// Fails with `Required` when the map is absent or empty.
pub fn required_map<K, V>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&HashMap<K, V>>,
    _old: Option<&HashMap<K, V>>,
) -> ErrorList {
    match new {
        Some(m) if !m.is_empty() => ErrorList::new(),
        _ => ErrorList::of(required(fld, "")),
    }
}

/// Passes on present values; returns the discarded absence marker otherwise.
pub fn optional_value<T: Default + PartialEq>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
) -> ErrorList {
    match new {
        Some(v) if *v != T::default() => ErrorList::new(),
        _ => absent_marker(fld),
    }
}

/// Passes on present options; returns the discarded absence marker otherwise.
pub fn optional_option<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&Option<T>>,
    _old: Option<&Option<T>>,
) -> ErrorList {
    match new {
        Some(Some(_)) => ErrorList::new(),
        _ => absent_marker(fld),
    }
}

/// Passes on non-empty slices; returns the discarded absence marker otherwise.
pub fn optional_slice<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
) -> ErrorList {
    match new {
        Some(s) if !s.is_empty() => ErrorList::new(),
        _ => absent_marker(fld),
    }
}

/// Passes on non-empty maps; returns the discarded absence marker otherwise.
pub fn optional_map<K, V>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&HashMap<K, V>>,
    _old: Option<&HashMap<K, V>>,
) -> ErrorList {
    match new {
        Some(m) if !m.is_empty() => ErrorList::new(),
        _ => absent_marker(fld),
    }
}

/// Fails with `Forbidden` when the value differs from its zero value.
pub fn forbidden_value<T: Default + PartialEq>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
) -> ErrorList {
    match new {
        Some(v) if *v != T::default() => ErrorList::of(forbidden(fld, "")),
        _ => ErrorList::new(),
    }
}

/// Fails with `Forbidden` when the option is present.
pub fn forbidden_option<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&Option<T>>,
    _old: Option<&Option<T>>,
) -> ErrorList {
    match new {
        Some(Some(_)) => ErrorList::of(forbidden(fld, "")),
        _ => ErrorList::new(),
    }
}

/// Fails with `Forbidden` when the slice is non-empty.
pub fn forbidden_slice<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
) -> ErrorList {
    match new {
        Some(s) if !s.is_empty() => ErrorList::of(forbidden(fld, "")),
        _ => ErrorList::new(),
    }
}

/// Fails with `Forbidden` when the map is non-empty.
pub fn forbidden_map<K, V>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&HashMap<K, V>>,
    _old: Option<&HashMap<K, V>>,
) -> ErrorList {
    match new {
        Some(m) if !m.is_empty() => ErrorList::of(forbidden(fld, "")),
        _ => ErrorList::new(),
    }
}
