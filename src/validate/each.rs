//! Container iteration validators and uniqueness checks.
//!
//! The `each_*` functions apply an element validator across a container,
//! locating the corresponding old element so that update-time ratcheting can
//! skip elements the caller did not change. Correspondence is by a supplied
//! match function for keyed lists (list-maps) and positional otherwise.

use std::collections::HashMap;

use serde::Serialize;

use crate::validate::path::FieldPath;
use crate::validate::{duplicate, ErrorList, OperationContext};

/// Compares two elements of the same type.
pub type CompareFn<T> = fn(&T, &T) -> bool;

/// Validates each element of `new` with `validate`.
///
/// `correspond` locates the matching old element (keyed lookup for
/// list-maps); when absent, matching is positional. `equiv` is the
/// ratcheting equivalence: on UPDATE, elements whose old counterpart exists
/// and is equivalent are skipped entirely. Ratcheting never applies on
/// CREATE.
pub fn each_slice_val<T, F>(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    old: Option<&[T]>,
    correspond: Option<CompareFn<T>>,
    equiv: Option<CompareFn<T>>,
    validate: F,
) -> ErrorList
where
    F: Fn(&OperationContext, &FieldPath, Option<&T>, Option<&T>) -> ErrorList,
{
    let mut errs = ErrorList::new();
    let Some(new) = new else {
        return errs;
    };
    for (i, val) in new.iter().enumerate() {
        let old_val = match (op.is_update(), old) {
            (true, Some(old)) => match correspond {
                Some(cmp) => old.iter().find(|&o| cmp(val, o)),
                None => old.get(i),
            },
            _ => None,
        };
        if op.is_update() {
            if let (Some(eq), Some(o)) = (equiv, old_val) {
                if eq(val, o) {
                    continue;
                }
            }
        }
        errs.extend(validate(op, &fld.index(i), Some(val), old_val));
    }
    errs
}

/// Validates each value of `new`, pairing it with `old[key]` when present.
/// Keys are visited in sorted order so error order is a function of the
/// input value alone.
pub fn each_map_val<K, V, F>(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&HashMap<K, V>>,
    old: Option<&HashMap<K, V>>,
    equiv: Option<CompareFn<V>>,
    validate: F,
) -> ErrorList
where
    K: Ord + std::hash::Hash + Eq + std::fmt::Display,
    F: Fn(&OperationContext, &FieldPath, Option<&V>, Option<&V>) -> ErrorList,
{
    let mut errs = ErrorList::new();
    let Some(new) = new else {
        return errs;
    };
    let mut keys: Vec<&K> = new.keys().collect();
    keys.sort();
    for key in keys {
        let val = &new[key];
        let old_val = match (op.is_update(), old) {
            (true, Some(old)) => old.get(key),
            _ => None,
        };
        if op.is_update() {
            if let (Some(eq), Some(o)) = (equiv, old_val) {
                if eq(val, o) {
                    continue;
                }
            }
        }
        errs.extend(validate(op, &fld.key(key.to_string()), Some(val), old_val));
    }
    errs
}

/// Validates each key of `new`. On UPDATE, keys already present in `old`
/// are skipped: an unchanged key cannot have become newly invalid.
///
/// Errors are reported at the map's own path; the offending key rides in
/// the error value.
pub fn each_map_key<K, V, F>(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&HashMap<K, V>>,
    old: Option<&HashMap<K, V>>,
    validate: F,
) -> ErrorList
where
    K: Ord + std::hash::Hash + Eq,
    F: Fn(&OperationContext, &FieldPath, Option<&K>, Option<&K>) -> ErrorList,
{
    let mut errs = ErrorList::new();
    let Some(new) = new else {
        return errs;
    };
    let mut keys: Vec<&K> = new.keys().collect();
    keys.sort();
    for key in keys {
        if op.is_update() {
            if let Some(old) = old {
                if old.contains_key(key) {
                    continue;
                }
            }
        }
        errs.extend(validate(op, fld, Some(key), None));
    }
    errs
}

/// Reports `Duplicate` at each element equal to some earlier element, with
/// duplicate indices in strictly ascending order. Comparison is direct
/// equality.
pub fn unique_by_compare<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
) -> ErrorList
where
    T: PartialEq + Serialize,
{
    unique_impl(fld, new, |a, b| a == b)
}

/// Like [`unique_by_compare`] but with a caller-supplied matcher. Used for
/// keyed lists, where two elements collide when their key fields agree even
/// if the rest of the element differs.
pub fn unique_by_match<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
    matcher: CompareFn<T>,
) -> ErrorList
where
    T: Serialize,
{
    unique_impl(fld, new, matcher)
}

/// Like [`unique_by_compare`] but over structural deep equality, for element
/// types without a meaningful direct comparison.
pub fn unique_by_reflect<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
) -> ErrorList
where
    T: Serialize,
{
    let Some(slice) = new else {
        return ErrorList::new();
    };
    let shadows: Vec<Option<serde_json::Value>> =
        slice.iter().map(|v| serde_json::to_value(v).ok()).collect();
    let mut dups: Vec<usize> = Vec::new();
    for i in 0..shadows.len() {
        for j in (i + 1)..shadows.len() {
            let eq = matches!((&shadows[i], &shadows[j]), (Some(a), Some(b)) if a == b);
            if eq && !dups.contains(&j) {
                dups.push(j);
            }
        }
    }
    dups.sort_unstable();
    dups.into_iter()
        .map(|i| duplicate(&fld.index(i), &slice[i]))
        .collect()
}

fn unique_impl<T, F>(fld: &FieldPath, new: Option<&[T]>, cmp: F) -> ErrorList
where
    T: Serialize,
    F: Fn(&T, &T) -> bool,
{
    let Some(slice) = new else {
        return ErrorList::new();
    };
    let mut dups: Vec<usize> = Vec::new();
    for i in 0..slice.len() {
        for j in (i + 1)..slice.len() {
            if cmp(&slice[i], &slice[j]) && !dups.contains(&j) {
                dups.push(j);
            }
        }
    }
    dups.sort_unstable();
    dups.into_iter()
        .map(|i| duplicate(&fld.index(i), &slice[i]))
        .collect()
}
