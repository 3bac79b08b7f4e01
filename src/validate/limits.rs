//! Scalar constraint validators: bounds, lengths, symbol sets, immutability.

use std::fmt::Display;

use serde::Serialize;

use crate::validate::path::FieldPath;
use crate::validate::{invalid, not_supported, too_many, ErrorList, OperationContext};

/// Fails with `Invalid` (origin `minimum`) when the value is below `min`.
/// Generic over signed and unsigned integer widths.
pub fn minimum<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
    min: T,
) -> ErrorList
where
    T: PartialOrd + Copy + Display + Serialize,
{
    match new {
        Some(v) if *v < min => ErrorList::of(
            invalid(fld, v, format!("must be greater than or equal to {min}")).with_origin("minimum"),
        ),
        _ => ErrorList::new(),
    }
}

/// Fails with `Invalid` (origin `maxLength`) when the string is longer than
/// `max` characters. A negative `max` can never be satisfied, so every
/// value fails the ordinary comparison.
pub fn max_length<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
    max: i64,
) -> ErrorList
where
    T: AsRef<str> + Serialize,
{
    match new {
        Some(v) if v.as_ref().chars().count() as i64 > max => ErrorList::of(
            invalid(fld, v, crate::validate::content::max_len_error(max)).with_origin("maxLength"),
        ),
        _ => ErrorList::new(),
    }
}

/// Fails with `TooMany` (origin `maxItems`) when the container holds more
/// than `max` items. A negative `max` can never be satisfied; even an
/// absent or empty container is over the limit.
pub fn max_items<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&[T]>,
    _old: Option<&[T]>,
    max: i64,
) -> ErrorList {
    if max < 0 {
        let len = new.map_or(0, |s| s.len());
        let mut err = too_many(fld, len, max).with_origin("maxItems");
        err.detail = "too many items".to_string();
        return ErrorList::of(err);
    }
    match new {
        Some(s) if s.len() as i64 > max => {
            ErrorList::of(too_many(fld, s.len(), max).with_origin("maxItems"))
        }
        _ => ErrorList::new(),
    }
}

/// Fails with `NotSupported` when the value is not one of `symbols`.
pub fn enum_value<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
    symbols: &[&str],
) -> ErrorList
where
    T: AsRef<str> + Serialize,
{
    match new {
        Some(v) if !symbols.contains(&v.as_ref()) => {
            let allowed: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
            ErrorList::of(not_supported(fld, v, &allowed))
        }
        _ => ErrorList::new(),
    }
}

/// Fails with `Invalid` (origin `immutable`) when an update changes the
/// value. Creates always pass, as does an update that introduces a value
/// where none existed.
pub fn immutable<T>(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    old: Option<&T>,
) -> ErrorList
where
    T: PartialEq + Serialize,
{
    if !op.is_update() {
        return ErrorList::new();
    }
    match (new, old) {
        (Some(n), Some(o)) if n != o => {
            ErrorList::of(invalid(fld, n, "field is immutable").with_origin("immutable"))
        }
        (None, Some(_)) => {
            ErrorList::of(invalid(fld, &(), "field is immutable").with_origin("immutable"))
        }
        _ => ErrorList::new(),
    }
}

/// Always passes or always fails, carrying `msg` in the failure detail.
/// Exists for the `validateTrue`/`validateFalse` probe tags used to test
/// generator wiring.
pub fn fixed_result<T: Serialize>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
    pass: bool,
    msg: &str,
) -> ErrorList {
    if pass {
        return ErrorList::new();
    }
    match new {
        Some(v) => ErrorList::of(invalid(fld, v, format!("forced failure: {msg}"))),
        None => ErrorList::of(invalid(fld, &(), format!("forced failure: {msg}"))),
    }
}

/// Fails with `Invalid` (origin `format=dns-label`) once per problem the
/// DNS-label predicate reports.
pub fn dns_label<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
) -> ErrorList
where
    T: AsRef<str> + Serialize,
{
    let Some(v) = new else {
        return ErrorList::new();
    };
    crate::validate::content::is_dns1123_label(v.as_ref())
        .into_iter()
        .map(|msg| invalid(fld, v, msg).with_origin("format=dns-label"))
        .collect()
}

/// Fails with `Invalid` (origin `format=ip-sloppy`) once per problem the
/// sloppy IP predicate reports.
pub fn ip_sloppy<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
) -> ErrorList
where
    T: AsRef<str> + Serialize,
{
    let Some(v) = new else {
        return ErrorList::new();
    };
    crate::validate::content::is_ip_sloppy(v.as_ref())
        .into_iter()
        .map(|msg| invalid(fld, v, msg).with_origin("format=ip-sloppy"))
        .collect()
}
