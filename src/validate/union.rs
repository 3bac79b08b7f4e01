//! Union validators.
//!
//! A union is a set of struct fields of which exactly one may be set. The
//! generator emits one [`UnionMembership`] table per union as a static, plus
//! one extractor closure per member that reports whether the member is set
//! on a given value. A discriminated union additionally names a field whose
//! value must match the set member's name.

use crate::validate::path::FieldPath;
use crate::validate::{internal, invalid, ErrorList, OperationContext};

/// Reports whether a union member is set on the enclosing struct.
pub type MemberExtractor<T> = fn(&T) -> bool;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Member {
    field_name: String,
    member_name: String,
}

/// An ordered list of union member fields, with an optional discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMembership {
    discriminator: Option<String>,
    members: Vec<Member>,
}

impl UnionMembership {
    /// Builds a membership table from `(field_name, member_name)` pairs.
    pub fn new(members: &[(&str, &str)]) -> Self {
        Self {
            discriminator: None,
            members: members
                .iter()
                .map(|(f, m)| Member {
                    field_name: f.to_string(),
                    member_name: m.to_string(),
                })
                .collect(),
        }
    }

    /// Builds a membership table with a discriminator field.
    pub fn discriminated(discriminator: &str, members: &[(&str, &str)]) -> Self {
        Self {
            discriminator: Some(discriminator.to_string()),
            ..Self::new(members)
        }
    }

    fn all_fields(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(|m| m.field_name.as_str()).collect();
        names.join(", ")
    }
}

/// Verifies that exactly one member of a union is set.
///
/// `extractors` must be index-aligned with the membership table; a length
/// mismatch is a generator bug and is surfaced as an internal error so the
/// rest of validation can proceed.
pub fn union<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
    membership: &UnionMembership,
    extractors: &[MemberExtractor<T>],
) -> ErrorList {
    let Some(value) = new else {
        return ErrorList::new();
    };
    if membership.members.len() != extractors.len() {
        return ErrorList::of(internal(
            fld,
            "union membership and extractors disagree in length",
        ));
    }
    let set_count = extractors.iter().filter(|x| x(value)).count();
    if set_count == 1 {
        return ErrorList::new();
    }
    ErrorList::of(invalid(
        fld,
        &(),
        format!("must specify exactly one of: {}", membership.all_fields()),
    ))
}

/// Verifies that the set member of a discriminated union matches the
/// discriminator's value: for every member, set XOR (discriminator ==
/// member name) must be false.
pub fn discriminated_union<T>(
    _op: &OperationContext,
    fld: &FieldPath,
    new: Option<&T>,
    _old: Option<&T>,
    membership: &UnionMembership,
    discriminator: fn(&T) -> String,
    extractors: &[MemberExtractor<T>],
) -> ErrorList {
    let Some(value) = new else {
        return ErrorList::new();
    };
    if membership.members.len() != extractors.len() {
        return ErrorList::of(internal(
            fld,
            "union membership and extractors disagree in length",
        ));
    }
    let disc_name = membership.discriminator.as_deref().unwrap_or("");
    let disc_value = discriminator(value);
    let mut errs = ErrorList::new();
    for (member, extract) in membership.members.iter().zip(extractors) {
        let is_discriminated = disc_value == member.member_name;
        let is_set = extract(value);
        if is_set && !is_discriminated {
            errs.push(invalid(
                &fld.child(&member.field_name),
                &(),
                format!("may not be specified when \"{disc_name}\" is \"{disc_value}\""),
            ));
        } else if !is_set && is_discriminated {
            errs.push(invalid(
                &fld.child(&member.field_name),
                &(),
                format!("must be specified when \"{disc_name}\" is \"{disc_value}\""),
            ));
        }
    }
    errs
}
