//! Update-time ratcheting support.
//!
//! Ratcheting is the policy that an UPDATE must not fail validation for an
//! invalidity that already existed in the stored value. Container iteration
//! applies it per element (see [`crate::validate::each`]); generated struct
//! validators apply it as a whole-value short-circuit at entry using the
//! structural equality below.

use serde::Serialize;

/// Structural deep equality over serialized form.
///
/// This is an explicit value walk (via `serde_json::Value`), not host
/// reflection, so the equivalence is reproducible across implementations.
/// Values that fail to serialize are treated as unequal, which only ever
/// causes validation to run, never to be skipped.
pub fn deep_equal<T: Serialize>(a: &T, b: &T) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(va), Ok(vb)) => va == vb,
        _ => false,
    }
}

/// Deep equality over optional borrows, for generated short-circuits.
pub fn deep_equal_opt<T: Serialize>(a: Option<&T>, b: Option<&T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => deep_equal(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Direct equality as a ratcheting equivalence, for element types where
/// `PartialEq` is the declared correspondence.
pub fn direct_equal<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, PartialEq)]
    struct Inner {
        x: i32,
        tags: Vec<String>,
    }

    #[test]
    fn deep_equal_sees_through_structure() {
        let a = Inner { x: 1, tags: vec!["a".into()] };
        let b = Inner { x: 1, tags: vec!["a".into()] };
        let c = Inner { x: 1, tags: vec!["b".into()] };
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn opt_cases() {
        let a = Inner { x: 1, tags: vec![] };
        assert!(deep_equal_opt::<Inner>(None, None));
        assert!(!deep_equal_opt(Some(&a), None));
        assert!(deep_equal_opt(Some(&a), Some(&a)));
    }
}
