//! Behavior of the container iteration validators and uniqueness checks,
//! including update-time ratcheting.

use std::collections::HashMap;

use serde::Serialize;

use niyama::validate::each;
use niyama::validate::limits;
use niyama::validate::path::FieldPath;
use niyama::validate::{ErrorKind, ErrorList, OperationContext};

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Item {
    key: String,
    data: i32,
}

fn item(key: &str, data: i32) -> Item {
    Item {
        key: key.to_string(),
        data,
    }
}

fn fld() -> FieldPath {
    FieldPath::new("list")
}

// The element validator used throughout: data must be >= 1.
fn check_item(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&Item>,
    old: Option<&Item>,
) -> ErrorList {
    limits::minimum(op, &fld.child("data"), new.map(|i| &i.data), old.map(|i| &i.data), 1)
}

mod slice_tests {
    use super::*;

    #[test]
    fn create_validates_every_element() {
        let items = vec![item("a", 0), item("b", 2), item("c", 0)];
        let errs = each::each_slice_val(
            &OperationContext::create(),
            &fld(),
            Some(items.as_slice()),
            None,
            None,
            Some(niyama::validate::ratchet::deep_equal),
            check_item,
        );
        assert_eq!(errs.len(), 2);
        let fields: Vec<String> = errs.iter().map(|e| e.field.to_string()).collect();
        assert_eq!(fields, vec!["list[0].data", "list[2].data"]);
    }

    #[test]
    fn update_skips_positionally_unchanged_elements() {
        let old = vec![item("a", 0), item("b", 0)];
        let new = vec![item("a", 0), item("b", -1)];
        let errs = each::each_slice_val(
            &OperationContext::update(),
            &fld(),
            Some(new.as_slice()),
            Some(old.as_slice()),
            None,
            Some(niyama::validate::ratchet::deep_equal),
            check_item,
        );
        // new[0] is byte-identical to old[0]: ratcheted out. new[1] changed
        // and must be validated.
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().field.to_string(), "list[1].data");
    }

    #[test]
    fn update_with_key_correspondence_follows_reordering() {
        let old = vec![item("a", 0), item("b", 5)];
        // Same elements, reordered; "a" is still invalid but unchanged.
        let new = vec![item("b", 5), item("a", 0)];
        let by_key: each::CompareFn<Item> = |a, b| a.key == b.key;
        let errs = each::each_slice_val(
            &OperationContext::update(),
            &fld(),
            Some(new.as_slice()),
            Some(old.as_slice()),
            Some(by_key),
            Some(niyama::validate::ratchet::deep_equal),
            check_item,
        );
        assert!(errs.is_empty(), "reordered but unchanged elements must ratchet");
    }

    #[test]
    fn ratcheting_never_applies_on_create() {
        let old = vec![item("a", 0)];
        let new = vec![item("a", 0)];
        let errs = each::each_slice_val(
            &OperationContext::create(),
            &fld(),
            Some(new.as_slice()),
            Some(old.as_slice()),
            None,
            Some(niyama::validate::ratchet::deep_equal),
            check_item,
        );
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn ratcheting_does_not_suppress_new_invalidity() {
        let old = vec![item("a", 2)];
        let new = vec![item("a", 0)];
        let errs = each::each_slice_val(
            &OperationContext::update(),
            &fld(),
            Some(new.as_slice()),
            Some(old.as_slice()),
            None,
            Some(niyama::validate::ratchet::deep_equal),
            check_item,
        );
        assert_eq!(errs.len(), 1);
    }
}

mod map_tests {
    use super::*;

    fn check_count(
        op: &OperationContext,
        fld: &FieldPath,
        new: Option<&i32>,
        old: Option<&i32>,
    ) -> ErrorList {
        limits::minimum(op, fld, new, old, 1)
    }

    #[test]
    fn map_values_visit_keys_in_sorted_order() {
        let mut m = HashMap::new();
        m.insert("zeta".to_string(), 0);
        m.insert("alpha".to_string(), 0);
        let errs = each::each_map_val(
            &OperationContext::create(),
            &fld(),
            Some(&m),
            None,
            Some(niyama::validate::ratchet::direct_equal),
            check_count,
        );
        let fields: Vec<String> = errs.iter().map(|e| e.field.to_string()).collect();
        assert_eq!(fields, vec!["list[alpha]", "list[zeta]"]);
    }

    #[test]
    fn map_values_ratchet_by_key() {
        let mut old = HashMap::new();
        old.insert("a".to_string(), 0);
        old.insert("b".to_string(), 0);
        let mut new = HashMap::new();
        new.insert("a".to_string(), 0);
        new.insert("b".to_string(), -5);
        let errs = each::each_map_val(
            &OperationContext::update(),
            &fld(),
            Some(&new),
            Some(&old),
            Some(niyama::validate::ratchet::direct_equal),
            check_count,
        );
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().field.to_string(), "list[b]");
    }

    #[test]
    fn map_keys_skip_keys_already_present_in_old() {
        fn key_is_lowercase(
            _op: &OperationContext,
            fld: &FieldPath,
            new: Option<&String>,
            _old: Option<&String>,
        ) -> ErrorList {
            match new {
                Some(k) if k.chars().all(|c| c.is_ascii_lowercase()) => ErrorList::new(),
                Some(k) => ErrorList::of(niyama::validate::invalid(fld, k, "must be lower-case")),
                None => ErrorList::new(),
            }
        }

        let mut old = HashMap::new();
        old.insert("BAD".to_string(), 1);
        let mut new = HashMap::new();
        new.insert("BAD".to_string(), 1);
        new.insert("ALSOBAD".to_string(), 1);

        let create_errs = each::each_map_key(
            &OperationContext::create(),
            &fld(),
            Some(&new),
            None,
            key_is_lowercase,
        );
        assert_eq!(create_errs.len(), 2);

        let update_errs = each::each_map_key(
            &OperationContext::update(),
            &fld(),
            Some(&new),
            Some(&old),
            key_is_lowercase,
        );
        // "BAD" survived from old; only the newly-added key is validated.
        assert_eq!(update_errs.len(), 1);
    }
}

mod unique_tests {
    use super::*;

    #[test]
    fn duplicate_indices_are_strictly_ascending() {
        let items = vec![1, 2, 1, 2, 1];
        let errs = each::unique_by_compare(
            &OperationContext::create(),
            &fld(),
            Some(items.as_slice()),
            None,
        );
        let fields: Vec<String> = errs.iter().map(|e| e.field.to_string()).collect();
        assert_eq!(fields, vec!["list[2]", "list[3]", "list[4]"]);
        for err in errs.iter() {
            assert_eq!(err.kind, ErrorKind::Duplicate);
        }
    }

    #[test]
    fn unique_passes_distinct_elements() {
        let items = vec![1, 2, 3];
        assert!(each::unique_by_compare(
            &OperationContext::create(),
            &fld(),
            Some(items.as_slice()),
            None
        )
        .is_empty());
    }

    #[test]
    fn unique_by_reflect_compares_structurally() {
        let items = vec![item("a", 1), item("b", 2), item("a", 1)];
        let errs = each::unique_by_reflect(
            &OperationContext::create(),
            &fld(),
            Some(items.as_slice()),
            None,
        );
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().field.to_string(), "list[2]");
    }

    #[test]
    fn unique_by_match_collides_on_key_fields_only() {
        let items = vec![item("a", 1), item("a", 2)];
        let errs = each::unique_by_match(
            &OperationContext::create(),
            &fld(),
            Some(items.as_slice()),
            None,
            |a, b| a.key == b.key,
        );
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().field.to_string(), "list[1]");
    }
}
