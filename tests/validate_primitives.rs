//! Behavior of the scalar runtime validators: presence, bounds, formats,
//! enums, immutability.

use niyama::validate::path::FieldPath;
use niyama::validate::{limits, presence, ErrorKind, OperationContext};

fn create() -> OperationContext {
    OperationContext::create()
}

fn update() -> OperationContext {
    OperationContext::update()
}

fn fld() -> FieldPath {
    FieldPath::new("spec").child("f")
}

mod presence_tests {
    use super::*;

    #[test]
    fn required_value_rejects_zero_values() {
        let errs = presence::required_value(&create(), &fld(), Some(&0i32), None);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().kind, ErrorKind::Required);

        let errs = presence::required_value(&create(), &fld(), Some(&String::new()), None);
        assert_eq!(errs.len(), 1);

        assert!(presence::required_value(&create(), &fld(), Some(&7i32), None).is_empty());
    }

    #[test]
    fn required_option_rejects_absent() {
        let none: Option<i32> = None;
        let some: Option<i32> = Some(0);
        assert_eq!(presence::required_option(&create(), &fld(), Some(&none), None).len(), 1);
        // A present option holding a zero value is still present.
        assert!(presence::required_option(&create(), &fld(), Some(&some), None).is_empty());
        assert_eq!(
            presence::required_option::<i32>(&create(), &fld(), None, None).len(),
            1
        );
    }

    #[test]
    fn required_containers_reject_empty() {
        let empty: Vec<i32> = vec![];
        assert_eq!(
            presence::required_slice(&create(), &fld(), Some(empty.as_slice()), None).len(),
            1
        );
        assert!(presence::required_slice(&create(), &fld(), Some([1].as_slice()), None).is_empty());

        let empty_map: std::collections::HashMap<String, i32> = Default::default();
        assert_eq!(
            presence::required_map(&create(), &fld(), Some(&empty_map), None).len(),
            1
        );
    }

    #[test]
    fn optional_marks_absent_without_reporting_anything_real() {
        // The marker is discarded by generated code; what matters is that
        // presence yields an empty list and absence does not.
        assert!(presence::optional_value(&create(), &fld(), Some(&5i32), None).is_empty());
        assert!(!presence::optional_value(&create(), &fld(), Some(&0i32), None).is_empty());
    }

    #[test]
    fn forbidden_mirrors_required() {
        assert!(presence::forbidden_value(&create(), &fld(), Some(&0i32), None).is_empty());
        let errs = presence::forbidden_value(&create(), &fld(), Some(&3i32), None);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().kind, ErrorKind::Forbidden);

        let some: Option<i32> = Some(1);
        let errs = presence::forbidden_option(&create(), &fld(), Some(&some), None);
        assert_eq!(errs.iter().next().unwrap().kind, ErrorKind::Forbidden);
    }
}

mod limit_tests {
    use super::*;

    #[test]
    fn minimum_reports_origin_and_detail() {
        let errs = limits::minimum(&create(), &fld(), Some(&-1i32), None, 0);
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.origin.as_deref(), Some("minimum"));
        assert!(err.detail.contains("greater than or equal to 0"));

        assert!(limits::minimum(&create(), &fld(), Some(&0i32), None, 0).is_empty());
        assert!(limits::minimum(&create(), &fld(), Some(&1u64), None, 1).is_empty());
    }

    #[test]
    fn minimum_handles_signed_widths() {
        assert!(limits::minimum(&create(), &fld(), Some(&-1i64), None, -1).is_empty());
        assert_eq!(limits::minimum(&create(), &fld(), Some(&-2i8), None, -1).len(), 1);
    }

    #[test]
    fn max_length_counts_characters() {
        let v = "abcd".to_string();
        let errs = limits::max_length(&create(), &fld(), Some(&v), None, 3);
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.origin.as_deref(), Some("maxLength"));
        assert!(limits::max_length(&create(), &fld(), Some(&v), None, 4).is_empty());
    }

    #[test]
    fn max_length_negative_limit_fails_every_value() {
        // Even the empty string is over a negative limit; the ordinary
        // comparison covers it with no special casing.
        let v = String::new();
        let errs = limits::max_length(&create(), &fld(), Some(&v), None, -1);
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.origin.as_deref(), Some("maxLength"));
        assert!(err.detail.contains("must be no more than"), "{}", err.detail);
    }

    #[test]
    fn max_items_is_too_many() {
        let items = vec![1, 2, 3];
        let errs = limits::max_items(&create(), &fld(), Some(items.as_slice()), None, 2);
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::TooMany);
        assert_eq!(err.origin.as_deref(), Some("maxItems"));
        assert!(limits::max_items(&create(), &fld(), Some(items.as_slice()), None, 3).is_empty());
    }

    #[test]
    fn max_items_negative_limit_fails_even_empty_lists() {
        let empty: Vec<i32> = vec![];
        let errs = limits::max_items(&create(), &fld(), Some(empty.as_slice()), None, -1);
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::TooMany);
        assert_eq!(err.origin.as_deref(), Some("maxItems"));
        assert_eq!(err.detail, "too many items");
    }

    #[test]
    fn enum_value_lists_supported_symbols_sorted() {
        let v = "Purple".to_string();
        let errs = limits::enum_value(&create(), &fld(), Some(&v), None, &["Red", "Blue"]);
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::NotSupported);
        assert!(err.detail.contains("\"Blue\", \"Red\""));
        let ok = "Red".to_string();
        assert!(limits::enum_value(&create(), &fld(), Some(&ok), None, &["Red", "Blue"]).is_empty());
    }

    #[test]
    fn immutable_only_bites_on_update() {
        let a = "a".to_string();
        let b = "b".to_string();
        assert!(limits::immutable(&create(), &fld(), Some(&b), Some(&a)).is_empty());
        let errs = limits::immutable(&update(), &fld(), Some(&b), Some(&a));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().origin.as_deref(), Some("immutable"));
        assert!(limits::immutable(&update(), &fld(), Some(&a), Some(&a)).is_empty());
        // Introducing a value where none existed is allowed.
        assert!(limits::immutable(&update(), &fld(), Some(&a), None).is_empty());
    }
}

mod format_tests {
    use super::*;

    #[test]
    fn dns_label_reports_one_error_per_problem() {
        let v = "Invalid-Label".to_string();
        let errs = limits::dns_label(&create(), &fld(), Some(&v), None);
        assert!(!errs.is_empty());
        for err in errs.iter() {
            assert_eq!(err.kind, ErrorKind::Invalid);
            assert_eq!(err.origin.as_deref(), Some("format=dns-label"));
        }
        let ok = "valid-label".to_string();
        assert!(limits::dns_label(&create(), &fld(), Some(&ok), None).is_empty());
    }

    #[test]
    fn ip_sloppy_accepts_leading_zero_octets() {
        let v = "010.0.0.1".to_string();
        assert!(limits::ip_sloppy(&create(), &fld(), Some(&v), None).is_empty());
        let bad = "300.0.0.1".to_string();
        let errs = limits::ip_sloppy(&create(), &fld(), Some(&bad), None);
        assert_eq!(errs.iter().next().unwrap().origin.as_deref(), Some("format=ip-sloppy"));
    }
}

mod probe_tests {
    use super::*;

    #[test]
    fn fixed_result_carries_the_message() {
        assert!(limits::fixed_result(&create(), &fld(), Some(&1i32), None, true, "x").is_empty());
        let errs = limits::fixed_result(&create(), &fld(), Some(&1i32), None, false, "probe 1");
        assert_eq!(errs.len(), 1);
        assert!(errs.iter().next().unwrap().detail.contains("forced failure: probe 1"));
    }
}

mod purity_tests {
    use super::*;

    #[test]
    fn validators_are_deterministic() {
        let v = "Invalid-Label".to_string();
        let a = limits::dns_label(&create(), &fld(), Some(&v), None);
        let b = limits::dns_label(&create(), &fld(), Some(&v), None);
        assert_eq!(a, b);

        let items = vec![3, 1, 3, 1];
        let a = niyama::validate::each::unique_by_compare(&create(), &fld(), Some(items.as_slice()), None);
        let b = niyama::validate::each::unique_by_compare(&create(), &fld(), Some(items.as_slice()), None);
        assert_eq!(a, b);
    }
}
