//! End-to-end scenarios: hand-written validators in exactly the shape the
//! emitter renders, wired through the runtime dispatcher. Companion checks
//! in `emit_tests.rs` and the cross-checks at the bottom keep these in step
//! with what the generator actually produces.

mod common;

use serde::Serialize;

use niyama::dispatch::Scheme;
use niyama::testing::{ExpectedError, ValidationTester};
use niyama::validate::path::FieldPath;
use niyama::validate::{each, limits, presence, ratchet, union};
use niyama::validate::{ErrorKind, ErrorList, OperationContext};

// ============================================================================
// SCENARIO 1: minimum=0 on spec.minReadySeconds
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct MinReadyRoot {
    spec: MinReadySpec,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct MinReadySpec {
    min_ready_seconds: i32,
}

fn validate_min_ready_spec(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&MinReadySpec>,
    old: Option<&MinReadySpec>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // minReadySeconds
    {
        let fld = fld.child("minReadySeconds");
        let new_v = new.map(|v| &v.min_ready_seconds);
        let old_v = old.map(|v| &v.min_ready_seconds);
        errs.extend(limits::minimum(op, &fld, new_v, old_v, 0));
    }
    errs
}

fn validate_min_ready_root(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&MinReadyRoot>,
    old: Option<&MinReadyRoot>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // spec
    {
        let fld = fld.child("spec");
        let new_v = new.map(|v| &v.spec);
        let old_v = old.map(|v| &v.spec);
        errs.extend(validate_min_ready_spec(op, &fld, new_v, old_v));
    }
    errs
}

#[test]
fn scenario_1_min_ready_below_minimum() {
    let bad = MinReadyRoot {
        spec: MinReadySpec {
            min_ready_seconds: -1,
        },
    };
    let errs = ValidationTester::new(validate_min_ready_root, &bad).run();
    assert_eq!(errs.len(), 1);
    let err = errs.iter().next().unwrap();
    assert_eq!(err.kind, ErrorKind::Invalid);
    assert_eq!(err.field.to_string(), "spec.minReadySeconds");
    assert_eq!(err.origin.as_deref(), Some("minimum"));

    let ok = MinReadyRoot::default();
    ValidationTester::new(validate_min_ready_root, &ok).expect_valid();
}

// ============================================================================
// SCENARIO 2: required pointer field spec.replicas
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct ReplicasRoot {
    spec: ReplicasSpec,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct ReplicasSpec {
    replicas: Option<i32>,
}

fn validate_replicas_spec(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&ReplicasSpec>,
    old: Option<&ReplicasSpec>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // replicas
    {
        let fld = fld.child("replicas");
        let new_p = new.map(|v| &v.replicas);
        let old_p = old.map(|v| &v.replicas);
        'fld_replicas: {
            let e = presence::required_option(op, &fld, new_p, old_p);
            if !e.is_empty() {
                errs.extend(e);
                break 'fld_replicas;
            }
        }
    }
    errs
}

fn validate_replicas_root(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&ReplicasRoot>,
    old: Option<&ReplicasRoot>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // spec
    {
        let fld = fld.child("spec");
        let new_v = new.map(|v| &v.spec);
        let old_v = old.map(|v| &v.spec);
        errs.extend(validate_replicas_spec(op, &fld, new_v, old_v));
    }
    errs
}

#[test]
fn scenario_2_nil_replicas_is_required() {
    let bad = ReplicasRoot::default();
    ValidationTester::new(validate_replicas_root, &bad).expect_invalid(&[ExpectedError::new(
        ErrorKind::Required,
        "spec.replicas",
    )]);

    let ok = ReplicasRoot {
        spec: ReplicasSpec { replicas: Some(0) },
    };
    ValidationTester::new(validate_replicas_root, &ok).expect_valid();
}

// ============================================================================
// SCENARIO 3: ratcheting suppresses a pre-existing minimum violation
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct RatchetRoot {
    min_field: i32,
}

fn validate_ratchet_root(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&RatchetRoot>,
    old: Option<&RatchetRoot>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // minField
    {
        let fld = fld.child("minField");
        let new_v = new.map(|v| &v.min_field);
        let old_v = old.map(|v| &v.min_field);
        errs.extend(limits::minimum(op, &fld, new_v, old_v, 1));
    }
    errs
}

#[test]
fn scenario_3_noop_update_never_fails() {
    let stored = RatchetRoot { min_field: 0 };

    let create_errs = ValidationTester::new(validate_ratchet_root, &stored).run();
    assert_eq!(create_errs.len(), 1);
    assert_eq!(create_errs.iter().next().unwrap().origin.as_deref(), Some("minimum"));

    ValidationTester::new(validate_ratchet_root, &stored)
        .old_value(&stored)
        .expect_valid();
}

// ============================================================================
// SCENARIO 4: union of m1/m2, exactly one must be set
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct UnionRoot {
    m1: Option<String>,
    m2: Option<String>,
}

static UNION_MEMBERSHIP_FOR_UNION_ROOT: std::sync::LazyLock<union::UnionMembership> =
    std::sync::LazyLock::new(|| union::UnionMembership::new(&[("m1", "M1"), ("m2", "M2")]));

fn validate_union_root(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&UnionRoot>,
    old: Option<&UnionRoot>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    errs.extend(union::union(
        op,
        fld,
        new,
        old,
        &UNION_MEMBERSHIP_FOR_UNION_ROOT,
        &[
            (|v: &UnionRoot| v.m1.is_some()) as fn(&UnionRoot) -> bool,
            |v: &UnionRoot| v.m2.is_some(),
        ],
    ));
    errs
}

#[test]
fn scenario_4_union_exactly_one() {
    let both = UnionRoot {
        m1: Some("a".to_string()),
        m2: Some("b".to_string()),
    };
    let neither = UnionRoot::default();
    for value in [&both, &neither] {
        let errs = ValidationTester::new(validate_union_root, value).run();
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::Invalid);
        assert!(
            err.detail.contains("must specify exactly one of: m1, m2"),
            "{}",
            err.detail
        );
    }

    let one = UnionRoot {
        m1: Some("a".to_string()),
        ..UnionRoot::default()
    };
    ValidationTester::new(validate_union_root, &one).expect_valid();
}

// ============================================================================
// SCENARIO 5: format=dns-label
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct LabeledRoot {
    host: String,
}

fn validate_labeled_root(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&LabeledRoot>,
    old: Option<&LabeledRoot>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // host
    {
        let fld = fld.child("host");
        let new_v = new.map(|v| &v.host);
        let old_v = old.map(|v| &v.host);
        errs.extend(limits::dns_label(op, &fld, new_v, old_v));
    }
    errs
}

#[test]
fn scenario_5_dns_label_rejects_mixed_case() {
    let bad = LabeledRoot {
        host: "Invalid-Label".to_string(),
    };
    let errs = ValidationTester::new(validate_labeled_root, &bad).run();
    // One error modulo the (kind, field, origin) equivalence the matchers
    // use; the predicate may phrase multiple problems.
    assert!(!errs.is_empty());
    for err in errs.iter() {
        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.field.to_string(), "host");
        assert_eq!(err.origin.as_deref(), Some("format=dns-label"));
    }

    let ok = LabeledRoot {
        host: "valid-label".to_string(),
    };
    ValidationTester::new(validate_labeled_root, &ok).expect_valid();
}

// ============================================================================
// SCENARIO 6: keyed list with maxItems=1 reports both TooMany and Duplicate
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct KeyedItem {
    key: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct KeyedRoot {
    items: Vec<KeyedItem>,
}

fn validate_keyed_root(
    op: &OperationContext,
    fld: &FieldPath,
    new: Option<&KeyedRoot>,
    old: Option<&KeyedRoot>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    if op.is_update() && ratchet::deep_equal_opt(new, old) {
        return errs;
    }
    // items
    {
        let fld = fld.child("items");
        let new_v = new.map(|v| v.items.as_slice());
        let old_v = old.map(|v| v.items.as_slice());
        'fld_items: {
            errs.extend(each::unique_by_match(op, &fld, new_v, old_v, |a, b| {
                a.key == b.key
            }));
            let e = limits::max_items(op, &fld, new_v, old_v, 1);
            if !e.is_empty() {
                errs.extend(e);
                break 'fld_items;
            }
        }
    }
    errs
}

#[test]
fn scenario_6_keyed_list_reports_both_errors() {
    let bad = KeyedRoot {
        items: vec![
            KeyedItem { key: "a".to_string() },
            KeyedItem { key: "a".to_string() },
        ],
    };
    ValidationTester::new(validate_keyed_root, &bad).expect_invalid(&[
        ExpectedError::new(ErrorKind::Duplicate, "items[1]"),
        ExpectedError::new(ErrorKind::TooMany, "items").with_origin("maxItems"),
    ]);
}

// ============================================================================
// DISPATCHER WIRING AND UNIVERSAL PROPERTIES
// ============================================================================

fn scheme() -> Scheme {
    let mut scheme = Scheme::new();
    scheme.add_validation::<MinReadyRoot>(validate_min_ready_root);
    scheme.add_validation::<ReplicasRoot>(validate_replicas_root);
    scheme.add_validation::<RatchetRoot>(validate_ratchet_root);
    scheme.add_validation::<UnionRoot>(validate_union_root);
    scheme.add_validation::<LabeledRoot>(validate_labeled_root);
    scheme.add_validation::<KeyedRoot>(validate_keyed_root);
    scheme
}

#[test]
fn dispatcher_routes_by_value_type() {
    let s = scheme();
    let bad = MinReadyRoot {
        spec: MinReadySpec {
            min_ready_seconds: -1,
        },
    };
    let errs = s.validate(im::HashSet::new(), &bad, &[]);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs.iter().next().unwrap().field.to_string(), "spec.minReadySeconds");
}

#[test]
fn noop_updates_never_fail_for_any_fixture() {
    let s = scheme();
    let keyed = KeyedRoot {
        items: vec![
            KeyedItem { key: "a".to_string() },
            KeyedItem { key: "a".to_string() },
        ],
    };
    assert!(s.validate_update(im::HashSet::new(), &keyed, &keyed, &[]).is_empty());

    let union_bad = UnionRoot::default();
    assert!(s
        .validate_update(im::HashSet::new(), &union_bad, &union_bad, &[])
        .is_empty());

    let ratchet_bad = RatchetRoot { min_field: -10 };
    assert!(s
        .validate_update(im::HashSet::new(), &ratchet_bad, &ratchet_bad, &[])
        .is_empty());
}

#[test]
fn ratcheting_is_monotonic() {
    // Every error from an update is an error a fresh create of the same
    // value would also report.
    let s = scheme();
    let old = RatchetRoot { min_field: 2 };
    let new = RatchetRoot { min_field: 0 };
    let update_errs = s.validate_update(im::HashSet::new(), &new, &old, &[]);
    let create_errs = s.validate(im::HashSet::new(), &new, &[]);
    for err in update_errs.iter() {
        assert!(
            create_errs.iter().any(|c| c.equivalent(err)),
            "update reported an error create would not: {err}"
        );
    }
    assert_eq!(update_errs.len(), 1);
}

// ============================================================================
// CROSS-CHECKS: the generator plans the same calls the fixtures hand-write
// ============================================================================

mod generator_cross_checks {
    use super::common::*;
    use niyama::gen::emit::emit;

    #[test]
    fn scenario_1_schema_generates_the_minimum_call() {
        let u = universe(
            vec![
                strukt(
                    "MinReadySpec",
                    &[],
                    vec![field(
                        "min_ready_seconds",
                        "minReadySeconds",
                        &["+k8s:minimum=0"],
                        int32(),
                    )],
                ),
                strukt(
                    "MinReadyRoot",
                    &[],
                    vec![field("spec", "spec", &[], named("MinReadySpec"))],
                ),
            ],
            &["MinReadyRoot"],
        );
        let code = emit(&plan_for(&u), u.roots());
        assert!(code.contains("let fld = fld.child(\"minReadySeconds\");"), "{code}");
        assert!(
            code.contains("limits::minimum(op, &fld, new_min_ready_seconds, old_min_ready_seconds, 0)"),
            "{code}"
        );
        assert!(
            code.contains("errs.extend(validate_min_ready_spec(op, &fld, new_spec, old_spec));"),
            "{code}"
        );
    }

    #[test]
    fn scenario_6_schema_generates_unique_before_max_items() {
        let u = universe(
            vec![
                strukt("KeyedItem", &[], vec![field("key", "key", &["+k8s:required"], string())]),
                strukt(
                    "KeyedRoot",
                    &[],
                    vec![field(
                        "items",
                        "items",
                        &[
                            "+k8s:listType=map",
                            "+k8s:listMapKey=key",
                            "+k8s:maxItems=1",
                        ],
                        slice(named("KeyedItem")),
                    )],
                ),
            ],
            &["KeyedRoot"],
        );
        let code = emit(&plan_for(&u), u.roots());
        let unique_pos = code
            .find("each::unique_by_match(op, &fld, new_items, old_items, |a, b| a.key == b.key)")
            .expect("unique call present");
        let max_items_pos = code
            .find("limits::max_items(op, &fld, new_items, old_items, 1)")
            .expect("max items call present");
        assert!(unique_pos < max_items_pos, "duplicates report before the size check stops the chain");
    }
}
