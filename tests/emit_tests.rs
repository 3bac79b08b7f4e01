//! The code emitter: stable output and the shape of rendered validators.

mod common;

use common::*;

use niyama::gen::emit::emit;

fn fixture() -> niyama::schema::Universe {
    universe(
        vec![
            strukt(
                "Item",
                &[],
                vec![
                    field("key", "key", &[], string()),
                    field("count", "count", &["+k8s:minimum=0"], int32()),
                ],
            ),
            strukt(
                "Widget",
                &[],
                vec![
                    field(
                        "name",
                        "name",
                        &["+k8s:required", "+k8s:format=dns-label"],
                        string(),
                    ),
                    field(
                        "replicas",
                        "replicas",
                        &["+k8s:optional", "+k8s:minimum=1"],
                        optional(int32()),
                    ),
                    field(
                        "items",
                        "items",
                        &[
                            "+k8s:listType=map",
                            "+k8s:listMapKey=key",
                            "+k8s:maxItems=4",
                        ],
                        slice(named("Item")),
                    ),
                    field("m1", "m1", &["+k8s:unionMember"], optional(string())),
                    field("m2", "m2", &["+k8s:unionMember"], optional(string())),
                ],
            ),
        ],
        &["Widget"],
    )
}

fn emitted() -> String {
    let u = fixture();
    let plans = plan_for(&u);
    emit(&plans, u.roots())
}

#[test]
fn identical_inputs_yield_byte_identical_output() {
    assert_eq!(emitted(), emitted());
}

#[test]
fn validators_have_the_canonical_signature() {
    let code = emitted();
    assert!(code.contains("pub(crate) fn validate_widget("), "{code}");
    assert!(code.contains("new: Option<&Widget>,"), "{code}");
    assert!(code.contains("old: Option<&Widget>,"), "{code}");
    assert!(code.contains(") -> ErrorList {"), "{code}");
}

#[test]
fn leaves_are_emitted_before_their_ancestors() {
    let code = emitted();
    let item_pos = code.find("fn validate_item(").expect("item validator");
    let widget_pos = code.find("fn validate_widget(").expect("widget validator");
    assert!(item_pos < widget_pos);
}

#[test]
fn struct_validators_open_with_the_ratchet_short_circuit() {
    let code = emitted();
    assert!(
        code.contains("if op.is_update() && ratchet::deep_equal_opt(new, old) {"),
        "{code}"
    );
}

#[test]
fn required_short_circuits_inside_the_field_block() {
    let code = emitted();
    assert!(code.contains("'fld_name: {"), "{code}");
    assert!(code.contains("let e = presence::required_value(op, &fld, new_name, old_name);"), "{code}");
    assert!(code.contains("break 'fld_name;"), "{code}");
}

#[test]
fn optional_fields_flatten_unless_the_call_wants_the_option() {
    let code = emitted();
    // optional() wants the option itself; minimum wants the pointee.
    assert!(code.contains("let new_replicas_p = new.map(|v| &v.replicas);"), "{code}");
    assert!(
        code.contains("let new_replicas = new.and_then(|v| v.replicas.as_ref());"),
        "{code}"
    );
    assert!(
        code.contains("presence::optional_option(op, &fld, new_replicas_p, old_replicas_p)"),
        "{code}"
    );
    assert!(code.contains("limits::minimum(op, &fld, new_replicas, old_replicas, 1)"), "{code}");
}

#[test]
fn list_map_fields_check_max_items_key_uniqueness_and_descend() {
    let code = emitted();
    assert!(code.contains("let new_items = new.map(|v| v.items.as_slice());"), "{code}");
    assert!(code.contains("limits::max_items(op, &fld, new_items, old_items, 4)"), "{code}");
    assert!(
        code.contains("each::unique_by_match(op, &fld, new_items, old_items, |a, b| a.key == b.key)"),
        "{code}"
    );
    assert!(
        code.contains("each::each_slice_val(op, &fld, new_items, old_items, Some(|a, b| a.key == b.key), Some(ratchet::deep_equal), validate_item)"),
        "{code}"
    );
}

#[test]
fn union_membership_becomes_a_static_and_a_call() {
    let code = emitted();
    assert!(
        code.contains("static UNION_MEMBERSHIP_FOR_WIDGET: LazyLock<union::UnionMembership> ="),
        "{code}"
    );
    assert!(
        code.contains("union::UnionMembership::new(&[(\"m1\", \"M1\"), (\"m2\", \"M2\")])"),
        "{code}"
    );
    assert!(code.contains("union::union(op, fld, new, old, &*UNION_MEMBERSHIP_FOR_WIDGET, &[(|v: &Widget| v.m1.is_some()) as fn(&Widget) -> bool, |v: &Widget| v.m2.is_some()])"), "{code}");
}

#[test]
fn roots_are_wired_into_the_register_function() {
    let code = emitted();
    assert!(code.contains("pub fn register(scheme: &mut niyama::dispatch::Scheme) {"), "{code}");
    assert!(code.contains("scheme.add_validation::<Widget>(validate_widget);"), "{code}");
    // Item is generated but not a root.
    assert!(!code.contains("scheme.add_validation::<Item>(validate_item);"), "{code}");
}

#[test]
fn condition_guards_wrap_the_generated_call() {
    let u = universe(
        vec![strukt(
            "Widget",
            &[],
            vec![field(
                "n",
                "n",
                &["+k8s:ifOptionEnabled(BigWidgets)=+k8s:minimum=1"],
                int32(),
            )],
        )],
        &[],
    );
    let plans = plan_for(&u);
    let code = emit(&plans, &[]);
    assert!(code.contains("if op.has_option(\"BigWidgets\") {"), "{code}");
    assert!(code.contains("limits::minimum(op, &fld, new_n, old_n, 1)"), "{code}");
}

#[test]
fn subfield_tags_navigate_before_calling() {
    let u = universe(
        vec![
            strukt("Inner", &[], vec![field("name", "name", &[], string())]),
            strukt(
                "Outer",
                &[],
                vec![field(
                    "inner",
                    "inner",
                    &["+k8s:subfield(name)=+k8s:required"],
                    named("Inner"),
                )],
            ),
        ],
        &[],
    );
    let plans = plan_for(&u);
    let code = emit(&plans, &[]);
    assert!(code.contains("let fld = fld.child(\"name\");"), "{code}");
    assert!(code.contains("let new_sub0 = new_inner.map(|v| &v.name);"), "{code}");
    assert!(code.contains("presence::required_value(op, &fld, new_sub0, old_sub0)"), "{code}");
}

#[test]
fn each_val_renders_an_inline_closure() {
    let u = universe(
        vec![strukt(
            "Widget",
            &[],
            vec![field(
                "labels",
                "labels",
                &["+k8s:eachVal=+k8s:format=dns-label"],
                slice(string()),
            )],
        )],
        &[],
    );
    let plans = plan_for(&u);
    let code = emit(&plans, &[]);
    assert!(code.contains("|op, fld, new, old| {"), "{code}");
    assert!(code.contains("errs.extend(limits::dns_label(op, fld, new, old));"), "{code}");
}
