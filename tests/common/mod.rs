//! Shared fixtures for the integration tests: compact builders for schema
//! universes and a one-call planning helper.

#![allow(dead_code)]

use niyama::gen::traverse::{self, TypePlan};
use niyama::schema::{FieldDef, IntKind, TypeBody, TypeDef, TypeExpr, TypeName, Universe};
use niyama::tags::registry::build_default_registry;

pub const PKG: &str = "demo/v1";

pub fn tn(name: &str) -> TypeName {
    TypeName::new(PKG, name)
}

pub fn named(name: &str) -> TypeExpr {
    TypeExpr::Named {
        package: PKG.to_string(),
        name: name.to_string(),
    }
}

pub fn int32() -> TypeExpr {
    TypeExpr::Int { width: IntKind::I32 }
}

pub fn string() -> TypeExpr {
    TypeExpr::String
}

pub fn optional(elem: TypeExpr) -> TypeExpr {
    TypeExpr::Optional { elem: Box::new(elem) }
}

pub fn slice(elem: TypeExpr) -> TypeExpr {
    TypeExpr::Slice { elem: Box::new(elem) }
}

pub fn map(key: TypeExpr, value: TypeExpr) -> TypeExpr {
    TypeExpr::Map {
        key: Box::new(key),
        value: Box::new(value),
    }
}

pub fn field(rust_name: &str, json_name: &str, doc: &[&str], ty: TypeExpr) -> FieldDef {
    FieldDef {
        rust_name: rust_name.to_string(),
        json_name: json_name.to_string(),
        doc: doc.iter().map(|s| s.to_string()).collect(),
        ty,
    }
}

pub fn strukt(name: &str, doc: &[&str], fields: Vec<FieldDef>) -> TypeDef {
    TypeDef {
        name: tn(name),
        doc: doc.iter().map(|s| s.to_string()).collect(),
        symbols: Vec::new(),
        body: TypeBody::Struct { fields },
    }
}

pub fn alias(name: &str, doc: &[&str], of: TypeExpr, symbols: &[&str]) -> TypeDef {
    TypeDef {
        name: tn(name),
        doc: doc.iter().map(|s| s.to_string()).collect(),
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        body: TypeBody::Alias { of },
    }
}

pub fn universe(types: Vec<TypeDef>, roots: &[&str]) -> Universe {
    let mut u = Universe::new();
    for t in types {
        u.insert(t).expect("unique type names in fixtures");
    }
    for r in roots {
        u.add_root(tn(r));
    }
    u
}

/// Plans the universe against the default registry, panicking on
/// generation errors.
pub fn plan_for(u: &Universe) -> Vec<TypePlan> {
    let registry = build_default_registry();
    traverse::plan(u, &registry).expect("planning succeeds")
}

/// Plans and returns the error, panicking on success.
pub fn plan_err(u: &Universe) -> niyama::GenError {
    let registry = build_default_registry();
    traverse::plan(u, &registry).expect_err("planning fails")
}

/// Finds a plan by bare type name.
pub fn plan_named<'a>(plans: &'a [TypePlan], name: &str) -> &'a TypePlan {
    plans
        .iter()
        .find(|p| p.type_name == tn(name))
        .unwrap_or_else(|| panic!("no plan for {name}"))
}
