//! Deterministic naming for generated symbols.

use crate::schema::{TypeExpr, TypeName};

/// Converts a CamelCase type name to snake_case.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

/// The base (undisambiguated) name of a type's generated validator.
pub fn validator_base_name(tn: &TypeName) -> String {
    format!("validate_{}", snake_case(&tn.name))
}

/// The name of the emitted union membership static for a type and union.
pub fn union_static_name(type_name: &str, union_name: &str) -> String {
    let mut ident = format!("UNION_MEMBERSHIP_FOR_{}", snake_case(type_name).to_uppercase());
    if !union_name.is_empty() {
        ident.push('_');
        ident.push_str(&snake_case(union_name).to_uppercase());
    }
    ident
}

/// Renders a schema type expression as Rust source. Named types render as
/// their bare local name; the generated module imports them from its parent.
pub fn rust_type(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::String => "String".to_string(),
        TypeExpr::Bool => "bool".to_string(),
        TypeExpr::Int { width } => width.rust_name().to_string(),
        TypeExpr::Named { name, .. } => name.clone(),
        TypeExpr::Optional { elem } => format!("Option<{}>", rust_type(elem)),
        TypeExpr::Slice { elem } => format!("Vec<{}>", rust_type(elem)),
        TypeExpr::Map { key, value } => format!(
            "std::collections::HashMap<{}, {}>",
            rust_type(key),
            rust_type(value)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_handles_acronym_runs() {
        assert_eq!(snake_case("ReplicaSetSpec"), "replica_set_spec");
        assert_eq!(snake_case("DNSPolicy"), "dnspolicy");
        assert_eq!(snake_case("PodIP"), "pod_ip");
    }

    #[test]
    fn union_static_names() {
        assert_eq!(union_static_name("Widget", ""), "UNION_MEMBERSHIP_FOR_WIDGET");
        assert_eq!(
            union_static_name("Widget", "power"),
            "UNION_MEMBERSHIP_FOR_WIDGET_POWER"
        );
    }
}
