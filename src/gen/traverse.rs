//! The schema traversal: turns a type universe plus tag registry into
//! validator plans the emitter can render.
//!
//! The walk is an explicit recursion with a visited set. It runs in three
//! phases: extract tag emissions for every reachable type (fields first,
//! then the type definition, so accumulating tags are complete before type
//! validators fire); propagate "needs a validator" to a fixpoint so types
//! with nothing to say are elided; then assemble per-type plans with stable
//! ordering and leaves-first output.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::GenError;
use crate::gen::names::validator_base_name;
use crate::schema::{TypeBody, TypeDef, TypeExpr, TypeName, Universe};
use crate::tags::each::{bind_kind, equiv_kind_for, list_semantics, ListType};
use crate::tags::emission::{
    function, sort_emissions, Arg, BindKind, EquivKind, Flags, FunctionGen, Validations,
    ValidatorRef, VariableGen,
};
use crate::tags::misc::ratcheting_disabled;
use crate::tags::registry::TagRegistry;
use crate::tags::{Scope, TagContext};

/// Callee marker for a direct call to another generated validator.
pub const DELEGATE_CALLEE: &str = "<call>";

/// Everything the emitter needs to render one generated validator.
#[derive(Debug, Clone, PartialEq)]
pub struct TypePlan {
    pub type_name: TypeName,
    pub fn_name: String,
    /// Rendered Rust type of the validated value.
    pub rust_ty: String,
    /// Whether the validator starts with the update-time deep-equal
    /// short-circuit.
    pub ratchet: bool,
    /// How the whole value binds for type-level calls.
    pub self_bind: BindKind,
    pub variables: Vec<VariableGen>,
    /// Calls against the value itself, in emission order.
    pub type_calls: Vec<FunctionGen>,
    /// Per-field plans, in declaration order. Empty for non-structs.
    pub fields: Vec<FieldPlan>,
}

/// One struct field's slice of the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub json_name: String,
    pub rust_name: String,
    /// Whether the field is declared optional.
    pub optional: bool,
    /// How the field value binds for non-PTR_OK calls.
    pub bind: BindKind,
    pub calls: Vec<FunctionGen>,
}

struct RawExtraction {
    type_vals: Validations,
    field_vals: Vec<Validations>,
}

/// Walks the universe and produces validator plans, topologically ordered
/// leaves-first.
pub fn plan(universe: &Universe, registry: &TagRegistry) -> Result<Vec<TypePlan>, GenError> {
    let targets = target_set(universe);

    // Phase 1: extraction. Deterministic order via the sorted target set.
    let mut raw: BTreeMap<TypeName, RawExtraction> = BTreeMap::new();
    for name in &targets {
        let Some(def) = universe.get(name) else {
            continue;
        };
        let mut field_vals = Vec::new();
        if let TypeBody::Struct { fields } = &def.body {
            for field in fields {
                let ctx = TagContext {
                    scope: Scope::Field,
                    ty: &field.ty,
                    parent_def: Some(def),
                    parent_expr: None,
                    member: Some(field),
                    comments: &field.doc,
                    universe,
                };
                field_vals.push(registry.extract_validations(&ctx, &field.doc)?);
            }
        }
        let self_expr = TypeExpr::named(name);
        let ty_ref: &TypeExpr = match &def.body {
            TypeBody::Alias { of } => of,
            TypeBody::Struct { .. } => &self_expr,
        };
        let ctx = TagContext {
            scope: Scope::TypeDef,
            ty: ty_ref,
            parent_def: Some(def),
            parent_expr: None,
            member: None,
            comments: &def.doc,
            universe,
        };
        let type_vals = registry.extract_validations(&ctx, &def.doc)?;
        raw.insert(name.clone(), RawExtraction { type_vals, field_vals });
    }

    // Phase 2: elision fixpoint.
    let deps: BTreeMap<TypeName, BTreeSet<TypeName>> = targets
        .iter()
        .filter_map(|n| universe.get(n).map(|d| (n.clone(), named_refs(d))))
        .collect();
    let mut needs: BTreeMap<TypeName, bool> = raw
        .iter()
        .map(|(n, r)| {
            let has_own = !r.type_vals.is_empty() || r.field_vals.iter().any(|v| !v.is_empty());
            (n.clone(), has_own)
        })
        .collect();
    loop {
        let mut changed = false;
        for name in &targets {
            if needs.get(name).copied().unwrap_or(false) {
                continue;
            }
            let dep_needs = deps
                .get(name)
                .is_some_and(|ds| ds.iter().any(|d| needs.get(d).copied().unwrap_or(false)));
            if dep_needs {
                needs.insert(name.clone(), true);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let needed: Vec<TypeName> = targets
        .iter()
        .filter(|n| needs.get(*n).copied().unwrap_or(false))
        .cloned()
        .collect();

    // Phase 3a: deterministic name assignment with collision suffixes.
    let mut by_base: BTreeMap<String, Vec<TypeName>> = BTreeMap::new();
    for name in &needed {
        by_base
            .entry(validator_base_name(name))
            .or_default()
            .push(name.clone());
    }
    let mut fn_names: BTreeMap<TypeName, String> = BTreeMap::new();
    for (base, mut group) in by_base {
        group.sort();
        for (i, tn) in group.into_iter().enumerate() {
            let fn_name = if i == 0 { base.clone() } else { format!("{base}_{}", i + 1) };
            fn_names.insert(tn, fn_name);
        }
    }

    // Phase 3b: assemble plans.
    let walker = Walker {
        universe,
        fn_names: &fn_names,
    };
    let mut plans: BTreeMap<TypeName, TypePlan> = BTreeMap::new();
    for name in &needed {
        let def = universe.get(name).expect("needed type is declared");
        let extraction = raw.remove(name).expect("needed type was extracted");
        plans.insert(name.clone(), walker.assemble(def, extraction));
    }

    // Leaves-first output order: post-order DFS over the needed subgraph.
    let mut ordered = Vec::with_capacity(plans.len());
    let mut state: BTreeMap<TypeName, Visit> = BTreeMap::new();
    for name in &needed {
        topo_visit(name, &deps, &plans, &mut state, &mut ordered);
    }
    Ok(ordered.into_iter().map(|n| plans[&n].clone()).collect())
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

fn topo_visit(
    name: &TypeName,
    deps: &BTreeMap<TypeName, BTreeSet<TypeName>>,
    plans: &BTreeMap<TypeName, TypePlan>,
    state: &mut BTreeMap<TypeName, Visit>,
    out: &mut Vec<TypeName>,
) {
    if !plans.contains_key(name) || state.get(name).is_some() {
        // Cycles fall out here: an in-progress node is simply not
        // re-entered, and validators refer to each other by name.
        return;
    }
    state.insert(name.clone(), Visit::InProgress);
    if let Some(ds) = deps.get(name) {
        for dep in ds {
            if state.get(dep) != Some(&Visit::InProgress) {
                topo_visit(dep, deps, plans, state, out);
            }
        }
    }
    state.insert(name.clone(), Visit::Done);
    out.push(name.clone());
}

fn target_set(universe: &Universe) -> BTreeSet<TypeName> {
    if universe.roots().is_empty() {
        return universe.iter().map(|d| d.name.clone()).collect();
    }
    let mut seen: BTreeSet<TypeName> = BTreeSet::new();
    let mut stack: Vec<TypeName> = universe.roots().to_vec();
    while let Some(name) = stack.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(def) = universe.get(&name) {
            stack.extend(named_refs(def));
        }
    }
    seen
}

fn named_refs(def: &TypeDef) -> BTreeSet<TypeName> {
    let mut refs = BTreeSet::new();
    let mut exprs: Vec<&TypeExpr> = Vec::new();
    match &def.body {
        TypeBody::Alias { of } => exprs.push(of),
        TypeBody::Struct { fields } => exprs.extend(fields.iter().map(|f| &f.ty)),
    }
    while let Some(e) = exprs.pop() {
        match e {
            TypeExpr::Named { .. } => {
                refs.insert(e.as_named().expect("named expression"));
            }
            TypeExpr::Optional { elem } | TypeExpr::Slice { elem } => exprs.push(elem),
            TypeExpr::Map { key, value } => {
                exprs.push(key);
                exprs.push(value);
            }
            _ => {}
        }
    }
    refs
}

struct Walker<'a> {
    universe: &'a Universe,
    fn_names: &'a BTreeMap<TypeName, String>,
}

impl Walker<'_> {
    fn assemble(&self, def: &TypeDef, extraction: RawExtraction) -> TypePlan {
        let mut variables = extraction.type_vals.variables.clone();
        let mut type_calls = sort_emissions(extraction.type_vals.functions);

        let self_bind = match &def.body {
            TypeBody::Alias { of } => bind_kind(self.universe, of),
            TypeBody::Struct { .. } => BindKind::Direct,
        };

        // Alias definitions delegate to (or iterate into) what they name.
        if let TypeBody::Alias { of } = &def.body {
            type_calls.extend(self.descend(of, &def.doc));
        }

        let mut fields = Vec::new();
        if let TypeBody::Struct { fields: defs } = &def.body {
            for (field, vals) in defs.iter().zip(extraction.field_vals) {
                variables.extend(vals.variables);
                let mut calls = sort_emissions(vals.functions);
                calls.extend(self.descend(&field.ty, &field.doc));
                if calls.is_empty() {
                    continue;
                }
                fields.push(FieldPlan {
                    json_name: field.json_name.clone(),
                    rust_name: field.rust_name.clone(),
                    optional: field.ty.is_optional(),
                    bind: bind_kind(self.universe, field.ty.pointee()),
                    calls,
                });
            }
        }

        TypePlan {
            type_name: def.name.clone(),
            fn_name: self.fn_names[&def.name].clone(),
            rust_ty: crate::gen::names::rust_type(&TypeExpr::named(&def.name)),
            ratchet: !ratcheting_disabled(&def.doc),
            self_bind,
            variables,
            type_calls,
            fields,
        }
    }

    // Builds the calls that carry validation into a field's (or alias
    // target's) reachable named types. Types the fixpoint elided produce
    // nothing, so iteration wrappers over them disappear too.
    fn descend(&self, expr: &TypeExpr, comments: &[String]) -> Vec<FunctionGen> {
        let pointee = expr.pointee();
        if let Some(tn) = pointee.as_named() {
            let Some(fn_name) = self.fn_names.get(&tn) else {
                return Vec::new();
            };
            return vec![function(
                "",
                Flags::NONE,
                DELEGATE_CALLEE,
                vec![Arg::Validator {
                    vref: ValidatorRef::Named(fn_name.clone()),
                    bind: BindKind::Direct,
                }],
            )];
        }
        match self.universe.underlying(pointee) {
            TypeExpr::Slice { elem } => {
                let inner = self.descend(elem, &[]);
                if inner.is_empty() {
                    return Vec::new();
                }
                let sem = list_semantics(comments);
                let correspond = if sem.list_type == Some(ListType::Map) && !sem.map_keys.is_empty()
                {
                    match crate::tags::each::map_key_rust_fields(self.universe, elem, &sem.map_keys)
                    {
                        Ok(rust_fields) => Arg::KeyMatch {
                            rust_fields,
                            wrapped: true,
                        },
                        Err(_) => Arg::NoneLit,
                    }
                } else {
                    Arg::NoneLit
                };
                let equiv = if ratcheting_disabled(comments) {
                    EquivKind::None
                } else {
                    equiv_kind_for(self.universe, elem)
                };
                vec![function(
                    "",
                    Flags::NONE,
                    "each::each_slice_val",
                    vec![
                        correspond,
                        Arg::Equiv {
                            kind: equiv,
                            elem_ty: crate::gen::names::rust_type(elem),
                        },
                        Arg::Validator {
                            vref: inline_or_named(inner),
                            bind: bind_kind(self.universe, elem),
                        },
                    ],
                )]
            }
            TypeExpr::Map { key, value } => {
                let mut calls = Vec::new();
                let key_inner = self.descend(key, &[]);
                if !key_inner.is_empty() {
                    calls.push(function(
                        "",
                        Flags::NONE,
                        "each::each_map_key",
                        vec![Arg::Validator {
                            vref: inline_or_named(key_inner),
                            bind: BindKind::Direct,
                        }],
                    ));
                }
                let val_inner = self.descend(value, &[]);
                if !val_inner.is_empty() {
                    let equiv = if ratcheting_disabled(comments) {
                        EquivKind::None
                    } else {
                        equiv_kind_for(self.universe, value)
                    };
                    calls.push(function(
                        "",
                        Flags::NONE,
                        "each::each_map_val",
                        vec![
                            Arg::Equiv {
                                kind: equiv,
                                elem_ty: crate::gen::names::rust_type(value),
                            },
                            Arg::Validator {
                                vref: inline_or_named(val_inner),
                                bind: bind_kind(self.universe, value),
                            },
                        ],
                    ));
                }
                calls
            }
            _ => Vec::new(),
        }
    }
}

// A single delegate call collapses to its named validator; anything more
// complex becomes an inline closure.
fn inline_or_named(mut inner: Vec<FunctionGen>) -> ValidatorRef {
    if inner.len() == 1 && inner[0].callee == DELEGATE_CALLEE {
        let call = inner.remove(0);
        if let Some(Arg::Validator {
            vref: ValidatorRef::Named(name),
            ..
        }) = call.args.into_iter().next()
        {
            return ValidatorRef::Named(name);
        }
        unreachable!("delegate call always carries a named validator");
    }
    ValidatorRef::Inline(inner)
}
