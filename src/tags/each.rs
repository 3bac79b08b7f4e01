//! Container tags: `+k8s:eachVal`, `+k8s:eachKey`, `+k8s:listType`,
//! `+k8s:listMapKey`.
//!
//! `eachVal`/`eachKey` carry an embedded tag that applies to every element,
//! key, or value of a container; the handler re-enters the registry at the
//! inner scope and wraps whatever comes back in an iteration primitive.
//! `listType`/`listMapKey` declare list semantics: `set` lists must hold
//! unique elements, `map` lists are keyed and get both key uniqueness and
//! keyed ratcheting correspondence.

use crate::errors::{ErrorReporting, GenError};
use crate::gen::names::rust_type;
use crate::schema::{Kind, TypeExpr, Universe};
use crate::tags::emission::{function, Arg, BindKind, EquivKind, Flags, Validations, ValidatorRef};
use crate::tags::parse::{scan_comments, TagMatch};
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagPayloadDoc, TagValidator};

const EACH_VAL_TAG: &str = "k8s:eachVal";
const EACH_KEY_TAG: &str = "k8s:eachKey";
const LIST_TYPE_TAG: &str = "k8s:listType";
const LIST_MAP_KEY_TAG: &str = "k8s:listMapKey";

const CONTAINER_SCOPES: &[Scope] = &[Scope::TypeDef, Scope::Field, Scope::ListVal, Scope::MapVal];

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(EachValTag));
    registry.register_tag(Box::new(EachKeyTag));
    registry.register_tag(Box::new(ListTypeTag));
    registry.register_tag(Box::new(ListMapKeyTag));
}

/// How a list is declared to behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Atomic,
    Set,
    Map,
}

/// The list semantics declared in a comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSemantics {
    pub list_type: Option<ListType>,
    pub map_keys: Vec<String>,
}

/// Scans a comment block for `listType`/`listMapKey` declarations. Parse
/// errors are ignored here; the registry reports them when the block is
/// extracted for real.
pub fn list_semantics(comments: &[String]) -> ListSemantics {
    let mut sem = ListSemantics::default();
    let Ok(tags) = scan_comments(comments) else {
        return sem;
    };
    for tag in tags {
        match tag.name.as_str() {
            n if n == LIST_TYPE_TAG => {
                sem.list_type = match tag.payload_str() {
                    Some("atomic") => Some(ListType::Atomic),
                    Some("set") => Some(ListType::Set),
                    Some("map") => Some(ListType::Map),
                    _ => sem.list_type,
                }
            }
            n if n == LIST_MAP_KEY_TAG => {
                if let Some(key) = tag.payload_str() {
                    sem.map_keys.push(key.to_string());
                }
            }
            _ => {}
        }
    }
    sem
}

/// Picks the ratcheting equivalence for a container element type: direct
/// comparison for scalars, structural equality for anything composite.
pub fn equiv_kind_for(universe: &Universe, elem: &TypeExpr) -> EquivKind {
    match universe.kind_of(elem) {
        Kind::String | Kind::Int | Kind::Bool => EquivKind::Direct,
        _ => EquivKind::Deep,
    }
}

/// How an element value is bound inside an inline validator closure.
pub fn bind_kind(universe: &Universe, elem: &TypeExpr) -> BindKind {
    match universe.kind_of(elem) {
        Kind::Slice => BindKind::Slice,
        _ => BindKind::Direct,
    }
}

/// Resolves list-map key json names to the element struct's Rust field
/// names.
pub fn map_key_rust_fields(
    universe: &Universe,
    elem: &TypeExpr,
    keys: &[String],
) -> Result<Vec<String>, String> {
    let def = elem
        .as_named()
        .and_then(|tn| universe.get(&tn))
        .filter(|d| d.is_struct())
        .ok_or_else(|| "list-map elements must be declared structs".to_string())?;
    keys.iter()
        .map(|key| {
            def.fields()
                .iter()
                .find(|f| &f.json_name == key)
                .map(|f| f.rust_name.clone())
                .ok_or_else(|| format!("list-map key {key:?} is not a field of {}", def.name))
        })
        .collect()
}

fn child_context<'a>(
    ctx: &TagContext<'a>,
    scope: Scope,
    ty: &'a TypeExpr,
    parent_expr: &'a TypeExpr,
) -> TagContext<'a> {
    TagContext {
        scope,
        ty,
        parent_def: ctx.parent_def,
        parent_expr: Some(parent_expr),
        member: ctx.member,
        comments: ctx.comments,
        universe: ctx.universe,
    }
}

struct EachValTag;

impl TagValidator for EachValTag {
    fn name(&self) -> &'static str {
        EACH_VAL_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        CONTAINER_SCOPES
    }

    fn get_validations(
        &self,
        registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let payload = tag.require_payload().map_err(|reason| {
            reporter.payload_parse(EACH_VAL_TAG, "", &reason, span)
        })?;

        let underlying = ctx.universe.underlying(ctx.ty.pointee());
        let mut result = Validations::new();
        match underlying {
            TypeExpr::Slice { elem } => {
                let child = child_context(ctx, Scope::ListVal, elem, underlying);
                let inner = registry.extract_embedded(&child, tag, payload)?;
                result.variables.extend(inner.variables);
                if inner.functions.is_empty() {
                    return Ok(result);
                }
                let bind = bind_kind(ctx.universe, elem);
                let sem = list_semantics(ctx.comments);
                let correspond = if sem.list_type == Some(ListType::Map) && !sem.map_keys.is_empty()
                {
                    let rust_fields = map_key_rust_fields(ctx.universe, elem, &sem.map_keys)
                        .map_err(|reason| reporter.tag_rejected(EACH_VAL_TAG, &reason, span))?;
                    Arg::KeyMatch {
                        rust_fields,
                        wrapped: true,
                    }
                } else {
                    Arg::NoneLit
                };
                let equiv = if crate::tags::misc::ratcheting_disabled(ctx.comments) {
                    EquivKind::None
                } else {
                    equiv_kind_for(ctx.universe, elem)
                };
                result.add_function(function(
                    EACH_VAL_TAG,
                    Flags::NONE,
                    "each::each_slice_val",
                    vec![
                        correspond,
                        Arg::Equiv {
                            kind: equiv,
                            elem_ty: rust_type(elem),
                        },
                        Arg::Validator {
                            vref: ValidatorRef::Inline(inner.functions),
                            bind,
                        },
                    ],
                ));
            }
            TypeExpr::Map { value, .. } => {
                let child = child_context(ctx, Scope::MapVal, value, underlying);
                let inner = registry.extract_embedded(&child, tag, payload)?;
                result.variables.extend(inner.variables);
                if inner.functions.is_empty() {
                    return Ok(result);
                }
                let bind = bind_kind(ctx.universe, value);
                let equiv = if crate::tags::misc::ratcheting_disabled(ctx.comments) {
                    EquivKind::None
                } else {
                    equiv_kind_for(ctx.universe, value)
                };
                result.add_function(function(
                    EACH_VAL_TAG,
                    Flags::NONE,
                    "each::each_map_val",
                    vec![
                        Arg::Equiv {
                            kind: equiv,
                            elem_ty: rust_type(value),
                        },
                        Arg::Validator {
                            vref: ValidatorRef::Inline(inner.functions),
                            bind,
                        },
                    ],
                ));
            }
            _ => {
                return Err(reporter.tag_rejected(
                    EACH_VAL_TAG,
                    "can only be used on list and map types",
                    span,
                ));
            }
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: EACH_VAL_TAG.to_string(),
            description: "Applies an embedded validation tag to each value of a list or map."
                .to_string(),
            scopes: CONTAINER_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<validation-tag>".to_string(),
                docs: "The embedded tag is evaluated at list-value or map-value scope.".to_string(),
                schema: vec![],
            }],
        }
    }
}

struct EachKeyTag;

impl TagValidator for EachKeyTag {
    fn name(&self) -> &'static str {
        EACH_KEY_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        CONTAINER_SCOPES
    }

    fn get_validations(
        &self,
        registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let payload = tag.require_payload().map_err(|reason| {
            reporter.payload_parse(EACH_KEY_TAG, "", &reason, span)
        })?;

        let underlying = ctx.universe.underlying(ctx.ty.pointee());
        let TypeExpr::Map { key, .. } = underlying else {
            return Err(reporter.tag_rejected(EACH_KEY_TAG, "can only be used on map types", span));
        };
        let child = child_context(ctx, Scope::MapKey, key, underlying);
        let inner = registry.extract_embedded(&child, tag, payload)?;
        let mut result = Validations::new();
        result.variables.extend(inner.variables);
        if !inner.functions.is_empty() {
            result.add_function(function(
                EACH_KEY_TAG,
                Flags::NONE,
                "each::each_map_key",
                vec![Arg::Validator {
                    vref: ValidatorRef::Inline(inner.functions),
                    bind: BindKind::Direct,
                }],
            ));
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: EACH_KEY_TAG.to_string(),
            description: "Applies an embedded validation tag to each key of a map.".to_string(),
            scopes: CONTAINER_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<validation-tag>".to_string(),
                docs: "The embedded tag is evaluated at map-key scope.".to_string(),
                schema: vec![],
            }],
        }
    }
}

struct ListTypeTag;

const LIST_DECL_SCOPES: &[Scope] = &[Scope::TypeDef, Scope::Field];

impl TagValidator for ListTypeTag {
    fn name(&self) -> &'static str {
        LIST_TYPE_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        LIST_DECL_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();

        let underlying = ctx.universe.underlying(ctx.ty.pointee());
        let TypeExpr::Slice { elem } = underlying else {
            return Err(reporter.tag_rejected(LIST_TYPE_TAG, "can only be used on list types", span));
        };
        let payload = tag.require_payload().map_err(|reason| {
            reporter.payload_parse(LIST_TYPE_TAG, "", &reason, span)
        })?;

        let mut result = Validations::new();
        match payload {
            "atomic" => {}
            "set" => {
                // Set semantics: no two elements may be equal.
                let callee = match ctx.universe.kind_of(elem) {
                    Kind::String | Kind::Int | Kind::Bool => "each::unique_by_compare",
                    _ => "each::unique_by_reflect",
                };
                result.add_function(function(LIST_TYPE_TAG, Flags::NONE, callee, vec![]));
            }
            "map" => {
                let sem = list_semantics(ctx.comments);
                if sem.map_keys.is_empty() {
                    return Err(reporter.tag_rejected(
                        LIST_TYPE_TAG,
                        "listType=map requires at least one listMapKey",
                        span,
                    ));
                }
                let rust_fields = map_key_rust_fields(ctx.universe, elem, &sem.map_keys)
                    .map_err(|reason| reporter.tag_rejected(LIST_TYPE_TAG, &reason, span))?;
                // Keyed lists may not repeat a key.
                result.add_function(function(
                    LIST_TYPE_TAG,
                    Flags::NONE,
                    "each::unique_by_match",
                    vec![Arg::KeyMatch {
                        rust_fields,
                        wrapped: false,
                    }],
                ));
            }
            other => {
                return Err(reporter.tag_rejected(
                    LIST_TYPE_TAG,
                    &format!("unknown list type {other:?}"),
                    span,
                ));
            }
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: LIST_TYPE_TAG.to_string(),
            description: "Declares how a list behaves: atomic, set, or keyed map.".to_string(),
            scopes: LIST_DECL_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "atomic|set|map".to_string(),
                docs: "set lists reject duplicate elements; map lists reject duplicate keys and \
                       ratchet by key."
                    .to_string(),
                schema: vec![],
            }],
        }
    }
}

struct ListMapKeyTag;

impl TagValidator for ListMapKeyTag {
    fn name(&self) -> &'static str {
        LIST_MAP_KEY_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        LIST_DECL_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();

        let underlying = ctx.universe.underlying(ctx.ty.pointee());
        let TypeExpr::Slice { elem } = underlying else {
            return Err(reporter.tag_rejected(LIST_MAP_KEY_TAG, "can only be used on list types", span));
        };
        let sem = list_semantics(ctx.comments);
        if sem.list_type != Some(ListType::Map) {
            return Err(reporter.tag_rejected(
                LIST_MAP_KEY_TAG,
                "requires listType=map on the same declaration",
                span,
            ));
        }
        let key = tag.require_payload().map_err(|reason| {
            reporter.payload_parse(LIST_MAP_KEY_TAG, "", &reason, span)
        })?;
        map_key_rust_fields(ctx.universe, elem, &[key.to_string()])
            .map_err(|reason| reporter.tag_rejected(LIST_MAP_KEY_TAG, &reason, span))?;
        // The declaration is consumed by listType=map and by ratcheting
        // correspondence; it emits nothing itself.
        Ok(Validations::new())
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: LIST_MAP_KEY_TAG.to_string(),
            description: "Names a key field of a keyed list.".to_string(),
            scopes: LIST_DECL_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<field-name>".to_string(),
                docs: "May be repeated for multi-field keys.".to_string(),
                schema: vec![],
            }],
        }
    }
}
