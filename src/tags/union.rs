//! Union tags: `+k8s:unionMember`, `+k8s:unionDiscriminator`.
//!
//! Unions are comprised of multiple tags which share information: the tags
//! sit on struct fields, but the validation pertains to the struct itself.
//! The field tags emit nothing; they accumulate into per-struct state that
//! the union type validator turns into a membership table variable plus one
//! validator call per union. Generation is single-threaded, so the shared
//! state is a plain `Rc<RefCell<..>>` wired up at registry build time; a
//! registry is built fresh for each generation run.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::Deserialize;

use crate::errors::{ErrorReporting, GenError};
use crate::gen::names::union_static_name;
use crate::schema::{TypeDef, TypeName, Universe};
use crate::tags::emission::{
    function, Arg, Flags, MemberSpec, Validations, VariableGen,
};
use crate::tags::parse::{MixedPayload, TagMatch};
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagPayloadDoc, TagPayloadSchema, TagValidator, TypeValidator};

const UNION_MEMBER_TAG: &str = "k8s:unionMember";
const UNION_DISCRIMINATOR_TAG: &str = "k8s:unionDiscriminator";

const UNION_TAG_SCOPES: &[Scope] = &[Scope::Field];

pub fn register(registry: &mut TagRegistry) {
    let shared: SharedUnions = Rc::new(RefCell::new(HashMap::new()));
    registry.register_type(Box::new(UnionTypeValidator {
        shared: shared.clone(),
    }));
    registry.register_tag(Box::new(UnionMemberTag {
        shared: shared.clone(),
    }));
    registry.register_tag(Box::new(UnionDiscriminatorTag { shared }));
}

type SharedUnions = Rc<RefCell<HashMap<TypeName, Unions>>>;

/// All the unions declared within one struct, keyed by union name; the
/// unnamed union is the empty key.
type Unions = BTreeMap<String, UnionAccum>;

#[derive(Debug, Clone, Default)]
struct UnionAccum {
    /// `(json_name, member_name)` pairs, in field declaration order.
    fields: Vec<(String, String)>,
    /// Extractor specs, index-aligned with `fields`.
    members: Vec<MemberSpec>,
    /// Discriminator field, when declared.
    discriminator: Option<Discriminator>,
}

#[derive(Debug, Clone)]
struct Discriminator {
    json_name: String,
    rust_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct MemberParams {
    #[serde(default)]
    union: String,
    #[serde(default, rename = "memberName")]
    member_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscriminatorParams {
    #[serde(default)]
    union: String,
}

// The discriminator value a member matches defaults to the field's wire
// name with its first letter upper-cased.
fn default_member_name(json_name: &str) -> String {
    let mut chars = json_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

struct UnionMemberTag {
    shared: SharedUnions,
}

impl TagValidator for UnionMemberTag {
    fn name(&self) -> &'static str {
        UNION_MEMBER_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        UNION_TAG_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let (Some(parent), Some(member)) = (ctx.parent_def, ctx.member) else {
            return Err(reporter.tag_rejected(UNION_MEMBER_TAG, "must be used on a struct field", span));
        };
        if member.json_name.is_empty() {
            return Err(reporter.tag_rejected(
                UNION_MEMBER_TAG,
                "union members must have a wire name",
                span,
            ));
        }
        let params = match tag.mixed_payload::<MemberParams>() {
            Ok(MixedPayload::Object(p)) => p,
            Ok(MixedPayload::None) => MemberParams::default(),
            Ok(MixedPayload::Text(_)) => {
                return Err(reporter.payload_parse(
                    UNION_MEMBER_TAG,
                    tag.payload_str().unwrap_or(""),
                    "expected a JSON object",
                    span,
                ))
            }
            Err(reason) => {
                return Err(reporter.payload_parse(
                    UNION_MEMBER_TAG,
                    tag.payload_str().unwrap_or(""),
                    &reason,
                    span,
                ))
            }
        };
        let member_name = params
            .member_name
            .unwrap_or_else(|| default_member_name(&member.json_name));

        let mut shared = self.shared.borrow_mut();
        let unions = shared.entry(parent.name.clone()).or_default();
        let accum = unions.entry(params.union).or_default();
        accum.fields.push((member.json_name.clone(), member_name));
        accum.members.push(MemberSpec {
            rust_name: member.rust_name.clone(),
            optional: member.ty.is_optional(),
        });

        // Accumulation only; the union type validator emits for the struct.
        Ok(Validations::new())
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: UNION_MEMBER_TAG.to_string(),
            description: "Indicates that this field is a member of a union.".to_string(),
            scopes: UNION_TAG_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<json-object>".to_string(),
                docs: String::new(),
                schema: vec![
                    TagPayloadSchema {
                        key: "union".to_string(),
                        value: "<string>".to_string(),
                        docs: "the name of the union, if more than one exists".to_string(),
                        default: String::new(),
                    },
                    TagPayloadSchema {
                        key: "memberName".to_string(),
                        value: "<string>".to_string(),
                        docs: "the discriminator value for this member".to_string(),
                        default: "the field's wire name, capitalized".to_string(),
                    },
                ],
            }],
        }
    }
}

struct UnionDiscriminatorTag {
    shared: SharedUnions,
}

impl TagValidator for UnionDiscriminatorTag {
    fn name(&self) -> &'static str {
        UNION_DISCRIMINATOR_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        UNION_TAG_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let (Some(parent), Some(member)) = (ctx.parent_def, ctx.member) else {
            return Err(reporter.tag_rejected(
                UNION_DISCRIMINATOR_TAG,
                "must be used on a struct field",
                span,
            ));
        };
        let params = match tag.mixed_payload::<DiscriminatorParams>() {
            Ok(MixedPayload::Object(p)) => p,
            Ok(MixedPayload::None) => DiscriminatorParams::default(),
            Ok(MixedPayload::Text(_)) => {
                return Err(reporter.payload_parse(
                    UNION_DISCRIMINATOR_TAG,
                    tag.payload_str().unwrap_or(""),
                    "expected a JSON object",
                    span,
                ))
            }
            Err(reason) => {
                return Err(reporter.payload_parse(
                    UNION_DISCRIMINATOR_TAG,
                    tag.payload_str().unwrap_or(""),
                    &reason,
                    span,
                ))
            }
        };

        let mut shared = self.shared.borrow_mut();
        let unions = shared.entry(parent.name.clone()).or_default();
        let accum = unions.entry(params.union).or_default();
        if accum.discriminator.is_some() {
            return Err(reporter.tag_rejected(
                UNION_DISCRIMINATOR_TAG,
                "a union may declare only one discriminator",
                span,
            ));
        }
        accum.discriminator = Some(Discriminator {
            json_name: member.json_name.clone(),
            rust_name: member.rust_name.clone(),
        });
        Ok(Validations::new())
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: UNION_DISCRIMINATOR_TAG.to_string(),
            description: "Indicates that this field is the discriminator for a union.".to_string(),
            scopes: UNION_TAG_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<json-object>".to_string(),
                docs: String::new(),
                schema: vec![TagPayloadSchema {
                    key: "union".to_string(),
                    value: "<string>".to_string(),
                    docs: "the name of the union, if more than one exists".to_string(),
                    default: String::new(),
                }],
            }],
        }
    }
}

struct UnionTypeValidator {
    shared: SharedUnions,
}

impl TypeValidator for UnionTypeValidator {
    fn name(&self) -> &'static str {
        "unionTypeValidator"
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        def: &TypeDef,
        _universe: &Universe,
    ) -> Result<Validations, GenError> {
        let mut result = Validations::new();
        if !def.is_struct() {
            return Ok(result);
        }
        let shared = self.shared.borrow();
        let Some(unions) = shared.get(&def.name) else {
            return Ok(result);
        };
        // BTreeMap iteration gives stable output across union names.
        for (union_name, accum) in unions.iter() {
            if accum.fields.is_empty() && accum.discriminator.is_none() {
                continue;
            }
            let var_ident = union_static_name(&def.name.name, union_name);
            if let Some(disc) = &accum.discriminator {
                result.add_variable(VariableGen {
                    ident: var_ident.clone(),
                    init: function(
                        UNION_MEMBER_TAG,
                        Flags::NONE,
                        "union::UnionMembership::discriminated",
                        vec![
                            Arg::Str(disc.json_name.clone()),
                            Arg::PairList(accum.fields.clone()),
                        ],
                    ),
                });
                result.add_function(function(
                    UNION_MEMBER_TAG,
                    Flags::NONE,
                    "union::discriminated_union",
                    vec![
                        Arg::Ident(var_ident),
                        Arg::DiscriminatorFn {
                            rust_field: disc.rust_name.clone(),
                        },
                        Arg::ExtractorList(accum.members.clone()),
                    ],
                ));
            } else {
                result.add_variable(VariableGen {
                    ident: var_ident.clone(),
                    init: function(
                        UNION_MEMBER_TAG,
                        Flags::NONE,
                        "union::UnionMembership::new",
                        vec![Arg::PairList(accum.fields.clone())],
                    ),
                });
                result.add_function(function(
                    UNION_MEMBER_TAG,
                    Flags::NONE,
                    "union::union",
                    vec![
                        Arg::Ident(var_ident),
                        Arg::ExtractorList(accum.members.clone()),
                    ],
                ));
            }
        }
        Ok(result)
    }
}
