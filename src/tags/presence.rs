//! Presence tags: `+k8s:required`, `+k8s:optional`, `+k8s:forbidden`.
//!
//! These are the only tags that care how the schema declared the annotated
//! value, so each dispatches on the underlying type kind to pick the right
//! runtime variant. Option variants carry the PTR_OK flag: they test the
//! option itself, not the pointee.

use crate::errors::{ErrorReporting, GenError};
use crate::schema::Kind;
use crate::tags::emission::{function, Flags, FunctionGen, Validations};
use crate::tags::parse::TagMatch;
use crate::tags::registry::TagRegistry;
use crate::tags::{Scope, TagContext, TagDoc, TagPayloadDoc, TagValidator};

const REQUIRED_TAG: &str = "k8s:required";
const OPTIONAL_TAG: &str = "k8s:optional";
const FORBIDDEN_TAG: &str = "k8s:forbidden";

const PRESENCE_SCOPES: &[Scope] = &[Scope::TypeDef, Scope::Field];

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(RequiredTag));
    registry.register_tag(Box::new(OptionalTag));
    registry.register_tag(Box::new(ForbiddenTag));
}

// Picks the presence callee variant for the context's type kind, with the
// flags the variant needs. Returns None for kinds where presence is
// documentation only.
fn presence_call(ctx: &TagContext, family: &str, flags: Flags) -> Option<FunctionGen> {
    let (suffix, extra_flags) = match ctx.universe.kind_of(ctx.ty) {
        Kind::Optional => ("option", Flags::PTR_OK),
        Kind::Slice => ("slice", Flags::NONE),
        Kind::Map => ("map", Flags::NONE),
        Kind::Struct => return None,
        Kind::String | Kind::Int | Kind::Bool => ("value", Flags::NONE),
    };
    Some(function(
        format!("k8s:{family}"),
        flags | extra_flags,
        format!("presence::{family}_{suffix}"),
        vec![],
    ))
}

struct RequiredTag;

impl TagValidator for RequiredTag {
    fn name(&self) -> &'static str {
        REQUIRED_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        PRESENCE_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        _tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let mut result = Validations::new();
        // On a non-pointer struct the tag is documentation; the struct's
        // own fields carry the real constraints.
        if let Some(call) = presence_call(ctx, "required", Flags::SHORT_CIRCUIT) {
            result.add_function(call);
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: REQUIRED_TAG.to_string(),
            description: "Indicates that a field is required to be specified.".to_string(),
            scopes: PRESENCE_SCOPES.to_vec(),
            payloads: vec![],
        }
    }
}

struct OptionalTag;

impl TagValidator for OptionalTag {
    fn name(&self) -> &'static str {
        OPTIONAL_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        PRESENCE_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        _tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let mut result = Validations::new();
        if let Some(call) = presence_call(ctx, "optional", Flags::SHORT_CIRCUIT | Flags::NON_ERROR)
        {
            result.add_function(call);
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: OPTIONAL_TAG.to_string(),
            description: "Indicates that a field is optional.".to_string(),
            scopes: PRESENCE_SCOPES.to_vec(),
            payloads: vec![],
        }
    }
}

struct ForbiddenTag;

impl TagValidator for ForbiddenTag {
    fn name(&self) -> &'static str {
        FORBIDDEN_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        PRESENCE_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        if ctx.universe.kind_of(ctx.ty) == Kind::Struct {
            let reporter = crate::tags::ctx_reporter(ctx);
            return Err(reporter.tag_rejected(
                FORBIDDEN_TAG,
                "non-pointer structs cannot be forbidden",
                (tag.span.0..tag.span.1).into(),
            ));
        }
        // Two checks with opposite polarity: if the value is present, the
        // forbidden check reports and stops; if it is absent, the optional
        // check stops silently so nothing downstream dereferences it.
        let mut result = Validations::new();
        if let Some(call) = presence_call(ctx, "forbidden", Flags::SHORT_CIRCUIT) {
            result.add_function(call);
        }
        if let Some(mut call) = presence_call(ctx, "optional", Flags::SHORT_CIRCUIT | Flags::NON_ERROR)
        {
            call.tag = FORBIDDEN_TAG.to_string();
            result.add_function(call);
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: FORBIDDEN_TAG.to_string(),
            description: "Indicates that a field is forbidden to be specified.".to_string(),
            scopes: PRESENCE_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<none>".to_string(),
                ..TagPayloadDoc::default()
            }],
        }
    }
}
