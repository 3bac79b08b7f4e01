//! Bound tags: `+k8s:minimum`, `+k8s:maxLength`, `+k8s:maxItems`.

use crate::errors::{ErrorReporting, GenError};
use crate::schema::{Kind, TypeExpr};
use crate::tags::emission::{function, Arg, Flags, Validations};
use crate::tags::parse::TagMatch;
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagPayloadDoc, TagValidator};

const MINIMUM_TAG: &str = "k8s:minimum";
const MAX_LENGTH_TAG: &str = "k8s:maxLength";
const MAX_ITEMS_TAG: &str = "k8s:maxItems";

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(MinimumTag));
    registry.register_tag(Box::new(MaxLengthTag));
    registry.register_tag(Box::new(MaxItemsTag));
}

fn int_payload(ctx: &TagContext, tag: &TagMatch) -> Result<i64, GenError> {
    let reporter = ctx_reporter(ctx);
    tag.payload_as_i64().map_err(|reason| {
        reporter.payload_parse(
            &tag.name,
            tag.payload_str().unwrap_or(""),
            &reason,
            (tag.span.0..tag.span.1).into(),
        )
    })
}

struct MinimumTag;

impl TagValidator for MinimumTag {
    fn name(&self) -> &'static str {
        MINIMUM_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::Any]
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let min = int_payload(ctx, tag)?;

        let underlying = ctx.universe.underlying(ctx.ty.pointee());
        let TypeExpr::Int { width } = underlying else {
            return Err(reporter.tag_rejected(MINIMUM_TAG, "can only be used on integer types", span));
        };
        if min < 0 && !width.is_signed() {
            return Err(reporter.tag_rejected(
                MINIMUM_TAG,
                "negative minimum on an unsigned integer",
                span,
            ));
        }
        let mut result = Validations::new();
        result.add_function(function(
            MINIMUM_TAG,
            Flags::NONE,
            "limits::minimum",
            vec![Arg::Int(min)],
        ));
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: MINIMUM_TAG.to_string(),
            description: "Indicates that a numeric field has a minimum value.".to_string(),
            scopes: vec![Scope::Any],
            payloads: vec![TagPayloadDoc {
                description: "<integer>".to_string(),
                docs: "This field must be greater than or equal to X.".to_string(),
                schema: vec![],
            }],
        }
    }
}

struct MaxLengthTag;

impl TagValidator for MaxLengthTag {
    fn name(&self) -> &'static str {
        MAX_LENGTH_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::Any]
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();

        if ctx.universe.kind_of(ctx.ty.pointee()) != Kind::String {
            return Err(reporter.tag_rejected(MAX_LENGTH_TAG, "can only be used on string types", span));
        }
        let max = int_payload(ctx, tag)?;
        if max < 0 {
            return Err(reporter.tag_rejected(
                MAX_LENGTH_TAG,
                "must be greater than or equal to zero",
                span,
            ));
        }
        let mut result = Validations::new();
        result.add_function(function(
            MAX_LENGTH_TAG,
            Flags::NONE,
            "limits::max_length",
            vec![Arg::Int(max)],
        ));
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: MAX_LENGTH_TAG.to_string(),
            description: "Indicates that a string field has a limit on its length.".to_string(),
            scopes: vec![Scope::Any],
            payloads: vec![TagPayloadDoc {
                description: "<non-negative integer>".to_string(),
                docs: "This field must be no more than X characters long.".to_string(),
                schema: vec![],
            }],
        }
    }
}

struct MaxItemsTag;

const MAX_ITEMS_SCOPES: &[Scope] = &[Scope::TypeDef, Scope::Field, Scope::ListVal, Scope::MapVal];

impl TagValidator for MaxItemsTag {
    fn name(&self) -> &'static str {
        MAX_ITEMS_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        MAX_ITEMS_SCOPES
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();

        if ctx.universe.kind_of(ctx.ty.pointee()) != Kind::Slice {
            return Err(reporter.tag_rejected(MAX_ITEMS_TAG, "can only be used on list types", span));
        }
        let max = int_payload(ctx, tag)?;
        if max < 0 {
            return Err(reporter.tag_rejected(
                MAX_ITEMS_TAG,
                "must be greater than or equal to zero",
                span,
            ));
        }
        let mut result = Validations::new();
        result.add_function(function(
            MAX_ITEMS_TAG,
            Flags::SHORT_CIRCUIT,
            "limits::max_items",
            vec![Arg::Int(max)],
        ));
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: MAX_ITEMS_TAG.to_string(),
            description: "Indicates that a list field has a limit on its size.".to_string(),
            scopes: MAX_ITEMS_SCOPES.to_vec(),
            payloads: vec![TagPayloadDoc {
                description: "<non-negative integer>".to_string(),
                docs: "This field must be no more than X items long.".to_string(),
                schema: vec![],
            }],
        }
    }
}
