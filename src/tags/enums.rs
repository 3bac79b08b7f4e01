//! The `+k8s:enum` tag.
//!
//! Declared on a string-alias type definition; the allowed symbols are the
//! constants the schema declares for that type.

use crate::errors::{ErrorReporting, GenError};
use crate::schema::Kind;
use crate::tags::emission::{function, Arg, Flags, Validations};
use crate::tags::parse::TagMatch;
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagValidator};

const ENUM_TAG: &str = "k8s:enum";

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(EnumTag));
}

struct EnumTag;

impl TagValidator for EnumTag {
    fn name(&self) -> &'static str {
        ENUM_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::TypeDef]
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();

        if ctx.universe.kind_of(ctx.ty) != Kind::String {
            return Err(reporter.tag_rejected(ENUM_TAG, "can only be used on string types", span));
        }
        let symbols = ctx
            .parent_def
            .map(|def| def.symbols.clone())
            .unwrap_or_default();
        if symbols.is_empty() {
            return Err(reporter.tag_rejected(ENUM_TAG, "enum type declares no symbols", span));
        }
        let mut result = Validations::new();
        result.add_function(function(
            ENUM_TAG,
            Flags::NONE,
            "limits::enum_value",
            vec![Arg::StrList(symbols)],
        ));
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: ENUM_TAG.to_string(),
            description: "Indicates that a string type is restricted to its declared symbols."
                .to_string(),
            scopes: vec![Scope::TypeDef],
            payloads: vec![],
        }
    }
}
