//! The `+k8s:format=<name>` tag.
//!
//! Format names follow the JSON-schema style: lower-case, dashes between
//! words. Each name maps to a runtime predicate wrapper; the mapping is the
//! single place to extend when a new format lands.

use crate::errors::{ErrorReporting, GenError};
use crate::schema::Kind;
use crate::tags::emission::{function, Flags, FunctionGen, Validations};
use crate::tags::parse::TagMatch;
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagPayloadDoc, TagValidator};

const FORMAT_TAG: &str = "k8s:format";

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(FormatTag));
}

fn format_call(format: &str) -> Option<FunctionGen> {
    match format {
        "dns-label" => Some(function(FORMAT_TAG, Flags::NONE, "limits::dns_label", vec![])),
        "ip-sloppy" => Some(function(FORMAT_TAG, Flags::NONE, "limits::ip_sloppy", vec![])),
        _ => None,
    }
}

struct FormatTag;

impl TagValidator for FormatTag {
    fn name(&self) -> &'static str {
        FORMAT_TAG
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
            return Err(reporter.tag_rejected(FORMAT_TAG, "can only be used on string types", span));
        }
        let name = tag.require_payload().map_err(|reason| {
            reporter.payload_parse(FORMAT_TAG, "", &reason, span)
        })?;
        let Some(call) = format_call(name) else {
            return Err(reporter.tag_rejected(
                FORMAT_TAG,
                &format!("unsupported validation format {name:?}"),
                span,
            ));
        };
        let mut result = Validations::new();
        result.add_function(call);
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: FORMAT_TAG.to_string(),
            description: "Indicates that a string field has a particular format.".to_string(),
            scopes: vec![Scope::Any],
            payloads: vec![
                TagPayloadDoc {
                    description: "dns-label".to_string(),
                    docs: "This field holds a DNS label value.".to_string(),
                    schema: vec![],
                },
                TagPayloadDoc {
                    description: "ip-sloppy".to_string(),
                    docs: "This field holds an IPv4 or IPv6 address. IPv4 octets may have leading zeros."
                        .to_string(),
                    schema: vec![],
                },
            ],
        }
    }
}
