//! Feature-toggle tags: `+k8s:ifOptionEnabled(Opt)=<tag>`,
//! `+k8s:ifOptionDisabled(Opt)=<tag>`.
//!
//! The embedded tag is extracted at the same scope and every resulting call
//! is wrapped in a runtime guard on the named option.

use crate::errors::{ErrorReporting, GenError};
use crate::tags::emission::{with_condition, Conditions, Validations};
use crate::tags::parse::TagMatch;
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagPayloadDoc, TagValidator};

const IF_OPTION_ENABLED_TAG: &str = "k8s:ifOptionEnabled";
const IF_OPTION_DISABLED_TAG: &str = "k8s:ifOptionDisabled";

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(IfOptionTag { enabled: true }));
    registry.register_tag(Box::new(IfOptionTag { enabled: false }));
}

struct IfOptionTag {
    enabled: bool,
}

impl IfOptionTag {
    fn tag_name(&self) -> &'static str {
        if self.enabled {
            IF_OPTION_ENABLED_TAG
        } else {
            IF_OPTION_DISABLED_TAG
        }
    }
}

impl TagValidator for IfOptionTag {
    fn name(&self) -> &'static str {
        self.tag_name()
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::Any]
    }

    fn get_validations(
        &self,
        registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let Some(option) = tag.args.first().filter(|o| !o.is_empty()) else {
            return Err(reporter.report(
                crate::errors::GenErrorKind::MissingArgument {
                    tag: self.tag_name().to_string(),
                    expected: "an option name argument".to_string(),
                },
                span,
            ));
        };
        let payload = tag
            .require_payload()
            .map_err(|reason| reporter.payload_parse(self.tag_name(), "", &reason, span))?;

        let inner = registry.extract_embedded(ctx, tag, payload)?;
        let cond = if self.enabled {
            Conditions {
                option_enabled: Some(option.clone()),
                option_disabled: None,
            }
        } else {
            Conditions {
                option_enabled: None,
                option_disabled: Some(option.clone()),
            }
        };

        let mut result = Validations::new();
        result.variables.extend(inner.variables);
        for f in inner.functions {
            result.add_function(with_condition(f, cond.clone()));
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        let (tag, docs) = if self.enabled {
            (
                IF_OPTION_ENABLED_TAG,
                "The embedded tag is evaluated only when the named option is enabled.",
            )
        } else {
            (
                IF_OPTION_DISABLED_TAG,
                "The embedded tag is evaluated only when the named option is disabled.",
            )
        };
        TagDoc {
            tag: tag.to_string(),
            description: "Declares a validation guarded by a runtime option.".to_string(),
            scopes: vec![Scope::Any],
            payloads: vec![TagPayloadDoc {
                description: "<validation-tag>".to_string(),
                docs: docs.to_string(),
                schema: vec![],
            }],
        }
    }
}
