//! Assorted tags: `+k8s:immutable`, `+k8s:ratcheting`, `+k8s:subfield`,
//! and the generator-probe tags `+k8s:validateTrue`, `+k8s:validateFalse`,
//! `+k8s:validateError`.

use serde::Deserialize;

use crate::errors::{ErrorReporting, GenError, GenErrorKind};
use crate::schema::TypeExpr;
use crate::tags::emission::{function, Flags, Subfield, Validations};
use crate::tags::parse::{scan_comments, MixedPayload, TagMatch};
use crate::tags::registry::TagRegistry;
use crate::tags::{ctx_reporter, Scope, TagContext, TagDoc, TagPayloadDoc, TagPayloadSchema, TagValidator};

const IMMUTABLE_TAG: &str = "k8s:immutable";
const RATCHETING_TAG: &str = "k8s:ratcheting";
const SUBFIELD_TAG: &str = "k8s:subfield";
const VALIDATE_TRUE_TAG: &str = "k8s:validateTrue";
const VALIDATE_FALSE_TAG: &str = "k8s:validateFalse";
const VALIDATE_ERROR_TAG: &str = "k8s:validateError";

pub fn register(registry: &mut TagRegistry) {
    registry.register_tag(Box::new(ImmutableTag));
    registry.register_tag(Box::new(RatchetingTag));
    registry.register_tag(Box::new(SubfieldTag));
    registry.register_tag(Box::new(FixedResultTag { pass: true }));
    registry.register_tag(Box::new(FixedResultTag { pass: false }));
    registry.register_tag(Box::new(ValidateErrorTag));
}

/// True when the comment block opts the declaration out of ratcheting.
pub fn ratcheting_disabled(comments: &[String]) -> bool {
    let Ok(tags) = scan_comments(comments) else {
        return false;
    };
    tags.iter()
        .any(|t| t.name == RATCHETING_TAG && t.payload_str() == Some("disabled"))
}

struct ImmutableTag;

impl TagValidator for ImmutableTag {
    fn name(&self) -> &'static str {
        IMMUTABLE_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::Any]
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        _ctx: &TagContext,
        _tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let mut result = Validations::new();
        result.add_function(function(IMMUTABLE_TAG, Flags::NONE, "limits::immutable", vec![]));
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: IMMUTABLE_TAG.to_string(),
            description: "Indicates that a field may not change across updates.".to_string(),
            scopes: vec![Scope::Any],
            payloads: vec![],
        }
    }
}

struct RatchetingTag;

impl TagValidator for RatchetingTag {
    fn name(&self) -> &'static str {
        RATCHETING_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::TypeDef, Scope::Field]
    }

    fn get_validations(
        &self,
        _registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        if tag.payload_str() != Some("disabled") {
            return Err(reporter.payload_parse(
                RATCHETING_TAG,
                tag.payload_str().unwrap_or(""),
                "the only supported payload is \"disabled\"",
                span,
            ));
        }
        // Consumed by the traversal; no emissions of its own.
        Ok(Validations::new())
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: RATCHETING_TAG.to_string(),
            description: "Opts a declaration out of update-time ratcheting.".to_string(),
            scopes: vec![Scope::TypeDef, Scope::Field],
            payloads: vec![TagPayloadDoc {
                description: "disabled".to_string(),
                docs: "Unchanged values are re-validated on update.".to_string(),
                schema: vec![],
            }],
        }
    }
}

struct SubfieldTag;

impl TagValidator for SubfieldTag {
    fn name(&self) -> &'static str {
        SUBFIELD_TAG
    }

    fn valid_scopes(&self) -> &'static [Scope] {
        &[Scope::TypeDef, Scope::Field]
    }

    fn get_validations(
        &self,
        registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let reporter = ctx_reporter(ctx);
        let span = (tag.span.0..tag.span.1).into();
        let Some(subfield_name) = tag.args.first().filter(|a| !a.is_empty()) else {
            return Err(reporter.report(
                GenErrorKind::MissingArgument {
                    tag: SUBFIELD_TAG.to_string(),
                    expected: "a subfield name argument".to_string(),
                },
                span,
            ));
        };
        let payload = tag
            .require_payload()
            .map_err(|reason| reporter.payload_parse(SUBFIELD_TAG, "", &reason, span))?;

        let underlying = ctx.universe.underlying(ctx.ty.pointee());
        let sub_def = underlying
            .as_named()
            .and_then(|tn| ctx.universe.get(&tn))
            .filter(|d| d.is_struct());
        let Some(sub_def) = sub_def else {
            return Err(reporter.tag_rejected(SUBFIELD_TAG, "can only be used on struct types", span));
        };
        let Some(field) = sub_def.fields().iter().find(|f| &f.json_name == subfield_name)
        else {
            return Err(reporter.tag_rejected(
                SUBFIELD_TAG,
                &format!("{:?} is not a field of {}", subfield_name, sub_def.name),
                span,
            ));
        };

        let child = TagContext {
            scope: Scope::Field,
            ty: &field.ty,
            parent_def: Some(sub_def),
            parent_expr: None,
            member: Some(field),
            comments: ctx.comments,
            universe: ctx.universe,
        };
        let inner = registry.extract_embedded(&child, tag, payload)?;

        let hop = Subfield {
            json_name: field.json_name.clone(),
            rust_name: field.rust_name.clone(),
            optional: matches!(field.ty, TypeExpr::Optional { .. }),
            bind: crate::tags::each::bind_kind(ctx.universe, field.ty.pointee()),
        };
        let mut result = Validations::new();
        result.variables.extend(inner.variables);
        for mut f in inner.functions {
            f.subfield.insert(0, hop.clone());
            f.tag = SUBFIELD_TAG.to_string();
            result.add_function(f);
        }
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: SUBFIELD_TAG.to_string(),
            description: "Applies an embedded validation tag through a named subfield.".to_string(),
            scopes: vec![Scope::TypeDef, Scope::Field],
            payloads: vec![TagPayloadDoc {
                description: "<validation-tag>".to_string(),
                docs: "The embedded tag is evaluated against the named subfield.".to_string(),
                schema: vec![],
            }],
        }
    }
}

// Payload for the probe tags, in JSON-object form.
#[derive(Debug, Default, Deserialize)]
struct ProbePayload {
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    msg: String,
    #[serde(default, rename = "typeArg")]
    type_arg: Option<String>,
}

struct FixedResultTag {
    pass: bool,
}

impl FixedResultTag {
    fn tag_name(&self) -> &'static str {
        if self.pass {
            VALIDATE_TRUE_TAG
        } else {
            VALIDATE_FALSE_TAG
        }
    }
}

impl TagValidator for FixedResultTag {
    fn name(&self) -> &'static str {
        self.tag_name()
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
        let (msg, flag_names, type_arg) = match tag.mixed_payload::<ProbePayload>() {
            Ok(MixedPayload::None) => (String::new(), vec![], None),
            Ok(MixedPayload::Text(s)) => (s, vec![], None),
            Ok(MixedPayload::Object(p)) => {
                if p.msg.is_empty() {
                    return Err(reporter.payload_parse(
                        self.tag_name(),
                        tag.payload_str().unwrap_or(""),
                        "JSON msg is required",
                        span,
                    ));
                }
                (p.msg, p.flags, p.type_arg)
            }
            Err(reason) => {
                return Err(reporter.payload_parse(
                    self.tag_name(),
                    tag.payload_str().unwrap_or(""),
                    &reason,
                    span,
                ))
            }
        };

        let mut flags = Flags::NONE;
        for fl in &flag_names {
            match fl.as_str() {
                "IsFatal" => flags = flags | Flags::SHORT_CIRCUIT,
                "PtrOK" => flags = flags | Flags::PTR_OK,
                other => {
                    return Err(reporter.payload_parse(
                        self.tag_name(),
                        tag.payload_str().unwrap_or(""),
                        &format!("unknown flag: {other:?}"),
                        span,
                    ))
                }
            }
        }

        let mut call = function(
            self.tag_name(),
            flags,
            "limits::fixed_result",
            vec![
                crate::tags::emission::Arg::Bool(self.pass),
                crate::tags::emission::Arg::Str(msg),
            ],
        );
        if let Some(ta) = type_arg {
            call.type_args.push(ta);
        }
        let mut result = Validations::new();
        result.add_function(call);
        Ok(result)
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: self.tag_name().to_string(),
            description: if self.pass {
                "Always passes validation (useful for testing).".to_string()
            } else {
                "Always fails validation (useful for testing).".to_string()
            },
            scopes: vec![Scope::Any],
            payloads: vec![
                TagPayloadDoc {
                    description: "<none>".to_string(),
                    docs: "The generated call carries an empty message.".to_string(),
                    schema: vec![],
                },
                TagPayloadDoc {
                    description: "<quoted-string>".to_string(),
                    docs: "The generated call carries this message.".to_string(),
                    schema: vec![],
                },
                TagPayloadDoc {
                    description: "<json-object>".to_string(),
                    docs: String::new(),
                    schema: vec![
                        TagPayloadSchema {
                            key: "flags".to_string(),
                            value: "<list-of-string>".to_string(),
                            docs: "optional: \"IsFatal\" or \"PtrOK\"".to_string(),
                            default: String::new(),
                        },
                        TagPayloadSchema {
                            key: "msg".to_string(),
                            value: "<string>".to_string(),
                            docs: "the generated call carries this message".to_string(),
                            default: String::new(),
                        },
                    ],
                },
            ],
        }
    }
}

struct ValidateErrorTag;

impl TagValidator for ValidateErrorTag {
    fn name(&self) -> &'static str {
        VALIDATE_ERROR_TAG
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
        Err(reporter.tag_rejected(
            VALIDATE_ERROR_TAG,
            &format!("forced error: {:?}", tag.payload_str().unwrap_or("")),
            (tag.span.0..tag.span.1).into(),
        ))
    }

    fn docs(&self) -> TagDoc {
        TagDoc {
            tag: VALIDATE_ERROR_TAG.to_string(),
            description: "Always fails code generation (useful for testing).".to_string(),
            scopes: vec![Scope::Any],
            payloads: vec![TagPayloadDoc {
                description: "<string>".to_string(),
                docs: "This string is included in the error message.".to_string(),
                schema: vec![],
            }],
        }
    }
}
