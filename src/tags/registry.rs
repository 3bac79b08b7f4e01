//! The tag registry: registration, lookup, scope checking, dispatch.
//!
//! A registry is built by an explicit [`build_default_registry`] call (no
//! load-time side effects), so tests can construct isolated registries with
//! exactly the tags they need. Construction is one-phase: register
//! everything, call [`TagRegistry::init`] once, then the registry is
//! read-only. Misuse of that lifecycle is a programming error and panics;
//! everything downstream returns [`GenError`] values.

use std::collections::BTreeMap;

use crate::errors::{ErrorReporting, GenContext, GenError, GenErrorKind, SourceContext};
use crate::tags::emission::Validations;
use crate::tags::parse::{scan_comments, TagMatch};
use crate::tags::{Scope, TagContext, TagDoc, TagValidator, TypeValidator};

/// Holds the registered tag and type validators.
pub struct TagRegistry {
    initialized: bool,
    tags: BTreeMap<String, Box<dyn TagValidator>>,
    type_validators: Vec<Box<dyn TypeValidator>>,
    index: Vec<String>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            initialized: false,
            tags: BTreeMap::new(),
            type_validators: Vec::new(),
            index: Vec::new(),
        }
    }

    /// Registers a tag. Panics if the registry was already initialized or a
    /// tag with the same name exists.
    pub fn register_tag(&mut self, tag: Box<dyn TagValidator>) {
        if self.initialized {
            panic!("TagRegistry was modified after init");
        }
        let name = tag.name().to_string();
        if self.tags.contains_key(&name) {
            panic!("tag {name:?} was registered twice");
        }
        self.tags.insert(name, tag);
    }

    /// Registers a type validator. Panics if the registry was already
    /// initialized.
    pub fn register_type(&mut self, tv: Box<dyn TypeValidator>) {
        if self.initialized {
            panic!("TagRegistry was modified after init");
        }
        self.type_validators.push(tv);
    }

    /// Freezes the registry. Panics when called twice.
    pub fn init(&mut self) {
        if self.initialized {
            panic!("TagRegistry::init() was called twice");
        }
        self.type_validators.sort_by_key(|tv| tv.name());
        self.index = self.tags.keys().cloned().collect();
        self.index.sort();
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Considers the given context (e.g. a type definition) and evaluates
    /// registered validators: type validators when the scope is a type
    /// definition, and tag validators for every known tag found in the
    /// comment block.
    ///
    /// For structs, callers must extract field validations before the
    /// type-definition extraction, because some tags accumulate per-struct
    /// state that the corresponding type validator consumes.
    pub fn extract_validations(
        &self,
        ctx: &TagContext,
        comments: &[String],
    ) -> Result<Validations, GenError> {
        if !self.initialized {
            panic!("TagRegistry::init() was not called");
        }

        let reporter = self.reporter_for(ctx, comments);
        let mut validations = Validations::new();

        if ctx.scope == Scope::TypeDef {
            let Some(def) = ctx.parent_def else {
                return Err(reporter.internal_error(
                    "type-definition scope without a definition",
                    crate::errors::unspanned(),
                ));
            };
            for tv in &self.type_validators {
                validations.add(tv.get_validations(self, def, ctx.universe)?);
            }
        }

        let matches = scan_comments(comments).map_err(|m| {
            reporter.report(
                GenErrorKind::MalformedTag {
                    line: m.line,
                    reason: m.reason,
                },
                (m.span.0..m.span.1).into(),
            )
        })?;

        for tag in matches {
            validations.add(self.dispatch(ctx, &reporter, &tag)?);
        }
        Ok(validations)
    }

    /// Extracts validations for an embedded tag payload (the right-hand
    /// side of `eachVal=`, `subfield(...)=`, `ifOptionEnabled(...)=`).
    /// The payload must contain exactly one tag.
    pub fn extract_embedded(
        &self,
        ctx: &TagContext,
        outer: &TagMatch,
        payload: &str,
    ) -> Result<Validations, GenError> {
        let line = vec![payload.to_string()];
        let reporter = self.reporter_for(ctx, &line);
        let matches = scan_comments(&line).map_err(|m| {
            reporter.report(
                GenErrorKind::MalformedTag {
                    line: m.line,
                    reason: m.reason,
                },
                (m.span.0..m.span.1).into(),
            )
        })?;
        if matches.len() != 1 {
            return Err(reporter.report(
                GenErrorKind::MissingArgument {
                    tag: outer.name.clone(),
                    expected: "an embedded validation tag".to_string(),
                },
                (outer.span.0..outer.span.1).into(),
            ));
        }
        self.dispatch(ctx, &reporter, &matches[0])
    }

    fn dispatch(
        &self,
        ctx: &TagContext,
        reporter: &GenContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError> {
        let span = (tag.span.0..tag.span.1).into();
        let Some(handler) = self.tags.get(&tag.name) else {
            if tag.name.starts_with("k8s:") {
                return Err(reporter.unknown_tag(&tag.name, span));
            }
            // Foreign marker comment; not ours to police.
            return Ok(Validations::new());
        };
        let scopes = handler.valid_scopes();
        if !scopes.contains(&ctx.scope) && !scopes.contains(&Scope::Any) {
            return Err(reporter.scope_violation(&tag.name, &ctx.scope.to_string(), span));
        }
        handler.get_validations(self, ctx, tag)
    }

    /// Documentation for every registered tag, sorted by tag name.
    pub fn docs(&self) -> Vec<TagDoc> {
        let mut docs: Vec<TagDoc> = self.tags.values().map(|t| t.docs()).collect();
        docs.sort_by(|a, b| a.tag.cmp(&b.tag));
        docs
    }

    fn reporter_for(&self, ctx: &TagContext, comments: &[String]) -> GenContext {
        let name = match (ctx.parent_def, ctx.member) {
            (Some(def), Some(member)) => format!("{}.{}", def.name, member.json_name),
            (Some(def), None) => def.name.to_string(),
            _ => "comments".to_string(),
        };
        GenContext::new(
            SourceContext::from_input(name, comments.join("\n")),
            "tags",
        )
    }
}

/// Builds the registry with the standard tag set registered and the
/// registry initialized.
pub fn build_default_registry() -> TagRegistry {
    let mut registry = TagRegistry::new();

    crate::tags::presence::register(&mut registry);
    crate::tags::limits::register(&mut registry);
    crate::tags::format::register(&mut registry);
    crate::tags::enums::register(&mut registry);
    crate::tags::each::register(&mut registry);
    crate::tags::union::register(&mut registry);
    crate::tags::options::register(&mut registry);
    crate::tags::misc::register(&mut registry);

    registry.init();
    registry
}
