//! The validation tag model.
//!
//! A tag is an annotation in a documentation comment (`+k8s:minimum=1`)
//! that contributes validation emissions for the annotated schema entity.
//! Each tag implementation declares the scopes it may appear in, parses its
//! own payload, and returns emission records; the registry owns dispatch.

use std::fmt;

use crate::errors::GenError;
use crate::schema::{FieldDef, TypeDef, TypeExpr, Universe};
use crate::tags::emission::Validations;
use crate::tags::parse::TagMatch;
use crate::tags::registry::TagRegistry;

pub mod each;
pub mod emission;
pub mod enums;
pub mod format;
pub mod limits;
pub mod misc;
pub mod options;
pub mod parse;
pub mod presence;
pub mod registry;
pub mod union;

/// Where a validation (or potential validation) is located.
///
/// Display values read naturally in "cannot be specified on ..." messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Usable in any context. Never appears in a [`TagContext`].
    Any,
    /// A type definition; applies to all instances of that type.
    TypeDef,
    /// A particular struct field.
    Field,
    /// All elements of a list field or type.
    ListVal,
    /// All keys of a map field or type.
    MapKey,
    /// All values of a map field or type.
    MapVal,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Any => "anywhere",
            Self::TypeDef => "type definitions",
            Self::Field => "struct fields",
            Self::ListVal => "list values",
            Self::MapKey => "map keys",
            Self::MapVal => "map values",
        };
        write!(f, "{s}")
    }
}

/// Where a tag was used, so scope can be checked and handlers can see the
/// surrounding schema.
#[derive(Clone, Copy)]
pub struct TagContext<'a> {
    pub scope: Scope,
    /// The type at the scope point: the underlying type for type
    /// definitions, the declared field type for fields, the element type
    /// for list values and map keys/values.
    pub ty: &'a TypeExpr,
    /// The enclosing declaration: the definition itself for TypeDef scope,
    /// the enclosing struct for Field scope.
    pub parent_def: Option<&'a TypeDef>,
    /// The enclosing list or map expression for element scopes.
    pub parent_expr: Option<&'a TypeExpr>,
    /// The field, for Field scope.
    pub member: Option<&'a FieldDef>,
    /// The full comment block the tag came from, for tags that consult
    /// their siblings (list-map declarations).
    pub comments: &'a [String],
    pub universe: &'a Universe,
}

/// A single validation tag and how to use it.
pub trait TagValidator {
    /// The full tag name, without the leading `+`.
    fn name(&self) -> &'static str;

    /// The scopes this tag may be used in.
    fn valid_scopes(&self) -> &'static [Scope];

    /// Returns the validations described by one occurrence of this tag.
    fn get_validations(
        &self,
        registry: &TagRegistry,
        ctx: &TagContext,
        tag: &TagMatch,
    ) -> Result<Validations, GenError>;

    /// User-facing documentation for this tag.
    fn docs(&self) -> TagDoc;
}

/// A validator that fires on every type definition, regardless of comments.
pub trait TypeValidator {
    /// Unique name, used for sorting and logging.
    fn name(&self) -> &'static str;

    /// Returns the validations imposed on the given type definition.
    fn get_validations(
        &self,
        registry: &TagRegistry,
        def: &TypeDef,
        universe: &Universe,
    ) -> Result<Validations, GenError>;
}

/// Describes a comment tag and its usage.
#[derive(Debug, Clone, Default)]
pub struct TagDoc {
    /// The tag name, without the leading `+`.
    pub tag: String,
    /// Short description of the tag's purpose.
    pub description: String,
    /// The place or places this tag may be used.
    pub scopes: Vec<Scope>,
    /// Zero or more varieties of payload. Empty when the tag never takes
    /// one; include a `<none>` entry when the payload is optional.
    pub payloads: Vec<TagPayloadDoc>,
}

/// Describes one payload variety for a tag.
#[derive(Debug, Clone, Default)]
pub struct TagPayloadDoc {
    pub description: String,
    pub docs: String,
    pub schema: Vec<TagPayloadSchema>,
}

/// Describes one key of a JSON tag payload.
#[derive(Debug, Clone, Default)]
pub struct TagPayloadSchema {
    pub key: String,
    pub value: String,
    pub docs: String,
    pub default: String,
}

/// Builds an error-reporting context anchored at the comment block the tag
/// context came from. Shared by tag implementations.
pub(crate) fn ctx_reporter(ctx: &TagContext) -> crate::errors::GenContext {
    use crate::errors::{GenContext, SourceContext};
    let name = match (ctx.parent_def, ctx.member) {
        (Some(def), Some(member)) => format!("{}.{}", def.name, member.json_name),
        (Some(def), None) => def.name.to_string(),
        _ => "comments".to_string(),
    };
    GenContext::new(SourceContext::from_input(name, ctx.comments.join("\n")), "tags")
}
