//! The schema type universe.
//!
//! The generator does not parse Rust source. It consumes schema declaration
//! files describing a graph of named types: structs with fields, aliases
//! over structural type expressions, and enum symbol sets. Documentation
//! comments ride along on types and fields; the tag registry extracts
//! validation tags from them.
//!
//! `Optional` is how the schema renders nilable values: an optional scalar
//! is an option, an optional list is an option of a list, and so on.
//! Validators receive the flattened pointee unless they opt into seeing the
//! option itself.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod loader;

/// Unique identity of a declared type: package path plus local name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeName {
    pub package: String,
    pub name: String,
}

impl TypeName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// Integer widths a schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    /// The Rust type the emitter renders for this width.
    pub fn rust_name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }
}

/// A structural type expression: what a field or alias is made of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeExpr {
    String,
    Bool,
    Int { width: IntKind },
    Named { package: String, name: String },
    Optional { elem: Box<TypeExpr> },
    Slice { elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
}

impl TypeExpr {
    pub fn named(tn: &TypeName) -> Self {
        Self::Named {
            package: tn.package.clone(),
            name: tn.name.clone(),
        }
    }

    pub fn as_named(&self) -> Option<TypeName> {
        match self {
            Self::Named { package, name } => Some(TypeName::new(package.clone(), name.clone())),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// Strips one level of optionality, if present.
    pub fn pointee(&self) -> &TypeExpr {
        match self {
            Self::Optional { elem } => elem,
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
            Self::Int { width } => write!(f, "{}", width.rust_name()),
            Self::Named { package, name } => write!(f, "{}", TypeName::new(package.clone(), name.clone())),
            Self::Optional { elem } => write!(f, "?{elem}"),
            Self::Slice { elem } => write!(f, "[]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
        }
    }
}

/// The coarse classification tags dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Bool,
    Int,
    Struct,
    Slice,
    Map,
    Optional,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Struct => "struct",
            Self::Slice => "list",
            Self::Map => "map",
            Self::Optional => "optional",
        };
        write!(f, "{s}")
    }
}

/// One struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// The field's name in generated Rust code.
    pub rust_name: String,
    /// The wire name used in field paths and union membership.
    pub json_name: String,
    #[serde(default)]
    pub doc: Vec<String>,
    pub ty: TypeExpr,
}

/// What a type definition is: an alias over a structural expression, or a
/// struct with fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeBody {
    Alias { of: TypeExpr },
    Struct { fields: Vec<FieldDef> },
}

/// A named type declaration, with its documentation comments and (for
/// string aliases) the enum symbols declared for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(flatten)]
    pub name: TypeName,
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
    pub body: TypeBody,
}

impl TypeDef {
    pub fn fields(&self) -> &[FieldDef] {
        match &self.body {
            TypeBody::Struct { fields } => fields,
            TypeBody::Alias { .. } => &[],
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.body, TypeBody::Struct { .. })
    }
}

/// All declared types, resolvable by name. Ordered so that iteration over
/// declarations is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    types: BTreeMap<TypeName, TypeDef>,
    roots: Vec<TypeName>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration. Returns the rejected declaration's name when one
    /// with the same name already exists.
    pub fn insert(&mut self, def: TypeDef) -> Result<(), TypeName> {
        if self.types.contains_key(&def.name) {
            return Err(def.name);
        }
        self.types.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn add_root(&mut self, name: TypeName) {
        if !self.roots.contains(&name) {
            self.roots.push(name);
        }
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn roots(&self) -> &[TypeName] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Resolves a type expression down to its structural shape, following
    /// named aliases. Struct-bodied names resolve to themselves. Alias
    /// cycles terminate at the revisited name rather than looping.
    pub fn underlying<'a>(&'a self, expr: &'a TypeExpr) -> &'a TypeExpr {
        let mut seen: Vec<TypeName> = Vec::new();
        let mut cur = expr;
        while let Some(tn) = cur.as_named() {
            if seen.contains(&tn) {
                return cur;
            }
            match self.get(&tn).map(|d| &d.body) {
                Some(TypeBody::Alias { of }) => {
                    seen.push(tn);
                    cur = of;
                }
                _ => return cur,
            }
        }
        cur
    }

    /// Classifies an expression after alias resolution.
    pub fn kind_of(&self, expr: &TypeExpr) -> Kind {
        match self.underlying(expr) {
            TypeExpr::String => Kind::String,
            TypeExpr::Bool => Kind::Bool,
            TypeExpr::Int { .. } => Kind::Int,
            TypeExpr::Optional { .. } => Kind::Optional,
            TypeExpr::Slice { .. } => Kind::Slice,
            TypeExpr::Map { .. } => Kind::Map,
            TypeExpr::Named { .. } => Kind::Struct,
        }
    }

    /// Every `Named` reference reachable from a declaration must resolve.
    /// Returns the dangling `(reference, referenced_from)` pairs.
    pub fn dangling_references(&self) -> Vec<(TypeName, TypeName)> {
        let mut out = Vec::new();
        for def in self.types.values() {
            let mut exprs: Vec<&TypeExpr> = Vec::new();
            match &def.body {
                TypeBody::Alias { of } => exprs.push(of),
                TypeBody::Struct { fields } => exprs.extend(fields.iter().map(|f| &f.ty)),
            }
            while let Some(e) = exprs.pop() {
                match e {
                    TypeExpr::Named { .. } => {
                        let tn = e.as_named().expect("named expression");
                        if !self.types.contains_key(&tn) {
                            out.push((tn, def.name.clone()));
                        }
                    }
                    TypeExpr::Optional { elem } | TypeExpr::Slice { elem } => exprs.push(elem),
                    TypeExpr::Map { key, value } => {
                        exprs.push(key);
                        exprs.push(value);
                    }
                    _ => {}
                }
            }
        }
        out.sort();
        out.dedup();
        out
    }
}
