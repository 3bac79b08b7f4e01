//! Emission records: the bridge between tag dispatch and code generation.
//!
//! A tag never writes code. It returns [`FunctionGen`] records describing
//! validator calls with the canonical signature
//! `fn(op, path, new, old, extra...)`, plus [`VariableGen`] records for
//! package-level supporting data. The emitter renders these into source.

use std::ops::BitOr;

/// Optional properties of a planned validator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// On failure, suppress subsequent validators on the same field.
    pub const SHORT_CIRCUIT: Flags = Flags(1);
    /// Errors from this call are discarded; combined with SHORT_CIRCUIT it
    /// stops the field's chain silently.
    pub const NON_ERROR: Flags = Flags(1 << 1);
    /// For optional fields, pass the option itself rather than the pointee.
    pub const PTR_OK: Flags = Flags(1 << 2);

    pub fn contains(self, wanted: Flags) -> bool {
        (self.0 & wanted.0) == wanted.0
    }

    pub fn is_short_circuit(self) -> bool {
        self.contains(Self::SHORT_CIRCUIT)
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Feature-toggle guards around a generated call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    /// Run the call only when this option is enabled.
    pub option_enabled: Option<String>,
    /// Run the call only when this option is disabled.
    pub option_disabled: Option<String>,
}

impl Conditions {
    pub fn is_empty(&self) -> bool {
        self.option_enabled.is_none() && self.option_disabled.is_none()
    }
}

/// The ratcheting equivalence a container iteration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquivKind {
    /// No element-level ratcheting.
    None,
    /// Direct `PartialEq` comparison.
    Direct,
    /// Structural deep equality over serialized form.
    Deep,
}

/// A nested validator passed as an argument to an iteration primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorRef {
    /// A generated validator, referenced by function name.
    Named(String),
    /// An inline composition of calls, rendered as a closure.
    Inline(Vec<FunctionGen>),
}

/// How a value must be bound before the canonical `new`/`old` arguments are
/// passed: most values go through as-is, vectors are reborrowed as slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindKind {
    #[default]
    Direct,
    Slice,
}

/// One member of a union, as the emitter needs to see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    /// Rust field name on the enclosing struct.
    pub rust_name: String,
    /// Whether the field is an option (set = `is_some`) or a value
    /// (set = differs from default).
    pub optional: bool,
}

/// An argument to a planned validator call, beyond the canonical four.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Rendered as a `&[...]` literal of string slices.
    StrList(Vec<String>),
    /// Rendered as a `&[(..., ...)]` literal of string pairs.
    PairList(Vec<(String, String)>),
    /// Reference to an emitted package-level identifier.
    Ident(String),
    /// Rendered as a literal `None`, for optional extras left unset.
    NoneLit,
    /// Correspondence matcher for keyed lists: `|a, b| a.f == b.f`,
    /// conjoined over every key field. `wrapped` renders it inside `Some`
    /// for callees that take an optional matcher.
    KeyMatch { rust_fields: Vec<String>, wrapped: bool },
    /// Ratcheting equivalence for a container; `elem_ty` is the rendered
    /// element type.
    Equiv { kind: EquivKind, elem_ty: String },
    /// Union member extractors, one closure per member.
    ExtractorList(Vec<MemberSpec>),
    /// Discriminator value extractor: `|v| v.f.to_string()`.
    DiscriminatorFn { rust_field: String },
    /// A nested validator; `bind` says how the element value is bound
    /// inside an inline closure.
    Validator { vref: ValidatorRef, bind: BindKind },
}

/// Navigation into a named subfield before a call applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    pub json_name: String,
    pub rust_name: String,
    /// Whether the subfield itself is an option.
    pub optional: bool,
    /// How the subfield value binds for the final call.
    pub bind: BindKind,
}

/// A planned validator function invocation.
///
/// `callee` is a path under the runtime validation library (for example
/// `presence::required_option`); the emitter qualifies it. The generated
/// call always receives `(op, path, new, old)` first, then `args`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionGen {
    /// The tag which triggered this validator; drives emission ordering.
    pub tag: String,
    pub flags: Flags,
    pub callee: String,
    /// Explicit turbofish type arguments, when inference is not enough.
    pub type_args: Vec<String>,
    pub args: Vec<Arg>,
    pub cond: Conditions,
    /// When non-empty, the call applies through this chain of subfields of
    /// the value, outermost first.
    pub subfield: Vec<Subfield>,
}

/// Creates a FunctionGen for a callee and extra args.
pub fn function(tag: impl Into<String>, flags: Flags, callee: impl Into<String>, args: Vec<Arg>) -> FunctionGen {
    FunctionGen {
        tag: tag.into(),
        flags,
        callee: callee.into(),
        type_args: Vec::new(),
        args,
        cond: Conditions::default(),
        subfield: Vec::new(),
    }
}

/// Wraps a call in a feature-toggle guard.
pub fn with_condition(mut f: FunctionGen, cond: Conditions) -> FunctionGen {
    if cond.option_enabled.is_some() {
        f.cond.option_enabled = cond.option_enabled;
    }
    if cond.option_disabled.is_some() {
        f.cond.option_disabled = cond.option_disabled;
    }
    f
}

/// A package-level supporting variable (union membership tables).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableGen {
    pub ident: String,
    pub init: FunctionGen,
}

/// Everything one extraction produced: calls plus supporting variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validations {
    pub functions: Vec<FunctionGen>,
    pub variables: Vec<VariableGen>,
}

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, f: FunctionGen) {
        self.functions.push(f);
    }

    pub fn add_variable(&mut self, v: VariableGen) {
        self.variables.push(v);
    }

    pub fn add(&mut self, other: Validations) {
        self.functions.extend(other.functions);
        self.variables.extend(other.variables);
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.variables.is_empty()
    }
}

/// Sorts a field's calls into their emitted order: short-circuiting
/// presence checks first, then everything else by (tag name, original
/// position). The sort is stable, so repeated occurrences of one tag keep
/// their textual order.
///
/// Only the presence family participates in the leading short-circuit
/// phase. A short-circuiting shape check like maxItems sorts by tag name
/// with its peers, so a sibling uniqueness check (tagged listType) still
/// reports before an oversized list stops the chain.
pub fn sort_emissions(mut fns: Vec<FunctionGen>) -> Vec<FunctionGen> {
    let mut keyed: Vec<(usize, FunctionGen)> = fns.drain(..).enumerate().collect();
    keyed.sort_by(|(ia, a), (ib, b)| {
        let presence_a = !(a.flags.is_short_circuit() && a.callee.starts_with("presence::"));
        let presence_b = !(b.flags.is_short_circuit() && b.callee.starts_with("presence::"));
        presence_a
            .cmp(&presence_b)
            .then_with(|| a.tag.cmp(&b.tag))
            .then_with(|| ia.cmp(ib))
    });
    keyed.into_iter().map(|(_, f)| f).collect()
}
