//! Generation-time error handling.
//!
//! All failures raised while loading schemas, parsing tags, or planning
//! generated code are represented by [`GenError`]. Construction goes through
//! the [`ErrorReporting`] trait so every error carries the source text and
//! span of the offending declaration and renders as a rich miette report.
//!
//! Runtime validation failures are a separate taxonomy; see
//! [`crate::validate::ValidationError`].

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Source text for error reporting: a schema file, or a synthesized snippet
/// when the error is not anchored in any input (registry wiring, I/O).
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Creates a source context from real input content. Preferred.
    pub fn from_input(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Creates a fallback when real source is unavailable.
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("// {context}"),
        }
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("no source available")
    }
}

// ============================================================================
// ERROR TYPE
// ============================================================================

/// The single generation-time error type.
#[derive(Debug)]
pub struct GenError {
    /// What went wrong.
    pub kind: GenErrorKind,
    /// Where it happened.
    pub source_info: SourceInfo,
    /// How to help.
    pub diagnostic_info: DiagnosticInfo,
}

/// All generation failure modes.
#[derive(Debug, Clone, PartialEq)]
pub enum GenErrorKind {
    // Tag extraction
    MalformedTag {
        line: String,
        reason: String,
    },
    UnknownTag {
        tag: String,
    },
    ScopeViolation {
        tag: String,
        scope: String,
    },
    PayloadParse {
        tag: String,
        payload: String,
        reason: String,
    },
    MissingArgument {
        tag: String,
        expected: String,
    },
    TagRejected {
        tag: String,
        reason: String,
    },

    // Schema loading
    DanglingReference {
        type_name: String,
        referenced_from: String,
    },
    DuplicateType {
        type_name: String,
    },
    MalformedSchema {
        reason: String,
    },

    // Plumbing
    Io {
        path: String,
        reason: String,
    },
    Internal {
        message: String,
    },
}

/// Where an error is anchored in the inputs.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data.
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenErrorCategory {
    /// Tag extraction: malformed lines, unknown names, scope and payload
    /// problems, handler rejections.
    Tags,
    /// Schema loading: unresolved references, duplicates, unparseable
    /// declarations.
    Schema,
    /// I/O and internal generator bugs.
    Plumbing,
}

impl GenErrorKind {
    /// The generation phase this failure belongs to, for coarse test
    /// assertions.
    pub fn category(&self) -> GenErrorCategory {
        match self {
            Self::MalformedTag { .. }
            | Self::UnknownTag { .. }
            | Self::ScopeViolation { .. }
            | Self::PayloadParse { .. }
            | Self::MissingArgument { .. }
            | Self::TagRejected { .. } => GenErrorCategory::Tags,

            Self::DanglingReference { .. }
            | Self::DuplicateType { .. }
            | Self::MalformedSchema { .. } => GenErrorCategory::Schema,

            Self::Io { .. } | Self::Internal { .. } => GenErrorCategory::Plumbing,
        }
    }

    /// Error code suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::MalformedTag { .. } => "malformed_tag",
            Self::UnknownTag { .. } => "unknown_tag",
            Self::ScopeViolation { .. } => "scope_violation",
            Self::PayloadParse { .. } => "payload_parse",
            Self::MissingArgument { .. } => "missing_argument",
            Self::TagRejected { .. } => "tag_rejected",
            Self::DanglingReference { .. } => "dangling_reference",
            Self::DuplicateType { .. } => "duplicate_type",
            Self::MalformedSchema { .. } => "malformed_schema",
            Self::Io { .. } => "io",
            Self::Internal { .. } => "internal",
        }
    }
}

impl std::error::Error for GenError {}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GenErrorKind::MalformedTag { line, reason } => {
                write!(f, "malformed tag {line:?}: {reason}")
            }
            GenErrorKind::UnknownTag { tag } => {
                write!(f, "unknown tag {tag:?}")
            }
            GenErrorKind::ScopeViolation { tag, scope } => {
                write!(f, "tag {tag:?} cannot be specified on {scope}")
            }
            GenErrorKind::PayloadParse { tag, payload, reason } => {
                write!(f, "tag {tag:?}: error parsing payload {payload:?}: {reason}")
            }
            GenErrorKind::MissingArgument { tag, expected } => {
                write!(f, "tag {tag:?}: missing argument, expected {expected}")
            }
            GenErrorKind::TagRejected { tag, reason } => {
                write!(f, "tag {tag:?}: {reason}")
            }
            GenErrorKind::DanglingReference { type_name, referenced_from } => {
                write!(
                    f,
                    "type {type_name:?} referenced from {referenced_from} is not declared"
                )
            }
            GenErrorKind::DuplicateType { type_name } => {
                write!(f, "type {type_name:?} is declared more than once")
            }
            GenErrorKind::MalformedSchema { reason } => {
                write!(f, "malformed schema: {reason}")
            }
            GenErrorKind::Io { path, reason } => {
                write!(f, "i/o error on {path}: {reason}")
            }
            GenErrorKind::Internal { message } => {
                write!(f, "internal error: {message}")
            }
        }
    }
}

impl Diagnostic for GenError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl GenError {
    fn primary_label(&self) -> String {
        match &self.kind {
            GenErrorKind::MalformedTag { .. } => "malformed tag".into(),
            GenErrorKind::UnknownTag { .. } => "unknown tag".into(),
            GenErrorKind::ScopeViolation { .. } => "tag not allowed here".into(),
            GenErrorKind::PayloadParse { .. } => "unparseable payload".into(),
            GenErrorKind::MissingArgument { .. } => "missing argument".into(),
            GenErrorKind::TagRejected { .. } => "tag rejected".into(),
            GenErrorKind::DanglingReference { .. } => "unresolved reference".into(),
            GenErrorKind::DuplicateType { .. } => "duplicate declaration".into(),
            GenErrorKind::MalformedSchema { .. } => "malformed schema".into(),
            GenErrorKind::Io { .. } => "i/o failure".into(),
            GenErrorKind::Internal { .. } => "internal error".into(),
        }
    }
}

// ============================================================================
// CONTEXT-AWARE CONSTRUCTION
// ============================================================================

/// Context-aware error creation: each phase of generation knows how to
/// anchor errors in its inputs.
pub trait ErrorReporting {
    /// Creates an error with context-appropriate source anchoring.
    fn report(&self, kind: GenErrorKind, span: SourceSpan) -> GenError;

    fn unknown_tag(&self, tag: &str, span: SourceSpan) -> GenError {
        self.report(GenErrorKind::UnknownTag { tag: tag.into() }, span)
    }

    fn scope_violation(&self, tag: &str, scope: &str, span: SourceSpan) -> GenError {
        self.report(
            GenErrorKind::ScopeViolation {
                tag: tag.into(),
                scope: scope.into(),
            },
            span,
        )
    }

    fn payload_parse(&self, tag: &str, payload: &str, reason: &str, span: SourceSpan) -> GenError {
        self.report(
            GenErrorKind::PayloadParse {
                tag: tag.into(),
                payload: payload.into(),
                reason: reason.into(),
            },
            span,
        )
    }

    fn tag_rejected(&self, tag: &str, reason: &str, span: SourceSpan) -> GenError {
        self.report(
            GenErrorKind::TagRejected {
                tag: tag.into(),
                reason: reason.into(),
            },
            span,
        )
    }

    /// Creates an internal error. These indicate generator bugs, not schema
    /// errors.
    fn internal_error(&self, message: &str, span: SourceSpan) -> GenError {
        let mut error = self.report(
            GenErrorKind::Internal {
                message: message.into(),
            },
            span,
        );
        error.diagnostic_info.help =
            Some("This is an internal generator error. Please report this as a bug.".into());
        error
    }
}

/// General-purpose reporting context carrying the source being processed and
/// the generation phase for error codes.
pub struct GenContext {
    pub source: SourceContext,
    pub phase: String,
}

impl GenContext {
    pub fn new(source: SourceContext, phase: impl Into<String>) -> Self {
        Self {
            source,
            phase: phase.into(),
        }
    }
}

impl ErrorReporting for GenContext {
    fn report(&self, kind: GenErrorKind, span: SourceSpan) -> GenError {
        let error_code = format!("niyama::{}::{}", self.phase, kind.code_suffix());
        GenError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: span,
                phase: self.phase.clone(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

/// Placeholder span for errors not tied to a specific source location, such
/// as I/O errors or registry wiring failures.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Prints a GenError with full miette diagnostics. Use this for user-facing
/// error display in the CLI.
pub fn print_error(error: GenError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}
