//! Diagnostic taxonomy.
//!
//! Non-fatal conditions are collected as [`Diagnostic`] values and returned
//! alongside warnings, never thrown across the pipeline boundary. Only
//! [`DiagnosticKind::InternalInvariant`] aborts processing, and then only for
//! the current unit.

use crate::effect::Location;
use compact_str::CompactString;
use serde::Serialize;
use std::fmt;

/// Closed set of diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The intermediate representation was malformed; the unit is skipped,
    /// other units continue.
    ParseUpstream,
    /// A synchronization primitive or effect kind is not modeled; the
    /// construct is treated as a no-op for ordering purposes.
    UnsupportedConstruct,
    /// Unmatched lock release, unmatched channel operation, or join on an
    /// unknown context; the specific happens-before edge is omitted.
    MismatchedSynchronization,
    /// The detector found an impossible state. Fatal for the current unit.
    InternalInvariant,
}

impl DiagnosticKind {
    /// Whether this diagnostic prevents the analysis from completing.
    /// Blocking diagnostics map to exit code 2 at the CLI boundary.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::ParseUpstream | Self::InternalInvariant)
    }

    /// Stable kind name for reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseUpstream => "parse-upstream",
            Self::UnsupportedConstruct => "unsupported-construct",
            Self::MismatchedSynchronization => "mismatched-synchronization",
            Self::InternalInvariant => "internal-invariant",
        }
    }
}

/// One reported condition, attached to a context and location when known.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Which taxonomy entry this is.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// Label of the affected execution context, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<CompactString>,
    /// Source position, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Creates a diagnostic with neither context nor location.
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
            location: None,
        }
    }

    /// Attaches a context label.
    #[must_use]
    pub fn in_context(mut self, label: &str) -> Self {
        self.context = Some(CompactString::new(label));
        self
    }

    /// Attaches a source position.
    #[must_use]
    pub fn at(mut self, loc: Location) -> Self {
        self.location = Some(loc);
        self
    }

    /// Whether this diagnostic prevents the analysis from completing.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.kind.is_blocking()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " (context {ctx})")?;
        }
        if let Some(loc) = &self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}
