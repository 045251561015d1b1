//! racescan: static detection of potential race conditions.
//!
//! The analyzer consumes a concurrency-oriented intermediate representation
//! (see [`ir`]), extracts an ordered effect log, derives a happens-before
//! relation and per-effect locksets from the observed synchronization, and
//! reports unordered, unprotected conflicting accesses as structured
//! [`RaceWarning`]s. It is a best-effort static detector, not a proof
//! system: it never executes the analyzed program and assumes resource
//! identification (aliasing) is resolved upstream.
//!
//! Pipeline: IR -> effect log -> (context model, happens-before) ->
//! conflict set -> warnings. All stages are pure computation over immutable
//! inputs; `analyze` is deterministic for identical input.

pub mod aggregate;
pub mod analyzer;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod effect;
pub mod entry_point;
pub mod extractor;
pub mod ir;
pub mod model;
pub mod output;
#[doc(hidden)]
pub mod test_utils;

pub use aggregate::{RaceWarning, Severity};
pub use analyzer::{AnalysisResult, AnalysisSummary, RaceScan};
pub use cancel::CancelToken;
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use ir::Unit;
