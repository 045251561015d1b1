//! Machine-readable output.
//!
//! The warning shape is part of the external contract and stable across
//! runs: `id`, `resource`, `context_a`/`context_b` triples with
//! `file:line:col` locations, `severity`, and `occurrences`.

use serde::Serialize;
use std::io::Write;

use crate::aggregate::{AccessSite, RaceWarning, Severity};
use crate::analyzer::{AnalysisResult, AnalysisSummary};
use crate::diagnostics::Diagnostic;

#[derive(Serialize)]
struct SiteJson<'a> {
    id: &'a str,
    kind: &'a str,
    location: String,
}

impl<'a> From<&'a AccessSite> for SiteJson<'a> {
    fn from(site: &'a AccessSite) -> Self {
        Self {
            id: site.context.as_str(),
            kind: site.kind.as_str(),
            location: site.location.to_string(),
        }
    }
}

#[derive(Serialize)]
struct WarningJson<'a> {
    id: &'a str,
    resource: &'a str,
    context_a: SiteJson<'a>,
    context_b: SiteJson<'a>,
    severity: Severity,
    occurrences: usize,
    message: &'a str,
}

impl<'a> From<&'a RaceWarning> for WarningJson<'a> {
    fn from(w: &'a RaceWarning) -> Self {
        Self {
            id: &w.id,
            resource: w.resource.as_str(),
            context_a: SiteJson::from(&w.site_a),
            context_b: SiteJson::from(&w.site_b),
            severity: w.severity,
            occurrences: w.occurrences,
            message: &w.message,
        }
    }
}

#[derive(Serialize)]
struct ResultJson<'a> {
    warnings: Vec<WarningJson<'a>>,
    diagnostics: &'a [Diagnostic],
    summary: AnalysisSummary,
}

/// Writes the full result as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(writer: &mut impl Write, result: &AnalysisResult) -> anyhow::Result<()> {
    let shaped = ResultJson {
        warnings: result.warnings.iter().map(WarningJson::from).collect(),
        diagnostics: &result.diagnostics,
        summary: result.summary,
    };
    serde_json::to_writer_pretty(&mut *writer, &shaped)?;
    writeln!(writer)?;
    Ok(())
}
