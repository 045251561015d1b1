//! Top-level analysis driver.
//!
//! [`RaceScan`] wires the pipeline together: IR -> effect log -> context
//! model -> conflict set -> warnings. `analyze` is a pure function of its
//! input; identical input yields byte-identical warning ordering and ids.
//! Units are independent, so `analyze_units` fans out with rayon and merges
//! per-unit results in input order.

use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::{self, RaceWarning};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::detector;
use crate::diagnostics::Diagnostic;
use crate::extractor;
use crate::ir::Unit;
use crate::model::ContextModel;

/// Counters describing how much work an analysis covered.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AnalysisSummary {
    /// Units analyzed.
    pub total_units: usize,
    /// Execution contexts discovered.
    pub total_contexts: usize,
    /// Effects extracted.
    pub total_effects: usize,
    /// Distinct resources touched.
    pub total_resources: usize,
}

impl AnalysisSummary {
    fn absorb(&mut self, other: &Self) {
        self.total_units += other.total_units;
        self.total_contexts += other.total_contexts;
        self.total_effects += other.total_effects;
        self.total_resources += other.total_resources;
    }
}

/// Everything one run produces: warnings and diagnostics are both
/// first-class outputs, so a run with only diagnostics is distinguishable
/// from a clean run.
#[derive(Debug, Default, Serialize)]
pub struct AnalysisResult {
    /// Deduplicated, stably ordered race warnings.
    pub warnings: Vec<RaceWarning>,
    /// Non-fatal (and unit-fatal) conditions observed along the way.
    pub diagnostics: Vec<Diagnostic>,
    /// Work counters.
    pub summary: AnalysisSummary,
}

impl AnalysisResult {
    /// Whether any diagnostic prevented the analysis from completing.
    #[must_use]
    pub fn has_blocking_diagnostics(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_blocking)
    }

    /// Whether the run found nothing at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.diagnostics.is_empty()
    }

    /// Appends another result, preserving order.
    pub fn absorb(&mut self, other: Self) {
        self.warnings.extend(other.warnings);
        self.diagnostics.extend(other.diagnostics);
        self.summary.absorb(&other.summary);
    }
}

/// Main analyzer state and runtime configuration.
#[derive(Debug, Default)]
pub struct RaceScan {
    /// Configuration object.
    pub config: Config,
    cancel: CancelToken,
}

impl RaceScan {
    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Returns a handle that cancels this analyzer at the next checkpoint.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Analyzes a single unit.
    #[must_use]
    pub fn analyze(&self, unit: &Unit) -> AnalysisResult {
        let extraction = extractor::extract(unit);
        let mut diagnostics = extraction.diagnostics;
        let log = extraction.log;

        let (model, model_diagnostics) = ContextModel::build(&log);
        diagnostics.extend(model_diagnostics);

        let warnings = match detector::detect(&log, &model, &self.cancel) {
            Ok(conflicts) => {
                let globs = self.config.ignore_globset();
                aggregate::aggregate(
                    &log,
                    &conflicts,
                    &self.config.severity_policy(),
                    globs.as_ref(),
                )
            }
            Err(fatal) => {
                // Fatal for this unit only; surfaced, never swallowed.
                diagnostics.push(fatal);
                Vec::new()
            }
        };

        AnalysisResult {
            warnings,
            diagnostics,
            summary: AnalysisSummary {
                total_units: 1,
                total_contexts: log.contexts.len(),
                total_effects: log.len(),
                total_resources: log.resources.len(),
            },
        }
    }

    /// Analyzes several units, in parallel, merging results in input order.
    #[must_use]
    pub fn analyze_units(&self, units: &[Unit]) -> AnalysisResult {
        let per_unit: Vec<AnalysisResult> = units
            .par_iter()
            .map(|unit| {
                if self.cancel.is_cancelled() {
                    AnalysisResult::default()
                } else {
                    self.analyze(unit)
                }
            })
            .collect();

        let mut merged = AnalysisResult::default();
        for result in per_unit {
            merged.absorb(result);
        }
        merged
    }
}
