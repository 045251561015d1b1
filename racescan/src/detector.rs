//! Conflict detection.
//!
//! For every resource, collects its accessing effects and runs the pairwise
//! conflict test: two accesses from different contexts conflict iff at least
//! one is a write, neither happens-before the other, and their locksets are
//! disjoint. Resources are independent, so the scan fans out with rayon and
//! the per-resource partial lists are concatenated in resource-id order,
//! never interleaved, which keeps output deterministic.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::effect::{EffectIdx, EffectLog, ResourceId};
use crate::model::{lockset, ContextModel};

/// An unordered pair of conflicting effects on one resource.
///
/// Pairs are canonicalized with the lexicographically smaller
/// `(context, seq)` first, so `(a, b)` and `(b, a)` are represented once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The contended resource.
    pub resource: ResourceId,
    /// First effect of the canonical pair.
    pub a: EffectIdx,
    /// Second effect of the canonical pair.
    pub b: EffectIdx,
}

/// Runs the pairwise conflict test over the whole log.
///
/// # Errors
///
/// Returns an [`DiagnosticKind::InternalInvariant`] diagnostic if the log is
/// in an impossible state (two effects at the same program point). This is
/// fatal for the current unit only.
pub fn detect(
    log: &EffectLog,
    model: &ContextModel,
    cancel: &CancelToken,
) -> Result<Vec<Conflict>, Diagnostic> {
    let mut groups: FxHashMap<ResourceId, Vec<EffectIdx>> = FxHashMap::default();
    for (idx, effect) in log.effects.iter().enumerate() {
        if effect.is_access() {
            if let Some(resource) = effect.resource {
                groups
                    .entry(resource)
                    .or_default()
                    .push(u32::try_from(idx).unwrap_or(u32::MAX));
            }
        }
    }

    let mut ordered_groups: Vec<(ResourceId, Vec<EffectIdx>)> = groups.into_iter().collect();
    ordered_groups.sort_unstable_by_key(|(resource, _)| *resource);
    for (_, accesses) in &mut ordered_groups {
        accesses.sort_unstable_by_key(|&idx| {
            let e = log.effect(idx);
            (e.context, e.seq)
        });
    }

    // Every resource is scanned; the first error in resource-id order is the
    // one surfaced, so the diagnostic does not depend on worker scheduling.
    let per_resource: Vec<Result<Vec<Conflict>, Diagnostic>> = ordered_groups
        .par_iter()
        .map(|(resource, accesses)| scan_resource(log, model, cancel, *resource, accesses))
        .collect();

    let mut conflicts = Vec::new();
    for result in per_resource {
        conflicts.extend(result?);
    }
    Ok(conflicts)
}

/// O(k²) pairwise test over one resource's accesses. Each worker owns its
/// reachability cursor, so resource scans share no mutable state.
fn scan_resource(
    log: &EffectLog,
    model: &ContextModel,
    cancel: &CancelToken,
    resource: ResourceId,
    accesses: &[EffectIdx],
) -> Result<Vec<Conflict>, Diagnostic> {
    if cancel.is_cancelled() {
        return Ok(Vec::new());
    }

    for pair in accesses.windows(2) {
        let (ea, eb) = (log.effect(pair[0]), log.effect(pair[1]));
        if (ea.context, ea.seq) == (eb.context, eb.seq) {
            return Err(Diagnostic::new(
                DiagnosticKind::InternalInvariant,
                format!(
                    "two effects share program point ({}, {}) on resource '{}'",
                    ea.context,
                    ea.seq,
                    log.resources.name(resource)
                ),
            )
            .at(ea.loc.clone()));
        }
    }

    let mut cursor = model.hb.cursor();
    let mut out = Vec::new();
    for (i, &a) in accesses.iter().enumerate() {
        for &b in &accesses[i + 1..] {
            let (ea, eb) = (log.effect(a), log.effect(b));
            if ea.context == eb.context {
                continue;
            }
            if !ea.is_write() && !eb.is_write() {
                continue;
            }
            if lockset::intersects(
                &model.locksets[a as usize],
                &model.locksets[b as usize],
            ) {
                continue;
            }
            if !cursor.concurrent(a, b) {
                continue;
            }
            // The access list is sorted by (context, seq), so a < b is
            // already the canonical orientation.
            out.push(Conflict { resource, a, b });
        }
    }
    Ok(out)
}
