//! Per-effect lockset computation.
//!
//! The lockset of an effect is the set of lock resources its context holds
//! at that program point, computed from acquire/release effects in the
//! context's program order. Nested acquires push, releases pop the matching
//! lock; a release with no matching acquire is diagnosed and skipped, which
//! omits the corresponding happens-before edge but keeps the rest of the
//! context analyzable.

use smallvec::SmallVec;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::effect::{EffectKind, EffectLog, ResourceId};
use crate::model::context::ExecutionContext;

/// Locks held at a program point. Sorted, so intersection tests are a merge.
pub type LockSet = SmallVec<[ResourceId; 4]>;

/// Whether two sorted locksets share a lock.
#[must_use]
pub fn intersects(a: &LockSet, b: &LockSet) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => return true,
        }
    }
    false
}

/// Computes the lockset of every effect in the log.
///
/// The returned vector is indexed by effect index. An effect's lockset is a
/// snapshot taken before the effect itself applies, so an acquire does not
/// protect itself but does protect everything up to the matching release.
#[must_use]
pub fn compute(
    log: &EffectLog,
    contexts: &[ExecutionContext],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<LockSet> {
    let mut locksets: Vec<LockSet> = vec![LockSet::new(); log.len()];

    for ctx in contexts {
        let mut held = LockSet::new();
        for &idx in &ctx.effects {
            let effect = log.effect(idx);
            locksets[idx as usize] = held.clone();

            match (effect.kind, effect.resource) {
                (EffectKind::Acquire, Some(lock)) => {
                    let pos = held.partition_point(|&l| l <= lock);
                    held.insert(pos, lock);
                }
                (EffectKind::Release, Some(lock)) => {
                    // Pop the innermost matching acquire.
                    if let Some(pos) = held.iter().rposition(|&l| l == lock) {
                        held.remove(pos);
                    } else {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticKind::MismatchedSynchronization,
                                format!(
                                    "release of '{}' without a matching acquire",
                                    log.resources.name(lock)
                                ),
                            )
                            .in_context(ctx.label.as_str())
                            .at(effect.loc.clone()),
                        );
                    }
                }
                _ => {}
            }
        }
    }
    locksets
}
