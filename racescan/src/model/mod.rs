//! Concurrency context model.
//!
//! Consumes the effect log and builds the set of execution contexts, the
//! happens-before relation, and per-effect locksets. Malformed pairings
//! (release without acquire, join on an unknown context, unmatched channel
//! operations) are reported as diagnostics and their edges omitted, a
//! conservative choice that may under-report orderings but never invents
//! false ones.

pub mod context;
pub mod happens_before;
pub mod lockset;

pub use context::ExecutionContext;
pub use happens_before::{HappensBefore, HbCursor};
pub use lockset::LockSet;

use rustc_hash::FxHashMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::effect::{EffectIdx, EffectKind, EffectLog, ResourceId};

/// The built model for one unit: contexts, ordering, locksets.
#[derive(Debug)]
pub struct ContextModel {
    /// Execution contexts with their effect partitions.
    pub contexts: Vec<ExecutionContext>,
    /// Happens-before relation over the whole log.
    pub hb: HappensBefore,
    /// Per-effect locksets, indexed by effect index.
    pub locksets: Vec<LockSet>,
}

impl ContextModel {
    /// Builds the model from an effect log.
    #[must_use]
    pub fn build(log: &EffectLog) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let contexts = context::partition(log);
        let mut hb = HappensBefore::new(log);

        // Locksets come first: lock-edge construction consults them to tell
        // matched releases from stray ones.
        let locksets = lockset::compute(log, &contexts, &mut diagnostics);

        add_spawn_join_edges(log, &contexts, &mut hb);
        add_lock_edges(log, &locksets, &mut hb);
        add_channel_edges(log, &contexts, &mut hb, &mut diagnostics);

        (
            Self {
                contexts,
                hb,
                locksets,
            },
            diagnostics,
        )
    }
}

/// A spawn happens-before the first effect of the spawned context; every
/// effect of a joined context happens-before the join. Empty child bodies
/// simply contribute no edge.
fn add_spawn_join_edges(log: &EffectLog, contexts: &[ExecutionContext], hb: &mut HappensBefore) {
    for (idx, effect) in log.effects.iter().enumerate() {
        let idx = u32::try_from(idx).unwrap_or(u32::MAX);
        match effect.kind {
            EffectKind::Spawn { child } => {
                if let Some(first) = contexts
                    .get(child as usize)
                    .and_then(ExecutionContext::first_effect)
                {
                    hb.add_edge(idx, first);
                }
            }
            EffectKind::Join { child } => {
                if let Some(last) = contexts
                    .get(child as usize)
                    .and_then(ExecutionContext::last_effect)
                {
                    hb.add_edge(last, idx);
                }
            }
            _ => {}
        }
    }
}

/// Groups effect indices per resource for the given kinds, in a global order
/// consistent with per-context program order (ties broken by context id, then
/// sequence number, for determinism).
fn grouped_sorted(
    log: &EffectLog,
    mut keep: impl FnMut(EffectKind) -> bool,
) -> Vec<(ResourceId, Vec<EffectIdx>)> {
    let mut groups: FxHashMap<ResourceId, Vec<EffectIdx>> = FxHashMap::default();
    for (idx, effect) in log.effects.iter().enumerate() {
        if keep(effect.kind) {
            if let Some(resource) = effect.resource {
                groups
                    .entry(resource)
                    .or_default()
                    .push(u32::try_from(idx).unwrap_or(u32::MAX));
            }
        }
    }
    let mut out: Vec<(ResourceId, Vec<EffectIdx>)> = groups.into_iter().collect();
    out.sort_unstable_by_key(|(resource, _)| *resource);
    for (_, events) in &mut out {
        events.sort_unstable_by_key(|&idx| {
            let e = log.effect(idx);
            (e.context, e.seq)
        });
    }
    out
}

/// Each matched lock release happens-before the next compatible acquire of
/// the same lock. "Compatible" means the acquire is not already ordered
/// before the release, which keeps the relation acyclic. A release with no
/// matching acquire contributes no edge (it is diagnosed by the lockset
/// pass), so malformed synchronization never invents an ordering.
fn add_lock_edges(log: &EffectLog, locksets: &[LockSet], hb: &mut HappensBefore) {
    let groups = grouped_sorted(log, |k| {
        matches!(k, EffectKind::Acquire | EffectKind::Release)
    });
    for (_, events) in groups {
        for (i, &event) in events.iter().enumerate() {
            let effect = log.effect(event);
            if !matches!(effect.kind, EffectKind::Release) {
                continue;
            }
            // The lockset snapshot is taken before the effect applies, so a
            // matched release sees its own lock in the snapshot.
            let matched = effect
                .resource
                .is_some_and(|lock| locksets[event as usize].contains(&lock));
            if !matched {
                continue;
            }
            for &candidate in &events[i + 1..] {
                if !matches!(log.effect(candidate).kind, EffectKind::Acquire) {
                    continue;
                }
                if hb.reachable(candidate, event) {
                    continue;
                }
                hb.add_edge(event, candidate);
                break;
            }
        }
    }
}

/// Matched send/receive pairs order the send before the receive. Pairing is
/// FIFO per channel in the deterministic global order.
fn add_channel_edges(
    log: &EffectLog,
    contexts: &[ExecutionContext],
    hb: &mut HappensBefore,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let sends = grouped_sorted(log, |k| matches!(k, EffectKind::Send));
    let mut recvs: FxHashMap<ResourceId, Vec<EffectIdx>> = grouped_sorted(log, |k| {
        matches!(k, EffectKind::Recv)
    })
    .into_iter()
    .collect();

    let mut report_unmatched = |idx: EffectIdx, what: &str| {
        let effect = log.effect(idx);
        let channel = effect
            .resource
            .map_or("<unknown>", |r| log.resources.name(r));
        let label = contexts
            .get(effect.context as usize)
            .map_or("<unknown-context>", |c| c.label.as_str());
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::MismatchedSynchronization,
                format!("{what} on channel '{channel}' has no matching counterpart"),
            )
            .in_context(label)
            .at(effect.loc.clone()),
        );
    };

    for (channel, send_list) in sends {
        let recv_list = recvs.remove(&channel).unwrap_or_default();
        let paired = send_list.len().min(recv_list.len());
        for k in 0..paired {
            let (send, recv) = (send_list[k], recv_list[k]);
            if hb.reachable(recv, send) {
                // A receive already ordered before its send cannot be the
                // matching one; the edge is omitted.
                report_unmatched(send, "send");
                continue;
            }
            hb.add_edge(send, recv);
        }
        for &send in &send_list[paired..] {
            report_unmatched(send, "send");
        }
        for &recv in &recv_list[paired..] {
            report_unmatched(recv, "receive");
        }
    }
    let mut leftover: Vec<(ResourceId, Vec<EffectIdx>)> = recvs.into_iter().collect();
    leftover.sort_unstable_by_key(|(resource, _)| *resource);
    for (_, recv_list) in leftover {
        for recv in recv_list {
            report_unmatched(recv, "receive");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use crate::test_utils::{
        acquire, join, read, recv, release, send, spawn, unit, write,
    };

    fn idx_of(log: &EffectLog, context: u32, seq: u32) -> EffectIdx {
        u32::try_from(
            log.effects
                .iter()
                .position(|e| e.context == context && e.seq == seq)
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn spawn_and_join_edges_order_child_with_parent() {
        let ex = extract(&unit(
            "u",
            vec![
                write("x", 1),
                spawn("t", vec![write("x", 9)], 2),
                join("t", 3),
                read("x", 4),
            ],
        ));
        let (model, diags) = ContextModel::build(&ex.log);
        assert!(diags.is_empty());
        let mut cur = model.hb.cursor();

        let parent_write = idx_of(&ex.log, 0, 0);
        let child_write = idx_of(&ex.log, 1, 0);
        let parent_read = idx_of(&ex.log, 0, 3);
        assert!(cur.ordered(parent_write, child_write));
        assert!(cur.ordered(child_write, parent_read));
    }

    #[test]
    fn release_orders_before_next_acquire_of_same_lock() {
        let ex = extract(&unit(
            "u",
            vec![
                acquire("l", 1),
                write("x", 2),
                release("l", 3),
                spawn("t", vec![acquire("l", 9), read("x", 10), release("l", 11)], 4),
            ],
        ));
        let (model, diags) = ContextModel::build(&ex.log);
        assert!(diags.is_empty());
        let mut cur = model.hb.cursor();
        let parent_release = idx_of(&ex.log, 0, 2);
        let child_acquire = idx_of(&ex.log, 1, 0);
        assert!(cur.ordered(parent_release, child_acquire));
    }

    #[test]
    fn send_orders_before_matching_receive() {
        let ex = extract(&unit(
            "u",
            vec![
                spawn("t", vec![recv("c", 9), read("x", 10)], 1),
                write("x", 2),
                send("c", 3),
            ],
        ));
        let (model, diags) = ContextModel::build(&ex.log);
        assert!(diags.is_empty());
        let mut cur = model.hb.cursor();
        let parent_write = idx_of(&ex.log, 0, 1);
        let child_read = idx_of(&ex.log, 1, 1);
        assert!(
            cur.ordered(parent_write, child_read),
            "write before send reaches the post-receive read"
        );
    }

    #[test]
    fn unmatched_release_adds_no_lock_edge() {
        // b's stray release must not be paired with c's acquire; the two
        // sibling writes stay concurrent.
        let ex = extract(&unit(
            "u",
            vec![
                spawn("b", vec![write("x", 10), release("l", 11)], 1),
                spawn(
                    "c",
                    vec![acquire("l", 20), write("x", 21), release("l", 22)],
                    2,
                ),
            ],
        ));
        let (model, diags) = ContextModel::build(&ex.log);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MismatchedSynchronization);

        let mut cur = model.hb.cursor();
        let b_write = idx_of(&ex.log, 1, 0);
        let c_write = idx_of(&ex.log, 2, 1);
        assert!(cur.concurrent(b_write, c_write));
    }

    #[test]
    fn unmatched_channel_operation_is_diagnosed() {
        let ex = extract(&unit("u", vec![send("c", 1), send("c", 2), recv("c", 3)]));
        let (_, diags) = ContextModel::build(&ex.log);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MismatchedSynchronization);
    }
}
