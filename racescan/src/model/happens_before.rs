//! Happens-before relation over effects.
//!
//! The relation is stored as forward edges (program order plus the
//! synchronization edges added by the model builder) and queried via
//! reachability. An eagerly materialized transitive closure would be
//! quadratic in memory, so queries run an on-demand depth-first search; the
//! [`HbCursor`] memoizes results keyed by the (source, target) pairs actually
//! queried, bounding memory to observed queries.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::effect::{ContextId, EffectIdx, EffectLog};

/// The happens-before edge store. Immutable once the model is built.
#[derive(Debug)]
pub struct HappensBefore {
    succ: Vec<SmallVec<[EffectIdx; 2]>>,
    coords: Vec<(ContextId, u32)>,
}

impl HappensBefore {
    /// Creates the relation seeded with per-context program-order chains.
    #[must_use]
    pub fn new(log: &EffectLog) -> Self {
        let coords: Vec<(ContextId, u32)> =
            log.effects.iter().map(|e| (e.context, e.seq)).collect();
        let mut hb = Self {
            succ: vec![SmallVec::new(); log.len()],
            coords,
        };

        let mut last_in_ctx: FxHashMap<ContextId, EffectIdx> = FxHashMap::default();
        for (idx, effect) in log.effects.iter().enumerate() {
            let idx = u32::try_from(idx).unwrap_or(u32::MAX);
            if let Some(prev) = last_in_ctx.insert(effect.context, idx) {
                hb.add_edge(prev, idx);
            }
        }
        hb
    }

    /// Adds a direct ordering edge `from -> to`.
    pub fn add_edge(&mut self, from: EffectIdx, to: EffectIdx) {
        if let Some(succ) = self.succ.get_mut(from as usize) {
            if !succ.contains(&to) {
                succ.push(to);
            }
        }
    }

    /// Uncached reachability test, used while the relation is still being
    /// built (cycle guard for synchronization edges).
    #[must_use]
    pub fn reachable(&self, from: EffectIdx, to: EffectIdx) -> bool {
        self.search(from, to, &mut FxHashSet::default())
    }

    /// Creates a memoizing query cursor borrowing this relation.
    #[must_use]
    pub fn cursor(&self) -> HbCursor<'_> {
        HbCursor {
            hb: self,
            memo: FxHashMap::default(),
        }
    }

    fn search(&self, from: EffectIdx, to: EffectIdx, visited: &mut FxHashSet<EffectIdx>) -> bool {
        if from == to {
            return false;
        }
        let (target_ctx, target_seq) = self.coords[to as usize];
        let (from_ctx, from_seq) = self.coords[from as usize];
        if from_ctx == target_ctx {
            // Program order within a context is a chain.
            return from_seq < target_seq;
        }

        let mut stack: Vec<EffectIdx> = vec![from];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            // Any effect of the target's context at or before the target's
            // sequence number reaches it via program order.
            let (ctx, seq) = self.coords[node as usize];
            if node != from && ctx == target_ctx && seq <= target_seq {
                return true;
            }
            stack.extend(self.succ[node as usize].iter().copied());
        }
        false
    }
}

/// A per-worker reachability cursor with a query memo.
///
/// The detector hands each parallel resource task its own cursor, so queries
/// share no mutable state across workers.
pub struct HbCursor<'a> {
    hb: &'a HappensBefore,
    memo: FxHashMap<(EffectIdx, EffectIdx), bool>,
}

impl HbCursor<'_> {
    /// Whether `a` happens strictly before `b`.
    pub fn ordered(&mut self, a: EffectIdx, b: EffectIdx) -> bool {
        if let Some(&cached) = self.memo.get(&(a, b)) {
            return cached;
        }
        let result = self.hb.search(a, b, &mut FxHashSet::default());
        self.memo.insert((a, b), result);
        result
    }

    /// Whether `a` and `b` are unordered in the relation.
    pub fn concurrent(&mut self, a: EffectIdx, b: EffectIdx) -> bool {
        !self.ordered(a, b) && !self.ordered(b, a)
    }
}
