//! Execution contexts.

use compact_str::CompactString;

use crate::effect::{ContextId, EffectIdx, EffectLog};

/// A unit of concurrent execution (thread/task equivalent).
///
/// Created when the extractor processes a spawn effect; never destroyed
/// during analysis.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Dense context id; the root context of a unit is 0.
    pub id: ContextId,
    /// The spawning context, `None` for the root.
    pub parent: Option<ContextId>,
    /// Human-readable label for reports.
    pub label: CompactString,
    /// Indices of this context's effects, in program order.
    pub effects: Vec<EffectIdx>,
}

impl ExecutionContext {
    /// Index of this context's first effect, if it has any.
    #[must_use]
    pub fn first_effect(&self) -> Option<EffectIdx> {
        self.effects.first().copied()
    }

    /// Index of this context's last effect, if it has any.
    #[must_use]
    pub fn last_effect(&self) -> Option<EffectIdx> {
        self.effects.last().copied()
    }
}

/// Partitions the effect log by owning context.
#[must_use]
pub fn partition(log: &EffectLog) -> Vec<ExecutionContext> {
    let mut contexts: Vec<ExecutionContext> = log
        .contexts
        .iter()
        .enumerate()
        .map(|(id, meta)| ExecutionContext {
            id: u32::try_from(id).unwrap_or(u32::MAX),
            parent: meta.parent,
            label: meta.label.clone(),
            effects: Vec::new(),
        })
        .collect();

    for (idx, effect) in log.effects.iter().enumerate() {
        if let Some(ctx) = contexts.get_mut(effect.context as usize) {
            ctx.effects.push(u32::try_from(idx).unwrap_or(u32::MAX));
        }
    }
    contexts
}
