//! Core data model for the analysis pipeline.
//!
//! An [`Effect`] is one observed concurrency-relevant operation: a memory
//! access, a lock operation, a spawn/join, or a channel operation. The
//! extractor produces an [`EffectLog`] (an append-only, ordered sequence of
//! effects plus the resource interner); everything downstream treats the log
//! as read-only.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Identifier of an execution context within one unit. The root context is 0.
pub type ContextId = u32;

/// Interned identifier of a resource (memory location, lock, or channel).
pub type ResourceId = u32;

/// Index of an effect in the [`EffectLog`].
pub type EffectIdx = u32;

/// Source position of an effect, reported as `file:line:col`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    /// Source file the unit was extracted from.
    pub file: CompactString,
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub col: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

/// Closed set of effect kinds. Dispatch is exhaustive pattern matching so a
/// new kind is compiler-checked everywhere it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Read of a shared resource.
    Read,
    /// Write of a shared resource.
    Write,
    /// Lock acquisition; `resource` names the lock.
    Acquire,
    /// Lock release; `resource` names the lock.
    Release,
    /// Creation of a child context.
    Spawn {
        /// The context created by this spawn.
        child: ContextId,
    },
    /// Join on a previously spawned context.
    Join {
        /// The context being joined.
        child: ContextId,
    },
    /// Channel send; `resource` names the channel.
    Send,
    /// Channel receive; `resource` names the channel.
    Recv,
    /// Marker for a construct the extractor does not model. Treated as a
    /// no-op for ordering and lockset purposes.
    Unsupported,
}

impl EffectKind {
    /// Short lowercase name used in reports and warning serialization.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Acquire => "lock-acquire",
            Self::Release => "lock-release",
            Self::Spawn { .. } => "spawn",
            Self::Join { .. } => "join",
            Self::Send => "send",
            Self::Recv => "receive",
            Self::Unsupported => "unsupported",
        }
    }
}

/// One observed operation. Immutable once appended to the log.
#[derive(Debug, Clone)]
pub struct Effect {
    /// What the operation does.
    pub kind: EffectKind,
    /// The resource the operation touches, if any. Spawn/join/unsupported
    /// effects carry no resource.
    pub resource: Option<ResourceId>,
    /// Owning execution context.
    pub context: ContextId,
    /// Program-order index within the owning context.
    pub seq: u32,
    /// Source position.
    pub loc: Location,
}

impl Effect {
    /// Whether this effect is a plain memory access (read or write).
    #[must_use]
    pub fn is_access(&self) -> bool {
        matches!(self.kind, EffectKind::Read | EffectKind::Write)
    }

    /// Whether this effect writes its resource.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self.kind, EffectKind::Write)
    }
}

/// Interner mapping resource names to dense u32 ids.
///
/// Equality of resources is by identity of the interned handle; aliasing is
/// assumed resolved upstream, so two textually identical names are the same
/// resource and two different names never are.
#[derive(Debug, Default)]
pub struct ResourceTable {
    names: Vec<CompactString>,
    index: FxHashMap<CompactString, ResourceId>,
}

impl ResourceTable {
    /// Interns a resource name, returning its stable id.
    pub fn intern(&mut self, name: &str) -> ResourceId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = u32::try_from(self.names.len()).unwrap_or(u32::MAX);
        self.names.push(CompactString::new(name));
        self.index.insert(CompactString::new(name), id);
        id
    }

    /// Returns the name of an interned resource.
    #[must_use]
    pub fn name(&self, id: ResourceId) -> &str {
        self.names
            .get(id as usize)
            .map_or("<unknown-resource>", CompactString::as_str)
    }

    /// Number of distinct resources seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no resources have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Metadata the extractor records for each context it creates.
#[derive(Debug, Clone)]
pub struct ContextMeta {
    /// Human-readable label, e.g. `main:worker@12` for a spawned context.
    pub label: CompactString,
    /// The spawning context, `None` for the root.
    pub parent: Option<ContextId>,
}

/// The ordered effect log for one translation unit.
///
/// Built once by the extractor and read-only afterwards.
#[derive(Debug, Default)]
pub struct EffectLog {
    /// Effects in extraction order. Within a context, `seq` is increasing.
    pub effects: Vec<Effect>,
    /// Interned resource names.
    pub resources: ResourceTable,
    /// Context metadata indexed by `ContextId`.
    pub contexts: Vec<ContextMeta>,
}

impl EffectLog {
    /// Appends an effect and returns its index.
    pub fn push(&mut self, effect: Effect) -> EffectIdx {
        let idx = u32::try_from(self.effects.len()).unwrap_or(u32::MAX);
        self.effects.push(effect);
        idx
    }

    /// Returns the effect at `idx`.
    #[must_use]
    pub fn effect(&self, idx: EffectIdx) -> &Effect {
        &self.effects[idx as usize]
    }

    /// Label of a context, for reports.
    #[must_use]
    pub fn context_label(&self, id: ContextId) -> &str {
        self.contexts
            .get(id as usize)
            .map_or("<unknown-context>", |m| m.label.as_str())
    }

    /// Number of effects in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
