//! Effect extraction.
//!
//! Walks a unit's IR with an explicit worklist (no recursion, so deeply
//! nested programs cannot overflow the call stack) and emits the ordered
//! [`EffectLog`]. Extraction is deterministic for identical input: context
//! ids are allocated in spawn-encounter order and sequence numbers follow
//! per-context program order.

use compact_str::{format_compact, CompactString};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::effect::{ContextId, ContextMeta, Effect, EffectKind, EffectLog, Location};
use crate::ir::{Instr, Op, Unit};

/// Result of extracting one unit.
#[derive(Debug, Default)]
pub struct Extraction {
    /// The ordered effect log.
    pub log: EffectLog,
    /// Non-fatal conditions observed while extracting.
    pub diagnostics: Vec<Diagnostic>,
}

struct Frame<'a> {
    ctx: ContextId,
    body: &'a [Instr],
}

/// Extracts the effect log from one unit.
#[must_use]
pub fn extract(unit: &Unit) -> Extraction {
    let mut out = Extraction::default();
    out.log.contexts.push(ContextMeta {
        label: unit.name.clone(),
        parent: None,
    });

    // Breadth-first over contexts: the whole root body is processed before
    // any spawned body, so each context's effects are contiguous in the log.
    let mut queue: VecDeque<Frame<'_>> = VecDeque::new();
    queue.push_back(Frame {
        ctx: 0,
        body: &unit.body,
    });

    while let Some(frame) = queue.pop_front() {
        extract_frame(unit, frame, &mut queue, &mut out);
    }
    out
}

fn extract_frame<'a>(
    unit: &Unit,
    frame: Frame<'a>,
    queue: &mut VecDeque<Frame<'a>>,
    out: &mut Extraction,
) {
    let file = unit.display_file();
    // Handles bind within the spawning context only.
    let mut handles: FxHashMap<&'a str, ContextId> = FxHashMap::default();
    let mut seq: u32 = 0;

    for instr in frame.body {
        let loc = Location {
            file: CompactString::new(file),
            line: instr.line,
            col: instr.col,
        };

        let (kind, resource) = match &instr.op {
            Op::Read { resource } => (EffectKind::Read, Some(out.log.resources.intern(resource))),
            Op::Write { resource } => (EffectKind::Write, Some(out.log.resources.intern(resource))),
            Op::Acquire { lock } => (EffectKind::Acquire, Some(out.log.resources.intern(lock))),
            Op::Release { lock } => (EffectKind::Release, Some(out.log.resources.intern(lock))),
            Op::Send { channel } => (EffectKind::Send, Some(out.log.resources.intern(channel))),
            Op::Recv { channel } => (EffectKind::Recv, Some(out.log.resources.intern(channel))),
            Op::Spawn { handle, body } => {
                let child = allocate_context(unit, frame.ctx, handle.as_deref(), instr.line, out);
                if let Some(h) = handle.as_deref() {
                    // Rebinding a handle drops the previous context's
                    // joinability, mirroring handle overwrite semantics.
                    handles.insert(h, child);
                }
                queue.push_back(Frame { ctx: child, body });
                (EffectKind::Spawn { child }, None)
            }
            Op::Join { handle } => match handles.remove(handle.as_str()) {
                Some(child) => (EffectKind::Join { child }, None),
                None => {
                    out.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::MismatchedSynchronization,
                            format!("join on unknown handle '{handle}'"),
                        )
                        .in_context(out.log.context_label(frame.ctx))
                        .at(loc),
                    );
                    continue;
                }
            },
            Op::Unsupported { construct } => {
                out.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UnsupportedConstruct,
                        format!("construct '{construct}' is not modeled; treated as a no-op"),
                    )
                    .in_context(out.log.context_label(frame.ctx))
                    .at(loc.clone()),
                );
                (EffectKind::Unsupported, None)
            }
        };

        out.log.push(Effect {
            kind,
            resource,
            context: frame.ctx,
            seq,
            loc,
        });
        seq += 1;
    }
}

fn allocate_context(
    unit: &Unit,
    parent: ContextId,
    handle: Option<&str>,
    line: u32,
    out: &mut Extraction,
) -> ContextId {
    let id = u32::try_from(out.log.contexts.len()).unwrap_or(u32::MAX);
    let label = match handle {
        Some(h) => format_compact!("{}:{}@{}", unit.name, h, line),
        None => format_compact!("{}:anon@{}", unit.name, line),
    };
    out.log.contexts.push(ContextMeta {
        label,
        parent: Some(parent),
    });
    id
}
