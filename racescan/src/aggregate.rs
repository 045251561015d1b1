//! Warning aggregation.
//!
//! Converts the conflict set into deduplicated, stably ordered
//! [`RaceWarning`] records. Conflicts that map to the same
//! `(resource, location, location)` triple -- e.g. loop-body effects that
//! share a source location but differ in dynamic instance -- collapse into a
//! single warning with an occurrence count.

use compact_str::CompactString;
use globset::GlobSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::detector::Conflict;
use crate::effect::{Effect, EffectLog, Location};

/// Reported severity of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Potential race involving at least one read.
    Warning,
    /// Potential race between two writes.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// How conflict shapes map to severities. Overridable from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SeverityPolicy {
    /// Severity of write/write conflicts.
    pub write_write: Severity,
    /// Severity of read/write conflicts.
    pub read_write: Severity,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            write_write: Severity::Error,
            read_write: Severity::Warning,
        }
    }
}

/// One side of a reported race: which context, what it did, where.
#[derive(Debug, Clone, Serialize)]
pub struct AccessSite {
    /// Label of the accessing context.
    pub context: CompactString,
    /// Effect kind name ("read" or "write").
    pub kind: CompactString,
    /// Source position of the access.
    pub location: Location,
}

/// The externally visible artifact. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct RaceWarning {
    /// Deterministic hash of resource and both locations, stable across runs.
    pub id: String,
    /// Name of the contended resource.
    pub resource: CompactString,
    /// First access site (smaller location).
    pub site_a: AccessSite,
    /// Second access site.
    pub site_b: AccessSite,
    /// Reported severity.
    pub severity: Severity,
    /// Number of conflicts collapsed into this warning.
    pub occurrences: usize,
    /// Human-readable summary.
    pub message: String,
}

struct Bucket {
    a: AccessSite,
    b: AccessSite,
    write_write: bool,
    occurrences: usize,
}

/// Aggregates conflicts into warnings sorted by resource, then the canonical
/// pair's first location, then second location.
#[must_use]
pub fn aggregate(
    log: &EffectLog,
    conflicts: &[Conflict],
    policy: &SeverityPolicy,
    ignores: Option<&GlobSet>,
) -> Vec<RaceWarning> {
    let mut buckets: BTreeMap<(CompactString, Location, Location), Bucket> = BTreeMap::new();

    for conflict in conflicts {
        let resource = CompactString::new(log.resources.name(conflict.resource));
        if ignores.is_some_and(|g| g.is_match(resource.as_str())) {
            continue;
        }

        let (ea, eb) = (log.effect(conflict.a), log.effect(conflict.b));
        // Warnings describe unordered pairs; key and sites are normalized by
        // location so swapped orientations collapse together.
        let (first, second) = if ea.loc <= eb.loc { (ea, eb) } else { (eb, ea) };
        let key = (resource, first.loc.clone(), second.loc.clone());
        let write_write = ea.is_write() && eb.is_write();

        buckets
            .entry(key)
            .and_modify(|bucket| {
                bucket.occurrences += 1;
                bucket.write_write |= write_write;
            })
            .or_insert_with(|| Bucket {
                a: site(log, first),
                b: site(log, second),
                write_write,
                occurrences: 1,
            });
    }

    buckets
        .into_iter()
        .map(|((resource, loc_a, loc_b), bucket)| {
            let severity = if bucket.write_write {
                policy.write_write
            } else {
                policy.read_write
            };
            let message = format!(
                "unsynchronized {}/{} access to '{}' between {} and {}",
                bucket.a.kind, bucket.b.kind, resource, bucket.a.context, bucket.b.context
            );
            RaceWarning {
                id: stable_id(&resource, &loc_a, &loc_b),
                resource,
                site_a: bucket.a,
                site_b: bucket.b,
                severity,
                occurrences: bucket.occurrences,
                message,
            }
        })
        .collect()
}

fn site(log: &EffectLog, effect: &Effect) -> AccessSite {
    AccessSite {
        context: CompactString::new(log.context_label(effect.context)),
        kind: CompactString::new(effect.kind.as_str()),
        location: effect.loc.clone(),
    }
}

/// Deterministic warning id: hex of a fixed-seed hash over the resource name
/// and both locations.
fn stable_id(resource: &str, a: &Location, b: &Location) -> String {
    let mut hasher = rustc_hash::FxHasher::default();
    resource.hash(&mut hasher);
    a.hash(&mut hasher);
    b.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
