//! Intermediate representation consumed by the engine.
//!
//! Parsing source text is an upstream concern; the analyzer accepts units in
//! this serde-deserializable shape, typically as JSON files. A file may hold
//! either a single unit object or an array of units.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One translation unit: a named body of instructions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Unit {
    /// Unit name, used as the root context label.
    pub name: CompactString,
    /// Source file accesses are attributed to. Defaults to the unit name.
    #[serde(default)]
    pub file: Option<CompactString>,
    /// Root-context instruction sequence.
    pub body: Vec<Instr>,
}

impl Unit {
    /// The file name used in reported locations.
    #[must_use]
    pub fn display_file(&self) -> &str {
        self.file.as_deref().unwrap_or(self.name.as_str())
    }
}

/// One IR instruction with its source position.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Instr {
    /// The operation.
    pub op: Op,
    /// 1-indexed source line.
    #[serde(default = "default_line")]
    pub line: u32,
    /// 1-indexed source column.
    #[serde(default = "default_line")]
    pub col: u32,
}

fn default_line() -> u32 {
    1
}

/// Closed set of concurrency-relevant operations.
///
/// Externally tagged, so the JSON form reads e.g.
/// `{"op": {"read": {"resource": "x"}}, "line": 10, "col": 1}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// Read of a shared resource.
    Read {
        /// Resource name (aliasing resolved upstream).
        resource: CompactString,
    },
    /// Write of a shared resource.
    Write {
        /// Resource name (aliasing resolved upstream).
        resource: CompactString,
    },
    /// Lock acquisition.
    Acquire {
        /// Lock resource name.
        lock: CompactString,
    },
    /// Lock release.
    Release {
        /// Lock resource name.
        lock: CompactString,
    },
    /// Spawn of a child context running `body`.
    Spawn {
        /// Handle the spawn is bound to, if the program keeps one.
        #[serde(default)]
        handle: Option<CompactString>,
        /// The spawned context's instruction sequence.
        body: Vec<Instr>,
    },
    /// Join on the context bound to `handle`.
    Join {
        /// Handle of the context to join.
        handle: CompactString,
    },
    /// Channel send.
    Send {
        /// Channel resource name.
        channel: CompactString,
    },
    /// Channel receive.
    Recv {
        /// Channel resource name.
        channel: CompactString,
    },
    /// A construct the upstream front end could not lower.
    Unsupported {
        /// Description of the construct, echoed in diagnostics.
        construct: CompactString,
    },
}

/// Parses one IR file, accepting either a single unit or an array of units.
pub fn parse_units(content: &str) -> Result<Vec<Unit>, serde_json::Error> {
    match serde_json::from_str::<Vec<Unit>>(content) {
        Ok(units) => Ok(units),
        Err(_) => serde_json::from_str::<Unit>(content).map(|u| vec![u]),
    }
}
