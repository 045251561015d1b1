//! Shared helpers for building IR fixtures in tests.
//!
//! These constructors keep scenario tests readable: each helper produces one
//! [`Instr`] with the given source line (column defaults to 1).

use crate::ir::{Instr, Op, Unit};

/// Builds a unit named `name` with the given body.
#[must_use]
pub fn unit(name: &str, body: Vec<Instr>) -> Unit {
    Unit {
        name: name.into(),
        file: None,
        body,
    }
}

fn instr(op: Op, line: u32) -> Instr {
    Instr { op, line, col: 1 }
}

/// A read of `resource`.
#[must_use]
pub fn read(resource: &str, line: u32) -> Instr {
    instr(
        Op::Read {
            resource: resource.into(),
        },
        line,
    )
}

/// A write of `resource`.
#[must_use]
pub fn write(resource: &str, line: u32) -> Instr {
    instr(
        Op::Write {
            resource: resource.into(),
        },
        line,
    )
}

/// An acquire of `lock`.
#[must_use]
pub fn acquire(lock: &str, line: u32) -> Instr {
    instr(Op::Acquire { lock: lock.into() }, line)
}

/// A release of `lock`.
#[must_use]
pub fn release(lock: &str, line: u32) -> Instr {
    instr(Op::Release { lock: lock.into() }, line)
}

/// A spawn bound to `handle` running `body`.
#[must_use]
pub fn spawn(handle: &str, body: Vec<Instr>, line: u32) -> Instr {
    instr(
        Op::Spawn {
            handle: Some(handle.into()),
            body,
        },
        line,
    )
}

/// A spawn with no handle (never joinable).
#[must_use]
pub fn spawn_anon(body: Vec<Instr>, line: u32) -> Instr {
    instr(Op::Spawn { handle: None, body }, line)
}

/// A join on `handle`.
#[must_use]
pub fn join(handle: &str, line: u32) -> Instr {
    instr(
        Op::Join {
            handle: handle.into(),
        },
        line,
    )
}

/// A send on `channel`.
#[must_use]
pub fn send(channel: &str, line: u32) -> Instr {
    instr(
        Op::Send {
            channel: channel.into(),
        },
        line,
    )
}

/// A receive on `channel`.
#[must_use]
pub fn recv(channel: &str, line: u32) -> Instr {
    instr(
        Op::Recv {
            channel: channel.into(),
        },
        line,
    )
}

/// An unmodeled construct marker.
#[must_use]
pub fn unsupported(construct: &str, line: u32) -> Instr {
    instr(
        Op::Unsupported {
            construct: construct.into(),
        },
        line,
    )
}
