// error.rs — Fatal compilation errors
//
// Every condition that aborts a report compilation. Soft findings (conflicting
// facts, dangling OpenMP marks) are `diag::Diagnostic` records instead and
// never appear here.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a fatal error, used by the driver to pick an
/// exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The report could not be opened or read.
    Resource,
    /// The token sequence violates the report grammar.
    Structural,
    /// The finished model contradicts itself (post-processing only).
    Consistency,
}

/// Which cross-reference group a consistency error was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Fusion,
    Collapse,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Fusion => write!(f, "fusion"),
            GroupKind::Collapse => write!(f, "collapse"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot open report {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read report line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: unexpected {found} {context}")]
    UnexpectedToken {
        line: usize,
        found: String,
        context: &'static str,
    },

    #[error("report ended inside the scope of loop {loop_name}")]
    UnterminatedLoop { loop_name: String },

    #[error(
        "line {line}: loop {loop_name} was tiled {expected} time(s) but only {consumed} extra LOOP END(s) follow"
    )]
    TilingMismatch {
        line: usize,
        loop_name: String,
        expected: u32,
        consumed: u32,
    },

    #[error("line {line}: partition tag {tag} of loop {loop_name} resolved to the sub-loop already active")]
    PartResolvesToActive {
        line: usize,
        loop_name: String,
        tag: String,
    },

    #[error("{group} group of {representative} references unknown loop {target}")]
    MissingGroupMember {
        group: GroupKind,
        representative: String,
        target: String,
    },

    #[error("{representative} is registered as a {group} representative but is not marked as one")]
    UnmarkedRepresentative {
        group: GroupKind,
        representative: String,
    },
}

impl CompileError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CompileError::Open { .. } | CompileError::Read { .. } => ErrorClass::Resource,
            CompileError::UnexpectedToken { .. }
            | CompileError::UnterminatedLoop { .. }
            | CompileError::TilingMismatch { .. }
            | CompileError::PartResolvesToActive { .. } => ErrorClass::Structural,
            CompileError::MissingGroupMember { .. } | CompileError::UnmarkedRepresentative { .. } => {
                ErrorClass::Consistency
            }
        }
    }
}
