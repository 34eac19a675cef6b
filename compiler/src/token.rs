// token.rs — Token model for optimization report lines
//
// One token per physical report line. Tokens carry the payload the parser
// needs (loop locations, chunk numbers, fused line lists, fan-out counts) so
// the parser never looks at raw text again.

use std::fmt;

use serde::Serialize;

/// Source location of a loop, as printed in `LOOP BEGIN at <file>(<line>,<col>)`.
///
/// The column is dropped: two reports of the same loop may disagree on it,
/// and loop identity is `(filename, line)` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub filename: String,
    pub line: u32,
}

impl Location {
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
        }
    }

    /// Canonical loop name: `filename(line)`.
    pub fn loop_name(&self) -> String {
        loop_name(&self.filename, self.line)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.filename, self.line)
    }
}

/// Canonical identity key of a main loop.
pub fn loop_name(filename: &str, line: u32) -> String {
    format!("{}({})", filename, line)
}

/// Payload of a `LOOP BEGIN` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopBegin {
    pub location: Location,
    /// Set for `... inlined into <file>(<line>,<col>)` call-site echoes.
    pub inlined_into: Option<Location>,
}

impl LoopBegin {
    pub fn inlined(&self) -> bool {
        self.inlined_into.is_some()
    }
}

/// Loop partition tags: the remarks that follow apply to a synthetic part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartTag {
    DistrChunk(u32),
    DistrChunkVectorRemainder(u32),
    DistrChunkRemainder(u32),
    Peel,
    VectorRemainder,
    Remainder,
}

impl fmt::Display for PartTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartTag::DistrChunk(n) => write!(f, "distr-chunk {n}"),
            PartTag::DistrChunkVectorRemainder(n) => write!(f, "distr-chunk-vector-remainder {n}"),
            PartTag::DistrChunkRemainder(n) => write!(f, "distr-chunk-remainder {n}"),
            PartTag::Peel => write!(f, "peel"),
            PartTag::VectorRemainder => write!(f, "vector-remainder"),
            PartTag::Remainder => write!(f, "remainder"),
        }
    }
}

/// Which flavour of loop a parallelized/vectorized remark talks about
/// (`DISTRIBUTED LOOP WAS ...`, `FUSED LOOP WAS ...`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopForm {
    Plain,
    Distributed,
    Fused,
    Partial,
}

impl fmt::Display for LoopForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopForm::Plain => write!(f, "plain"),
            LoopForm::Distributed => write!(f, "distributed"),
            LoopForm::Fused => write!(f, "fused"),
            LoopForm::Partial => write!(f, "partial"),
        }
    }
}

/// A single fact about the loop currently in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemarkKind {
    Parallel(LoopForm),
    ParallelPotential,
    ParallelInsufficientWork,
    ParallelNotCandidate,
    Vector(LoopForm),
    VectorPotential,
    ParallelDependence,
    VectorDependence,
    MemCall,
    /// Fused line numbers, the representative's own line first.
    FusionMain(Vec<u32>),
    FusionLost,
    /// Distribution fan-out.
    DistributionMark(u32),
    /// Line of the loop this one was collapsed with.
    CollapseMain(u32),
    CollapseEliminated,
    OpenMpParallel,
    NoOptimizations,
    Skip,
}

impl fmt::Display for RemarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemarkKind::Parallel(form) => write!(f, "parallel ({form})"),
            RemarkKind::ParallelPotential => write!(f, "parallel-potential"),
            RemarkKind::ParallelInsufficientWork => write!(f, "parallel-insufficient-work"),
            RemarkKind::ParallelNotCandidate => write!(f, "parallel-not-candidate"),
            RemarkKind::Vector(form) => write!(f, "vector ({form})"),
            RemarkKind::VectorPotential => write!(f, "vector-potential"),
            RemarkKind::ParallelDependence => write!(f, "parallel-dependence"),
            RemarkKind::VectorDependence => write!(f, "vector-dependence"),
            RemarkKind::MemCall => write!(f, "mem-call"),
            RemarkKind::FusionMain(lines) => {
                let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
                write!(f, "fusion-main [{}]", lines.join(" "))
            }
            RemarkKind::FusionLost => write!(f, "fusion-lost"),
            RemarkKind::DistributionMark(n) => write!(f, "distribution {n}-way"),
            RemarkKind::CollapseMain(line) => write!(f, "collapse-main {line}"),
            RemarkKind::CollapseEliminated => write!(f, "collapse-eliminated"),
            RemarkKind::OpenMpParallel => write!(f, "openmp-parallel"),
            RemarkKind::NoOptimizations => write!(f, "no-optimizations"),
            RemarkKind::Skip => write!(f, "skip"),
        }
    }
}

/// Classifier output for one report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Skip,
    LoopBegin(LoopBegin),
    LoopEnd,
    LoopPartTag(PartTag),
    LoopRemark {
        /// `remark #N` number; `None` for bare report lines.
        number: Option<u32>,
        kind: RemarkKind,
    },
    OpenMpConstruct(Location),
    /// Synthesized by the lexer once input is exhausted.
    EndOfReport,
}

impl Token {
    /// Short token class name used in structural error messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            Token::Skip => "skip line",
            Token::LoopBegin(_) => "LOOP BEGIN",
            Token::LoopEnd => "LOOP END",
            Token::LoopPartTag(_) => "loop partition tag",
            Token::LoopRemark { .. } => "loop remark",
            Token::OpenMpConstruct(_) => "OpenMP construct",
            Token::EndOfReport => "end of report",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Skip => write!(f, "skip"),
            Token::LoopBegin(begin) => {
                write!(f, "loop-begin {}", begin.location)?;
                if let Some(target) = &begin.inlined_into {
                    write!(f, " inlined-into {}", target)?;
                }
                Ok(())
            }
            Token::LoopEnd => write!(f, "loop-end"),
            Token::LoopPartTag(tag) => write!(f, "part-tag {tag}"),
            Token::LoopRemark {
                number: Some(n),
                kind,
            } => write!(f, "remark #{n} {kind}"),
            Token::LoopRemark { number: None, kind } => write!(f, "remark {kind}"),
            Token::OpenMpConstruct(at) => write!(f, "openmp-construct {at}"),
            Token::EndOfReport => write!(f, "end-of-report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_name_drops_column() {
        let at = Location::new("src/kernel.c", 42);
        assert_eq!(at.loop_name(), "src/kernel.c(42)");
        assert_eq!(at.to_string(), at.loop_name());
    }

    #[test]
    fn display_forms() {
        let begin = Token::LoopBegin(LoopBegin {
            location: Location::new("a.c", 3),
            inlined_into: Some(Location::new("b.c", 90)),
        });
        assert_eq!(begin.to_string(), "loop-begin a.c(3) inlined-into b.c(90)");

        let fused = Token::LoopRemark {
            number: Some(25045),
            kind: RemarkKind::FusionMain(vec![10, 20, 30]),
        };
        assert_eq!(fused.to_string(), "remark #25045 fusion-main [10 20 30]");

        let tag = Token::LoopPartTag(PartTag::DistrChunkVectorRemainder(2));
        assert_eq!(tag.to_string(), "part-tag distr-chunk-vector-remainder 2");
    }
}
