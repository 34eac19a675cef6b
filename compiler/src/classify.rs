// classify.rs — Line classifier for optimization reports
//
// Maps one report line to exactly one `Token`. A `logos` DFA recognizes the
// line head (`remark #N:`, `LOOP BEGIN at`, `LOOP END`, `<`, ...); the payload
// after the head is then matched against an ordered table of regexes.
//
// Preconditions: `line` is one physical report line (newline optional).
// Postconditions: returns a token; unrecognized text is `Token::Skip` or
//   `RemarkKind::Skip`, never an error.
// Failure modes: none.
// Side effects: none (pattern tables are compiled once, lazily).

use logos::Logos;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::token::{Location, LoopBegin, LoopForm, PartTag, RemarkKind, Token};

// ── Line heads ──
//
// Heads are disjoint by construction. Variant order mirrors the precedence
// of the dispatch below: remarks dominate report volume, then loop
// boundaries, then partition tags.

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum LineHead {
    #[regex(r"remark #[0-9]+:", remark_number)]
    Remark(u32),

    /// Bare line, not a numbered remark.
    #[token("No loop optimizations reported")]
    NoOptimizations,

    #[token("LOOP BEGIN at")]
    LoopBegin,

    #[token("OpenMP Construct at")]
    OpenMpConstruct,

    #[token("<")]
    PartTag,

    #[token("LOOP END")]
    LoopEnd,
}

fn remark_number(lex: &mut logos::Lexer<'_, LineHead>) -> Option<u32> {
    let slice = lex.slice();
    slice["remark #".len()..slice.len() - 1].parse().ok()
}

// ── Payload patterns ──

/// `<file>(<line>,<col>)` with an optional `inlined into <file>(<line>,<col>)`.
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.+?)\(([0-9]+),([0-9]+)\)(?:\s+inlined into\s+(.+?)\(([0-9]+),([0-9]+)\))?\s*$")
        .unwrap()
});

/// Chunk-numbered partition tags, with the leading `<` already consumed.
static DISTR_CHUNK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<prefix>Remainder loop for vectorization|Remainder), )?Distributed chunk(?P<n>[0-9]+)$",
    )
    .unwrap()
});

type RemarkBuilder = fn(&Captures<'_>) -> Option<RemarkKind>;

enum RemarkRule {
    Fixed(RemarkKind),
    Build(RemarkBuilder),
}

/// Remark text patterns, tested in order; the first match wins.
static REMARK_RULES: Lazy<Vec<(Regex, RemarkRule)>> = Lazy::new(|| {
    let rules = vec![
        (
            r"(?:\b(DISTRIBUTED|FUSED|PARTIAL) )?LOOP WAS AUTO-PARALLELIZED",
            RemarkRule::Build(parallel_remark),
        ),
        (
            r"OpenMP DEFINED LOOP (?:WAS )?PARALLELIZED",
            RemarkRule::Fixed(RemarkKind::OpenMpParallel),
        ),
        (
            r"(?:\b(DISTRIBUTED|FUSED|PARTIAL) )?LOOP WAS VECTORIZED",
            RemarkRule::Build(vector_remark),
        ),
        (
            r"loop was not parallelized: inner loop",
            RemarkRule::Fixed(RemarkKind::ParallelPotential),
        ),
        (
            r"loop was not vectorized: inner loop was already vectorized",
            RemarkRule::Fixed(RemarkKind::VectorPotential),
        ),
        (
            r"loop was not parallelized: existence of parallel dependence",
            RemarkRule::Fixed(RemarkKind::ParallelDependence),
        ),
        (
            r"loop was not vectorized: vector dependence prevents vectorization",
            RemarkRule::Fixed(RemarkKind::VectorDependence),
        ),
        (
            r"loop was not parallelized: insufficient computational work",
            RemarkRule::Fixed(RemarkKind::ParallelInsufficientWork),
        ),
        (
            r"loop was not parallelized: not a parallelization candidate",
            RemarkRule::Fixed(RemarkKind::ParallelNotCandidate),
        ),
        (
            r"memset generated|loop was transformed to memset or memcpy",
            RemarkRule::Fixed(RemarkKind::MemCall),
        ),
        (
            r"(?i)fused loops: \(([^)]*)\)",
            RemarkRule::Build(fusion_main_remark),
        ),
        (
            r"Loop lost in Fusion",
            RemarkRule::Fixed(RemarkKind::FusionLost),
        ),
        (
            r"Loop Distributed \(([0-9]+) way\)",
            RemarkRule::Build(distribution_remark),
        ),
        (
            r"Collapsed with loop at line ([0-9]+)",
            RemarkRule::Build(collapse_main_remark),
        ),
        (
            r"Loop eliminated in Collapsing",
            RemarkRule::Fixed(RemarkKind::CollapseEliminated),
        ),
    ];
    rules
        .into_iter()
        .map(|(pattern, rule)| (Regex::new(pattern).unwrap(), rule))
        .collect()
});

fn loop_form(caps: &Captures<'_>) -> LoopForm {
    match caps.get(1).map(|m| m.as_str()) {
        Some("DISTRIBUTED") => LoopForm::Distributed,
        Some("FUSED") => LoopForm::Fused,
        Some("PARTIAL") => LoopForm::Partial,
        _ => LoopForm::Plain,
    }
}

fn parallel_remark(caps: &Captures<'_>) -> Option<RemarkKind> {
    Some(RemarkKind::Parallel(loop_form(caps)))
}

fn vector_remark(caps: &Captures<'_>) -> Option<RemarkKind> {
    Some(RemarkKind::Vector(loop_form(caps)))
}

fn fusion_main_remark(caps: &Captures<'_>) -> Option<RemarkKind> {
    parse_line_list(&caps[1]).map(RemarkKind::FusionMain)
}

fn distribution_remark(caps: &Captures<'_>) -> Option<RemarkKind> {
    caps[1].parse().ok().map(RemarkKind::DistributionMark)
}

fn collapse_main_remark(caps: &Captures<'_>) -> Option<RemarkKind> {
    caps[1].parse().ok().map(RemarkKind::CollapseMain)
}

/// Parse `" 35 40 "` (or comma separated) into line numbers.
fn parse_line_list(text: &str) -> Option<Vec<u32>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

// ── Classification ──

/// Classify one report line.
pub fn classify(line: &str) -> Token {
    let mut heads = LineHead::lexer(line);
    let head = match heads.next() {
        Some(Ok(head)) => head,
        _ => return Token::Skip,
    };
    let rest = heads.remainder();

    match head {
        LineHead::Remark(number) => Token::LoopRemark {
            number: Some(number),
            kind: classify_remark(rest),
        },
        LineHead::NoOptimizations => Token::LoopRemark {
            number: None,
            kind: RemarkKind::NoOptimizations,
        },
        LineHead::LoopBegin => match classify_loop_begin(rest) {
            Some(begin) => Token::LoopBegin(begin),
            None => Token::Skip,
        },
        LineHead::OpenMpConstruct => match classify_loop_begin(rest) {
            Some(begin) => Token::OpenMpConstruct(begin.location),
            None => Token::Skip,
        },
        LineHead::PartTag => match classify_part_tag(rest) {
            Some(tag) => Token::LoopPartTag(tag),
            None => Token::Skip,
        },
        LineHead::LoopEnd if rest.trim().is_empty() => Token::LoopEnd,
        LineHead::LoopEnd => Token::Skip,
    }
}

/// Classify the text after `remark #N:`.
pub fn classify_remark(text: &str) -> RemarkKind {
    for (pattern, rule) in REMARK_RULES.iter() {
        if let Some(caps) = pattern.captures(text) {
            let kind = match rule {
                RemarkRule::Fixed(kind) => Some(kind.clone()),
                RemarkRule::Build(build) => build(&caps),
            };
            return kind.unwrap_or(RemarkKind::Skip);
        }
    }
    RemarkKind::Skip
}

fn classify_loop_begin(rest: &str) -> Option<LoopBegin> {
    let caps = LOCATION_RE.captures(rest)?;
    let location = Location::new(caps[1].trim(), caps[2].parse().ok()?);
    let inlined_into = match (caps.get(4), caps.get(5)) {
        (Some(file), Some(line)) => Some(Location::new(file.as_str().trim(), line.as_str().parse().ok()?)),
        _ => None,
    };
    Some(LoopBegin {
        location,
        inlined_into,
    })
}

fn classify_part_tag(rest: &str) -> Option<PartTag> {
    let body = rest.trim_end().strip_suffix('>')?;
    match body {
        "Peeled loop for vectorization" => return Some(PartTag::Peel),
        "Remainder loop for vectorization" => return Some(PartTag::VectorRemainder),
        "Remainder" => return Some(PartTag::Remainder),
        _ => {}
    }
    let caps = DISTR_CHUNK_RE.captures(body)?;
    let n: u32 = caps["n"].parse().ok()?;
    Some(match caps.name("prefix").map(|m| m.as_str()) {
        Some("Remainder loop for vectorization") => PartTag::DistrChunkVectorRemainder(n),
        Some(_) => PartTag::DistrChunkRemainder(n),
        None => PartTag::DistrChunk(n),
    })
}

// ── Tests ──
