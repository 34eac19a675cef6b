// parser.rs — Recursive-descent parser building the loop nesting structure
//
// Two mutually recursive productions over the token stream: the report level
// (`parse_report`) and one loop scope (`parse_loop_body`). Loop identity is
// resolved through the flat `LoopNest::loops` index so a loop mentioned in
// several places maps to one record.
//
// Preconditions: `nest` is empty or holds loops from earlier sections of the
//   same report.
// Postconditions: on `Ok`, every non-inlined `LOOP BEGIN` location has exactly
//   one main-loop record; facts follow the first-write-wins rule.
// Failure modes: structural errors (unexpected token, unterminated scope,
//   tiling mismatch, part tag resolving to its owner) and read errors from
//   the lexer. No recovery is attempted.
// Side effects: consumes the lexer; collects soft diagnostics for
//   conflicting restatements.

use std::io::BufRead;

use log::{debug, warn};

use crate::diag::{codes, DiagCode, Diagnostic};
use crate::error::CompileError;
use crate::id::LoopId;
use crate::ir::{set_payload_once, Classification, FactKind, LoopNest, Observation, OpenMpMark};
use crate::lexer::Lexer;
use crate::token::{Location, LoopBegin, PartTag, RemarkKind, Token};

pub struct Parser<'a, R> {
    lexer: &'a mut Lexer<R>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, R: BufRead> Parser<'a, R> {
    pub fn new(lexer: &'a mut Lexer<R>) -> Self {
        Self {
            lexer,
            diagnostics: Vec::new(),
        }
    }

    /// Soft findings collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    // ── Report level ──

    /// Parse until `EndOfReport`.
    pub fn parse_report(&mut self, nest: &mut LoopNest) -> Result<(), CompileError> {
        // OpenMP construct whose remarks are being read
        let mut construct: Option<Location> = None;

        loop {
            let (token, line) = self.lexer.next_token()?;
            match token {
                Token::EndOfReport => return Ok(()),
                Token::Skip => {}
                Token::LoopBegin(begin) if begin.inlined() => {
                    construct = None;
                    self.skip_inlined(&begin)?;
                }
                Token::LoopBegin(begin) => {
                    construct = None;
                    let (id, _) = nest.resolve_main(&begin.location, 0, None);
                    nest.register_top_level(id);
                    self.parse_loop_body(nest, id)?;
                }
                Token::OpenMpConstruct(location) => {
                    construct = Some(location);
                }
                // function without loops
                Token::LoopRemark {
                    kind: RemarkKind::NoOptimizations,
                    ..
                } => {}
                Token::LoopRemark { kind, .. } if construct.is_some() => {
                    if let (RemarkKind::OpenMpParallel, Some(location)) = (&kind, &construct) {
                        debug!("openmp mark for {} at line {}", location, line);
                        nest.add_openmp_mark(OpenMpMark {
                            location: location.clone(),
                            report_line: line,
                        });
                    }
                }
                other => {
                    return Err(CompileError::UnexpectedToken {
                        line,
                        found: other.class_name().to_string(),
                        context: "at report level",
                    })
                }
            }
        }
    }

    // ── Loop scope ──

    /// Parse the scope of `id` up to and including its closing `LOOP END`
    /// (plus one extra `LOOP END` per tiling repetition seen in this scope).
    pub fn parse_loop_body(&mut self, nest: &mut LoopNest, id: LoopId) -> Result<(), CompileError> {
        let own = nest.get(id).location();
        let mut active = id;
        let mut tiles = 0u32;

        loop {
            let (token, line) = self.lexer.next_token()?;
            match token {
                Token::Skip => {}
                Token::LoopRemark { kind, .. } => self.apply_remark(nest, active, kind, line),
                Token::LoopBegin(begin) if begin.inlined() => {
                    self.skip_inlined(&begin)?;
                }
                Token::LoopBegin(begin) if begin.location == own => {
                    tiles += 1;
                    nest.get_mut(id).tiling_count += 1;
                    active = id;
                    debug!("loop {} tiling repetition {} at line {}", own, tiles, line);
                }
                Token::LoopBegin(begin) => {
                    let depth = nest.get(id).depth + 1;
                    let (child, created) = nest.resolve_main(&begin.location, depth, Some(id));
                    if created {
                        nest.add_inner_loop(id, child);
                    }
                    self.parse_loop_body(nest, child)?;
                }
                Token::LoopPartTag(tag) => {
                    let part = nest.resolve_part(id, tag);
                    // chunk 1 is the owner itself, so it may repeat the active loop
                    if part == active && tag != PartTag::DistrChunk(1) {
                        return Err(CompileError::PartResolvesToActive {
                            line,
                            loop_name: own.loop_name(),
                            tag: tag.to_string(),
                        });
                    }
                    active = part;
                }
                Token::LoopEnd => return self.consume_tile_ends(&own, tiles),
                Token::EndOfReport => {
                    return Err(CompileError::UnterminatedLoop {
                        loop_name: own.loop_name(),
                    })
                }
                other => {
                    return Err(CompileError::UnexpectedToken {
                        line,
                        found: other.class_name().to_string(),
                        context: "inside a loop scope",
                    })
                }
            }
        }
    }

    fn consume_tile_ends(&mut self, own: &Location, expected: u32) -> Result<(), CompileError> {
        let mut consumed = 0;
        while consumed < expected {
            let (token, line) = self.lexer.next_token()?;
            match token {
                Token::Skip => {}
                Token::LoopEnd => consumed += 1,
                _ => {
                    return Err(CompileError::TilingMismatch {
                        line,
                        loop_name: own.loop_name(),
                        expected,
                        consumed,
                    })
                }
            }
        }
        Ok(())
    }

    /// Discard the balanced scope opened by an inlined `LOOP BEGIN`.
    fn skip_inlined(&mut self, begin: &LoopBegin) -> Result<(), CompileError> {
        let mut open = 1usize;
        while open > 0 {
            match self.lexer.next_token()?.0 {
                Token::LoopBegin(_) => open += 1,
                Token::LoopEnd => open -= 1,
                Token::EndOfReport => {
                    return Err(CompileError::UnterminatedLoop {
                        loop_name: begin.location.loop_name(),
                    })
                }
                _ => {}
            }
        }
        debug!("skipped inlined scope of {}", begin.location);
        Ok(())
    }

    // ── Remarks ──

    fn apply_remark(&mut self, nest: &mut LoopNest, target: LoopId, kind: RemarkKind, line: usize) {
        use Classification::{No, Yes};

        match kind {
            RemarkKind::Parallel(form) => {
                self.state(nest, target, FactKind::Parallel, Yes, line);
                let ok = set_payload_once(&mut nest.get_mut(target).classification.parallel_form, form);
                self.payload(nest, target, ok, "parallel loop form", line);
            }
            RemarkKind::ParallelPotential => self.state(nest, target, FactKind::ParallelPotential, Yes, line),
            RemarkKind::ParallelInsufficientWork | RemarkKind::ParallelNotCandidate => {
                self.state(nest, target, FactKind::Parallel, No, line)
            }
            RemarkKind::Vector(form) => {
                self.state(nest, target, FactKind::Vector, Yes, line);
                let ok = set_payload_once(&mut nest.get_mut(target).classification.vector_form, form);
                self.payload(nest, target, ok, "vector loop form", line);
            }
            RemarkKind::VectorPotential => self.state(nest, target, FactKind::VectorPotential, Yes, line),
            RemarkKind::ParallelDependence => {
                self.state(nest, target, FactKind::ParallelDependence, Yes, line)
            }
            RemarkKind::VectorDependence => self.state(nest, target, FactKind::VectorDependence, Yes, line),
            RemarkKind::MemCall => self.state(nest, target, FactKind::MemCall, Yes, line),
            RemarkKind::FusionMain(lines) => {
                self.state(nest, target, FactKind::Fused, Yes, line);
                let ok = set_payload_once(&mut nest.get_mut(target).classification.fused_with, lines);
                self.payload(nest, target, ok, "fused-with list", line);
                nest.mark_fused(target);
            }
            RemarkKind::FusionLost => self.state(nest, target, FactKind::FusedLost, Yes, line),
            RemarkKind::DistributionMark(n) => {
                self.state(nest, target, FactKind::Distributed, Yes, line);
                let ok = set_payload_once(&mut nest.get_mut(target).classification.distr_parts_n, n);
                self.payload(nest, target, ok, "distribution fan-out", line);
            }
            RemarkKind::CollapseMain(with) => {
                self.state(nest, target, FactKind::Collapsed, Yes, line);
                let ok = set_payload_once(&mut nest.get_mut(target).classification.collapsed_with, with);
                self.payload(nest, target, ok, "collapse target", line);
                nest.mark_collapsed(target);
            }
            RemarkKind::CollapseEliminated => {
                self.state(nest, target, FactKind::CollapsedEliminated, Yes, line)
            }
            RemarkKind::OpenMpParallel => self.state(nest, target, FactKind::OpenMp, Yes, line),
            RemarkKind::NoOptimizations => {
                // fills only what nothing else stated
                let info = &mut nest.get_mut(target).classification;
                info.observe(FactKind::Parallel, No, Some(line));
                info.observe(FactKind::Vector, No, Some(line));
            }
            RemarkKind::Skip => {}
        }
    }

    /// Record a fact; a conflicting restatement becomes a W0100 warning.
    fn state(&mut self, nest: &mut LoopNest, target: LoopId, kind: FactKind, value: Classification, line: usize) {
        let record = nest.get_mut(target);
        if let Observation::Conflict { kept, first_line } =
            record.classification.observe(kind, value, Some(line))
        {
            let message = format!(
                "{} of loop {} restated as {}, keeping {}",
                kind, record.name, value, kept
            );
            warn!("line {}: {}", line, message);
            self.push_conflict(codes::W0100, line, message, first_line);
        }
    }

    fn payload(&mut self, nest: &LoopNest, target: LoopId, accepted: bool, what: &str, line: usize) {
        if accepted {
            return;
        }
        let message = format!(
            "{} of loop {} restated with a different value, keeping the first",
            what,
            nest.get(target).name
        );
        warn!("line {}: {}", line, message);
        self.push_conflict(codes::W0101, line, message, None);
    }

    fn push_conflict(&mut self, code: DiagCode, line: usize, message: String, first_line: Option<usize>) {
        let mut diag = Diagnostic::warning(Some(line), message).with_code(code);
        if let Some(first) = first_line {
            diag = diag.with_related(first, "first stated here");
        }
        self.diagnostics.push(diag);
    }
}

/// Parse a whole in-memory report without post-processing.
pub fn parse_str(text: &str) -> Result<(LoopNest, Vec<Diagnostic>), CompileError> {
    let mut lexer = Lexer::from_text(text);
    let mut nest = LoopNest::new();
    let mut parser = Parser::new(&mut lexer);
    parser.parse_report(&mut nest)?;
    Ok((nest, parser.into_diagnostics()))
}

// ── Tests ───────────────────────────────────────────────────────────────────
