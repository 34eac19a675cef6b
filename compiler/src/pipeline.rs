// pipeline.rs — Compilation state and pass orchestration
//
// Holds the report source, the loop nest being built and the accumulated
// diagnostics, and runs the minimal set of passes for the requested
// terminal passes.
//
// Preconditions: `CompilationState::source` names a readable report.
// Postconditions: on `Ok`, `nest` and `provenance` are populated and every
//   required pass ran exactly once, in dependency order.
// Failure modes: the first fatal `CompileError` of any pass stops the run.
// Side effects: reads the report once; calls `on_pass_complete` after each
//   pass for immediate diagnostic display.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::diag::Diagnostic;
use crate::error::CompileError;
use crate::ir::LoopNest;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::pass::{descriptor, required_passes, PassId, POST_PASSES};
use crate::propagate;

// ── Provenance ─────────────────────────────────────────────────────────────

/// Fingerprint of one compilation.
///
/// `report_hash`: SHA-256 of the raw report bytes.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub report_hash: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    pub fn new(report_hash: [u8; 32]) -> Self {
        Self {
            report_hash,
            compiler_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Hex string of the report hash (64 characters).
    pub fn report_hash_hex(&self) -> String {
        bytes_to_hex(&self.report_hash)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"report_hash\": \"{}\",\n  \"compiler_version\": \"{}\"\n}}\n",
            self.report_hash_hex(),
            self.compiler_version,
        )
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

// ── Compilation state ──────────────────────────────────────────────────────

/// Where the report text comes from.
#[derive(Debug, Clone)]
pub enum ReportSource {
    File(PathBuf),
    Text(String),
}

/// Holds all compilation artifacts and accumulated diagnostics.
pub struct CompilationState {
    pub source: ReportSource,
    pub nest: Option<LoopNest>,
    pub diagnostics: Vec<Diagnostic>,
    pub provenance: Option<Provenance>,
    /// Passes run so far, in execution order.
    pub completed: Vec<PassId>,
}

impl CompilationState {
    pub fn new(source: ReportSource) -> Self {
        Self {
            source,
            nest: None,
            diagnostics: Vec::new(),
            provenance: None,
            completed: Vec::new(),
        }
    }
}

/// Result of a full compilation.
#[derive(Debug)]
pub struct Compiled {
    pub nest: LoopNest,
    pub diagnostics: Vec<Diagnostic>,
    pub provenance: Provenance,
}

// ── Per-pass bookkeeping ───────────────────────────────────────────────────

fn finish_pass(
    state: &mut CompilationState,
    pass_id: PassId,
    diags: Vec<Diagnostic>,
    elapsed: Duration,
    verbose: bool,
    on_pass_complete: &mut impl FnMut(PassId, &[Diagnostic]),
) {
    on_pass_complete(pass_id, &diags);
    state.diagnostics.extend(diags);
    state.completed.push(pass_id);
    let ms = elapsed.as_secs_f64() * 1000.0;
    if verbose {
        info!("{} complete, {:.1}ms", descriptor(pass_id).name, ms);
    } else {
        debug!("{} complete, {:.1}ms", descriptor(pass_id).name, ms);
    }
}

fn parse_from<R: BufRead>(
    lexer: &mut Lexer<R>,
) -> Result<(LoopNest, Vec<Diagnostic>, [u8; 32]), CompileError> {
    let mut nest = LoopNest::new();
    let mut parser = Parser::new(lexer);
    parser.parse_report(&mut nest)?;
    let diags = parser.into_diagnostics();
    debug!(
        "parsed {} lines into {} loop records",
        lexer.token_count(),
        nest.len()
    );
    Ok((nest, diags, lexer.digest()))
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce every pass in `terminals`.
///
/// Per-pass sequence: execute → on_pass_complete(callback) → log timing.
pub fn run_pipeline(
    state: &mut CompilationState,
    terminals: &[PassId],
    verbose: bool,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), CompileError> {
    for pass_id in required_passes(terminals) {
        let t = Instant::now();
        let diags = match pass_id {
            PassId::Parse => {
                let (nest, diags, digest) = match &state.source {
                    ReportSource::File(path) => parse_from(&mut Lexer::open(path)?)?,
                    ReportSource::Text(text) => parse_from(&mut Lexer::from_text(text))?,
                };
                state.nest = Some(nest);
                state.provenance = Some(Provenance::new(digest));
                diags
            }
            post => {
                // Parse precedes every post pass in `required_passes`.
                let Some(nest) = state.nest.as_mut() else {
                    continue;
                };
                match post {
                    PassId::FusionPropagation => {
                        let n = propagate::propagate_fusion(nest)?;
                        debug!("fusion propagation updated {} loops", n);
                        Vec::new()
                    }
                    PassId::CollapsePropagation => {
                        let n = propagate::propagate_collapse(nest)?;
                        debug!("collapse propagation updated {} loops", n);
                        Vec::new()
                    }
                    PassId::OpenMpAttribution => propagate::attribute_openmp(nest),
                    PassId::Parse => Vec::new(),
                }
            }
        };
        let elapsed = t.elapsed();
        finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete);
    }
    Ok(())
}

fn compile(source: ReportSource) -> Result<Compiled, CompileError> {
    let mut state = CompilationState::new(source);
    run_pipeline(&mut state, &POST_PASSES, false, |_, _| {})?;
    let nest = state.nest.unwrap_or_default();
    let provenance = state
        .provenance
        .unwrap_or_else(|| Provenance::new([0u8; 32]));
    Ok(Compiled {
        nest,
        diagnostics: state.diagnostics,
        provenance,
    })
}

/// Compile a report file through every pass.
pub fn compile_report(path: &Path) -> Result<Compiled, CompileError> {
    compile(ReportSource::File(path.to_path_buf()))
}

/// Compile in-memory report text through every pass.
pub fn compile_str(text: &str) -> Result<Compiled, CompileError> {
    compile(ReportSource::Text(text.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    const REPORT: &str = "\
LOOP BEGIN at f.c(10,3)
   remark #25045: Fused Loops: ( 10 20 )
   remark #17109: LOOP WAS AUTO-PARALLELIZED
LOOP END
LOOP BEGIN at f.c(20,3)
   remark #25046: Loop lost in Fusion
LOOP END
";

    #[test]
    fn parse_only_skips_post_passes() {
        let mut state = CompilationState::new(ReportSource::Text(REPORT.to_string()));
        run_pipeline(&mut state, &[PassId::Parse], false, |_, _| {}).unwrap();
        assert_eq!(state.completed, vec![PassId::Parse]);
        let nest = state.nest.as_ref().unwrap();
        let member = nest.get(nest.find("f.c(20)").unwrap());
        assert_eq!(
            member.classification.get(crate::ir::FactKind::Parallel),
            crate::ir::Classification::Uninitialized
        );
    }

    #[test]
    fn callback_sees_every_pass_in_order() {
        let mut seen = Vec::new();
        let mut state = CompilationState::new(ReportSource::Text(REPORT.to_string()));
        run_pipeline(&mut state, &POST_PASSES, true, |pass, _| seen.push(pass)).unwrap();
        assert_eq!(
            seen,
            vec![
                PassId::Parse,
                PassId::FusionPropagation,
                PassId::CollapsePropagation,
                PassId::OpenMpAttribution,
            ]
        );
    }

    #[test]
    fn provenance_hashes_report_text() {
        let compiled = compile_str(REPORT).unwrap();
        let mut expected = [0u8; 32];
        expected.copy_from_slice(&Sha256::digest(REPORT.as_bytes()));
        assert_eq!(compiled.provenance.report_hash, expected);
        assert_eq!(compiled.provenance.report_hash_hex().len(), 64);
        assert!(compiled
            .provenance
            .to_json()
            .contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn compile_propagates_fusion() {
        let compiled = compile_str(REPORT).unwrap();
        let nest = &compiled.nest;
        let member = nest.get(nest.find("f.c(20)").unwrap());
        assert_eq!(
            member.classification.get(crate::ir::FactKind::Parallel),
            crate::ir::Classification::Yes
        );
        assert!(compiled.diagnostics.is_empty());
    }

    #[test]
    fn missing_report_is_resource_error() {
        let err = compile_report(Path::new("/nonexistent/report.optrpt")).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Resource);
    }
}
