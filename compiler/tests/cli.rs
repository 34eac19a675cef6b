// CLI tests: drive the built `optrc` binary over temporary report files.
//
// Locks the --emit modes and the exit code contract
// (0 success, 1 structural/consistency error or denied warnings, 2 resource error).

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

fn optrc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_optrc"))
}

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_report(contents: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "optrc_cli_{}_{}.optrpt",
        std::process::id(),
        n
    ));
    std::fs::write(&path, contents).expect("failed to write temp report");
    path
}

fn run(report: &str, args: &[&str]) -> Output {
    let path = temp_report(report);
    let output = Command::new(optrc_binary())
        .arg(&path)
        .args(args)
        .output()
        .expect("failed to run optrc");
    let _ = std::fs::remove_file(&path);
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const REPORT: &str = "\
LOOP BEGIN at f.c(10,3)
   remark #25045: Fused Loops: ( 10 20 )
   remark #17109: LOOP WAS AUTO-PARALLELIZED
LOOP END
LOOP BEGIN at f.c(20,3)
   remark #25046: Loop lost in Fusion
LOOP END
";

// ── Emit modes ──────────────────────────────────────────────────────────────

#[test]
fn default_emit_is_summary() {
    let output = run(REPORT, &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("loops: 2 (2 top-level, 0 parts)"), "{out}");
    assert!(out.contains("parallelized: 2"), "{out}");
    assert!(out.contains("fusion groups: 1"), "{out}");
}

#[test]
fn emit_tree_shows_propagated_facts() {
    let output = run(REPORT, &["--emit", "tree"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "f.c(10) depth=0 parallel=yes fused=yes fused-with=[10 20]\nf.c(20) depth=0 parallel=yes fused-lost=yes\n"
    );
}

#[test]
fn emit_raw_skips_propagation() {
    let output = run(REPORT, &["--emit", "raw"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("f.c(20) depth=0 fused-lost=yes\n"));
}

#[test]
fn emit_json_is_valid() {
    let output = run(REPORT, &["--emit", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("invalid JSON");
    assert_eq!(value["arena"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(value["loops"]["f.c(20)"], 1);
    assert_eq!(value["arena"][1]["classification"]["parallel"], "yes");
    assert_eq!(value["arena"][1]["classification"]["vector"], "uninitialized");
}

#[test]
fn emit_tokens_lists_every_line() {
    let output = run(REPORT, &["--emit", "tokens"]);
    assert!(output.status.success());
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "1: loop-begin f.c(10)");
    assert_eq!(lines[1], "2: remark #25045 fusion-main [10 20]");
    assert_eq!(lines[7], "7: end-of-report");
}

#[test]
fn emit_build_info() {
    let output = run(REPORT, &["--emit", "build-info"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("invalid JSON");
    assert_eq!(value["report_hash"].as_str().map(str::len), Some(64));
    assert_eq!(value["compiler_version"], env!("CARGO_PKG_VERSION"));
}

// ── Exit codes ──────────────────────────────────────────────────────────────

#[test]
fn missing_report_exits_2() {
    let output = Command::new(optrc_binary())
        .arg("/nonexistent/dir/missing.optrpt")
        .output()
        .expect("failed to run optrc");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("cannot open report"));
}

#[test]
fn structural_error_exits_1() {
    let output = run("LOOP BEGIN at f.c(5,3)\n", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("f.c(5)"));
}

#[test]
fn consistency_error_exits_1() {
    let output = run(
        "LOOP BEGIN at f.c(10,3)\n   remark #25045: Fused Loops: ( 10 99 )\nLOOP END\n",
        &[],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("f.c(99)"));
}

#[test]
fn warnings_are_printed_and_can_be_denied() {
    let report = "\
LOOP BEGIN at f.c(5,3)
   remark #17109: LOOP WAS AUTO-PARALLELIZED
   remark #17107: loop was not parallelized: insufficient computational work
LOOP END
";
    let output = run(report, &[]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("warning[W0100] (line 3)"));

    let denied = run(report, &["--deny-warnings"]);
    assert_eq!(denied.status.code(), Some(1));

    let quiet = run(report, &["-q"]);
    assert!(quiet.status.success());
    assert!(!stderr(&quiet).contains("W0100"));
}
