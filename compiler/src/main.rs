use clap::Parser;
use log::{debug, info, LevelFilter};
use std::path::PathBuf;

use optrc::diag::{has_warnings, Diagnostic};
use optrc::error::{CompileError, ErrorClass};
use optrc::lexer::Lexer;
use optrc::pass::{PassId, POST_PASSES};
use optrc::pipeline::{run_pipeline, CompilationState, ReportSource};
use optrc::token::Token;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    Summary,
    Tree,
    Json,
    Tokens,
    Raw,
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "optrc",
    version,
    about = "Optimization report compiler — builds a queryable loop nest model from compiler optimization reports"
)]
struct Cli {
    /// Input optimization report
    report: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Summary)]
    emit: EmitStage,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Treat warnings as errors
    #[arg(long)]
    deny_warnings: bool,
}

fn exit_code(err: &CompileError) -> i32 {
    match err.class() {
        ErrorClass::Resource => 2,
        ErrorClass::Structural | ErrorClass::Consistency => 1,
    }
}

fn fail(err: CompileError) -> ! {
    eprintln!("optrc: error: {}", err);
    std::process::exit(exit_code(&err));
}

fn emit_tokens(cli: &Cli) -> Result<(), CompileError> {
    let mut lexer = Lexer::open(&cli.report)?;
    loop {
        let (token, line) = lexer.next_token()?;
        println!("{}: {}", line, token);
        if token == Token::EndOfReport {
            return Ok(());
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    debug!("report = {}", cli.report.display());
    debug!("emit   = {:?}", cli.emit);

    if let EmitStage::Tokens = cli.emit {
        if let Err(e) = emit_tokens(&cli) {
            fail(e);
        }
        return;
    }

    // ── Run passes ──
    let terminals: &[PassId] = match cli.emit {
        EmitStage::Raw | EmitStage::BuildInfo => &[PassId::Parse],
        _ => &POST_PASSES,
    };
    let mut state = CompilationState::new(ReportSource::File(cli.report.clone()));
    let quiet = cli.quiet;
    let result = run_pipeline(
        &mut state,
        terminals,
        cli.verbose > 0,
        |_, diags: &[Diagnostic]| {
            if !quiet {
                for d in diags {
                    eprintln!("optrc: {}", d);
                }
            }
        },
    );
    if let Err(e) = result {
        fail(e);
    }

    let nest = state.nest.unwrap_or_default();
    info!("{} loop records", nest.len());

    // ── Emit ──
    match cli.emit {
        EmitStage::Summary => print!("{}", optrc::nest_query::summarize(&nest)),
        EmitStage::Tree | EmitStage::Raw => print!("{}", nest),
        EmitStage::Json => match serde_json::to_string_pretty(&nest) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("optrc: error: cannot serialize loop nest: {}", e);
                std::process::exit(1);
            }
        },
        EmitStage::BuildInfo => {
            if let Some(provenance) = &state.provenance {
                print!("{}", provenance.to_json());
            }
        }
        EmitStage::Tokens => {}
    }

    if cli.deny_warnings && has_warnings(&state.diagnostics) {
        eprintln!("optrc: warnings denied");
        std::process::exit(1);
    }
}
