// optrc — Optimization Report Compiler
//
// Library root. Report text flows scanner → classify → lexer → parser, and
// the post-processing passes in `propagate` complete the loop nest.

pub mod classify;
pub mod diag;
pub mod error;
pub mod id;
pub mod ir;
pub mod lexer;
pub mod nest_query;
pub mod parser;
pub mod pass;
pub mod pipeline;
pub mod propagate;
pub mod scanner;
pub mod token;

pub use pipeline::{compile_report, compile_str, Compiled};
