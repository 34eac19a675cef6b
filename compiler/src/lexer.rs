// lexer.rs — Token stream over an optimization report
//
// Composes the scanner (raw lines) with the classifier (one token per line)
// and is the single place where end of input becomes `Token::EndOfReport`.
//
// Preconditions: the underlying scanner was opened successfully.
// Postconditions: tokens are returned in report order, each paired with its
//   1-based report line; once `EndOfReport` is returned it is returned again
//   on every later call.
// Failure modes: read errors from the scanner (`CompileError::Read`).
// Side effects: advances the scanner; logs every token at trace level.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::trace;

use crate::classify::classify;
use crate::error::CompileError;
use crate::scanner::Scanner;
use crate::token::Token;

pub struct Lexer<R> {
    scanner: Scanner<R>,
    token_count: usize,
}

impl Lexer<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, CompileError> {
        Ok(Lexer::new(Scanner::open(path)?))
    }
}

impl<'a> Lexer<&'a [u8]> {
    pub fn from_text(text: &'a str) -> Self {
        Lexer::new(Scanner::from_text(text))
    }
}

impl<R: BufRead> Lexer<R> {
    pub fn new(scanner: Scanner<R>) -> Self {
        Self {
            scanner,
            token_count: 0,
        }
    }

    /// Next token and the report line it came from. `EndOfReport` carries
    /// the number of the last line read.
    pub fn next_token(&mut self) -> Result<(Token, usize), CompileError> {
        match self.scanner.next_lexeme()? {
            Some(lexeme) => {
                let token = classify(&lexeme.text);
                self.token_count += 1;
                trace!("line {}: {}", lexeme.number, token);
                Ok((token, lexeme.number))
            }
            None => Ok((Token::EndOfReport, self.scanner.lexeme_count())),
        }
    }

    /// Number of line tokens produced so far (`EndOfReport` excluded).
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// SHA-256 of the report bytes consumed so far.
    pub fn digest(&self) -> [u8; 32] {
        self.scanner.digest()
    }
}

/// Tokenize a whole in-memory report, `EndOfReport` included.
pub fn lex(text: &str) -> Result<Vec<(Token, usize)>, CompileError> {
    let mut lexer = Lexer::from_text(text);
    let mut tokens = Vec::new();
    loop {
        let (token, line) = lexer.next_token()?;
        let done = token == Token::EndOfReport;
        tokens.push((token, line));
        if done {
            return Ok(tokens);
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Location, LoopBegin, LoopForm, RemarkKind};

    #[test]
    fn end_to_end_token_stream() {
        let tokens = lex("LOOP BEGIN at f.c(5,3)\nremark #1: LOOP WAS AUTO-PARALLELIZED\nLOOP END\n")
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                (
                    Token::LoopBegin(LoopBegin {
                        location: Location::new("f.c", 5),
                        inlined_into: None,
                    }),
                    1
                ),
                (
                    Token::LoopRemark {
                        number: Some(1),
                        kind: RemarkKind::Parallel(LoopForm::Plain),
                    },
                    2
                ),
                (Token::LoopEnd, 3),
                (Token::EndOfReport, 3),
            ]
        );
    }

    #[test]
    fn empty_report_is_just_end_of_report() {
        assert_eq!(lex("").unwrap(), vec![(Token::EndOfReport, 0)]);
    }

    #[test]
    fn end_of_report_is_sticky() {
        let mut lexer = Lexer::from_text("LOOP END\n");
        assert_eq!(lexer.next_token().unwrap().0, Token::LoopEnd);
        assert_eq!(lexer.next_token().unwrap().0, Token::EndOfReport);
        assert_eq!(lexer.next_token().unwrap().0, Token::EndOfReport);
        assert_eq!(lexer.token_count(), 1);
    }

    #[test]
    fn blank_lines_are_skip_tokens() {
        let tokens = lex("\n\nLOOP END\n").unwrap();
        let classes: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            classes,
            vec![Token::Skip, Token::Skip, Token::LoopEnd, Token::EndOfReport]
        );
    }
}
