// scanner.rs — Forward-only line source for optimization reports
//
// Supplies the report one physical line ("lexeme") at a time and keeps a
// running lexeme counter, which doubles as the 1-based line number used in
// diagnostics. Every byte read is also fed into a SHA-256 digest so the
// driver can fingerprint the report without reading it twice.
//
// Preconditions: the report is UTF-8 text.
// Postconditions: lexemes are returned in file order without line terminators.
// Failure modes: the report cannot be opened (`CompileError::Open`) or a line
//   cannot be read / is not UTF-8 (`CompileError::Read`).
// Side effects: owns the open file handle; released on drop.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::CompileError;

/// One physical report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub text: String,
    /// 1-based line number in the report.
    pub number: usize,
}

pub struct Scanner<R> {
    reader: R,
    count: usize,
    hasher: Sha256,
    exhausted: bool,
}

impl Scanner<BufReader<File>> {
    /// Open a report file for scanning.
    pub fn open(path: &Path) -> Result<Self, CompileError> {
        let file = File::open(path).map_err(|source| CompileError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Scanner::new(BufReader::new(file)))
    }
}

impl<'a> Scanner<&'a [u8]> {
    /// Scan an in-memory report.
    pub fn from_text(text: &'a str) -> Self {
        Scanner::new(text.as_bytes())
    }
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            count: 0,
            hasher: Sha256::new(),
            exhausted: false,
        }
    }

    /// Read the next line, or `None` once input is exhausted.
    ///
    /// Never rewinds; after the first `None` every later call is `None` too.
    pub fn next_lexeme(&mut self) -> Result<Option<Lexeme>, CompileError> {
        if self.exhausted {
            return Ok(None);
        }
        let mut buf = String::new();
        let read = self
            .reader
            .read_line(&mut buf)
            .map_err(|source| CompileError::Read {
                line: self.count + 1,
                source,
            })?;
        if read == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        self.hasher.update(buf.as_bytes());
        self.count += 1;

        let text = buf.trim_end_matches(['\n', '\r']).to_string();
        Ok(Some(Lexeme {
            text,
            number: self.count,
        }))
    }

    /// Number of lexemes returned so far.
    pub fn lexeme_count(&self) -> usize {
        self.count
    }

    /// SHA-256 of every byte consumed so far.
    pub fn digest(&self) -> [u8; 32] {
        let result = self.hasher.clone().finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }
}
