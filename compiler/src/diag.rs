// diag.rs — Soft diagnostics model
//
// Non-fatal findings produced while parsing and post-processing a report:
// conflicting restatements of a fact, OpenMP marks with no matching loop.
// Fatal conditions live in `error::CompileError`.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `W0100`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    /// A classification fact restated with a different value.
    pub const W0100: DiagCode = DiagCode("W0100");
    /// A fact payload (fused-with list, distribution fan-out, collapse
    /// target, loop form) restated with a different value.
    pub const W0101: DiagCode = DiagCode("W0101");
    /// OpenMP construct names a loop absent from the loop report.
    pub const W0200: DiagCode = DiagCode("W0200");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Related line ─────────────────────────────────────────────────────────

/// A secondary report line providing context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedLine {
    pub line: usize,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted by the parser or a post-processing pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    /// Report line the finding is anchored to, when there is one.
    pub line: Option<usize>,
    pub message: String,
    pub hint: Option<String>,
    pub related: Vec<RelatedLine>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, hint, or related lines.
    pub fn new(level: DiagLevel, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            line,
            message: message.into(),
            hint: None,
            related: Vec::new(),
        }
    }

    pub fn warning(line: Option<usize>, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, line, message)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a related report line.
    pub fn with_related(mut self, line: usize, label: impl Into<String>) -> Self {
        self.related.push(RelatedLine {
            line,
            label: label.into(),
        });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        match &self.code {
            Some(code) => write!(f, "{}[{}]", level, code)?,
            None => write!(f, "{}", level)?,
        }
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        write!(f, ": {}", self.message)?;
        for related in &self.related {
            write!(f, "\n  line {}: {}", related.line, related.label)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

pub fn has_warnings(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.level == DiagLevel::Warning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_code() {
        let d = Diagnostic::warning(None, "something drifted");
        assert_eq!(format!("{d}"), "warning: something drifted");
    }

    #[test]
    fn display_with_code_and_line() {
        let d = Diagnostic::warning(Some(12), "parallel restated as no").with_code(codes::W0100);
        assert_eq!(
            format!("{d}"),
            "warning[W0100] (line 12): parallel restated as no"
        );
    }

    #[test]
    fn builder_chain() {
        let d = Diagnostic::new(DiagLevel::Error, Some(4), "conflict")
            .with_code(codes::W0101)
            .with_hint("check the tiled sections")
            .with_related(2, "first observed here");

        assert_eq!(d.code, Some(codes::W0101));
        assert_eq!(d.hint.as_deref(), Some("check the tiled sections"));
        assert_eq!(d.related.len(), 1);
        assert_eq!(
            format!("{d}"),
            "error[W0101] (line 4): conflict\n  line 2: first observed here\n  hint: check the tiled sections"
        );
    }

    #[test]
    fn warning_detection() {
        assert!(!has_warnings(&[]));
        assert!(has_warnings(&[Diagnostic::warning(None, "x")]));
    }
}
