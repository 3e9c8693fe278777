// diag.rs — Unified diagnostics model
//
// Provides the diagnostic type shared by every compiler pass and the single
// sink all passes report through. Diagnostics never abort a round: passes
// report and continue so one compilation surfaces every violation.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: `DiagnosticBuffer` accumulates reports in memory.

use std::cell::RefCell;
use std::fmt;

use crate::source::Location;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0201`).
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

    // Front end
    pub const E0101: DiagCode = DiagCode("E0101"); // syntax error
    pub const E0102: DiagCode = DiagCode("E0102"); // duplicate declaration
    pub const E0103: DiagCode = DiagCode("E0103"); // malformed supertype list

    // Remote-call contract
    pub const E0201: DiagCode = DiagCode("E0201"); // void return
    pub const E0202: DiagCode = DiagCode("E0202"); // non-task return
    pub const E0203: DiagCode = DiagCode("E0203"); // one-way with typed result
    pub const E0204: DiagCode = DiagCode("E0204"); // stateless-worker misuse
    pub const E0205: DiagCode = DiagCode("E0205"); // no-identity misuse
    pub const E0206: DiagCode = DiagCode("E0206"); // duplicate parameter name

    // Identifiers
    pub const E0301: DiagCode = DiagCode("E0301"); // method id collision
    pub const E0302: DiagCode = DiagCode("E0302"); // interface id collision

    // Generation and output
    pub const E0401: DiagCode = DiagCode("E0401"); // output write failure
    pub const E0402: DiagCode = DiagCode("E0402"); // rendering failure
    pub const E0501: DiagCode = DiagCode("E0501"); // round limit exceeded

    // Informational
    pub const I0001: DiagCode = DiagCode("I0001"); // artifact generated
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Info,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A compiler diagnostic emitted by any pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub message: String,
    pub hint: Option<String>,
    /// Source location of the offending declaration, when it has one.
    pub location: Option<Location>,
    /// Qualified name of the originating declaration (`pkg.Type#method`).
    pub origin: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, hint, location, or origin.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            message: message.into(),
            hint: None,
            location: None,
            origin: None,
        }
    }

    pub fn error(code: DiagCode, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, message).with_code(code)
    }

    pub fn info(code: DiagCode, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Info, message).with_code(code)
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

    pub fn at(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn from_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Info => "info",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: ", level, code)?;
        } else {
            write!(f, "{}: ", level)?;
        }
        if let Some(origin) = &self.origin {
            write!(f, "{}: ", origin)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

// ── Sink ─────────────────────────────────────────────────────────────────

/// The single channel every pass reports through.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// In-memory sink; the default for both the CLI and tests.
#[derive(Debug, Default)]
pub struct DiagnosticBuffer {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.is_error())
            .count()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

impl DiagnosticSink for DiagnosticBuffer {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}
