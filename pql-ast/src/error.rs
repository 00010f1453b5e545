use std::fmt::{self, Display, Formatter};

use crate::span::Span;

/// Why a diagnostic was raised. Structured rather than a bare string so
/// that callers (an editor's LSP layer, a test assertion) can match on the
/// shape instead of parsing rendered text.
#[derive(Clone, Debug, PartialEq)]
pub enum Reason {
    Simple(String),
    Expected {
        expected: String,
        found: String,
    },
    Unexpected {
        found: String,
    },
    Unterminated {
        what: &'static str,
    },
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Simple(s) => f.write_str(s),
            Reason::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Reason::Unexpected { found } => write!(f, "unexpected {found}"),
            Reason::Unterminated { what } => write!(f, "unterminated {what}"),
        }
    }
}

/// A (span, message) pair describing a lexical, syntactic, or semantic
/// problem without aborting compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub span: Option<Span>,
    pub reason: Reason,
    pub hints: Vec<String>,
}

impl Diagnostic {
    pub fn new(reason: Reason) -> Self {
        Diagnostic {
            span: None,
            reason,
            hints: Vec::new(),
        }
    }

    pub fn simple(message: impl Into<String>) -> Self {
        Diagnostic::new(Reason::Simple(message.into()))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        for hint in &self.hints {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
