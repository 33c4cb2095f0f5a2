//! Non-fatal render diagnostics
//!
//! Validation problems never abort a render. The offending node is dropped
//! and a diagnostic is recorded, and each one is also emitted as a
//! `tracing` warning.

use std::fmt;

/// A non-fatal problem found while rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
}

/// Category of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    /// Directive with missing or invalid attributes or body
    Directive,
    /// Prop name rejected by the scope rules
    Prop,
    /// Component expansion problem
    Component,
    /// Loop source that cannot be iterated
    Loop,
    /// Cache span that could not be stored
    Cache,
    /// Malformed markup such as stray closing tags
    Markup,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Directive => write!(f, "directive"),
            DiagnosticCategory::Prop => write!(f, "prop"),
            DiagnosticCategory::Component => write!(f, "component"),
            DiagnosticCategory::Loop => write!(f, "loop"),
            DiagnosticCategory::Cache => write!(f, "cache"),
            DiagnosticCategory::Markup => write!(f, "markup"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Per-render diagnostic sink
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: DiagnosticCategory, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%category, "{}", message);
        self.items.push(Diagnostic { category, message });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
