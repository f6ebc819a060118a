//! Reporting sink for per-declaration problems.
use std::fmt;

use colored::Colorize;
use serde::Serialize;

use crate::ir::Origin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub origin: Option<Origin>,
}

/// Anything that accepts (severity, message) pairs.
pub trait Reporter {
    fn report(&mut self, severity: Severity, message: String, origin: Option<&Origin>);

    fn error(&mut self, message: String, origin: Option<&Origin>) {
        self.report(Severity::Error, message, origin)
    }

    fn warning(&mut self, message: String, origin: Option<&Origin>) {
        self.report(Severity::Warning, message, origin)
    }

    fn note(&mut self, message: String, origin: Option<&Origin>) {
        self.report(Severity::Note, message, origin)
    }
}

/// Collects everything reported during one pass, in report order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Reporter for Diagnostics {
    fn report(&mut self, severity: Severity, message: String, origin: Option<&Origin>) {
        tracing::debug!(?severity, %message, "diagnostic");
        self.items.push(Diagnostic { severity, message, origin: origin.cloned() });
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.severity == Severity::Error).count()
    }
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
    /// Prints every diagnostic to stderr, compiler style.
    pub fn render(&self) {
        for diagnostic in &self.items {
            eprintln!("{diagnostic}");
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".cyan().bold(),
        };
        match &self.origin {
            Some(origin) => write!(f, "{label}: {} ({origin})", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}
