//! Non-fatal findings collected while parsing and merging.
//!
//! The drill model never logs on its own. Callers hand a [`Diagnostics`]
//! collector to the parser and merge engine and decide afterwards what to do
//! with the entries; the converter forwards them to `tracing`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 1-based line number in the source file, when the finding has one.
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Info, line, message);
    }

    pub fn warn(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Warning, line, message);
    }

    fn push(&mut self, severity: Severity, line: Option<usize>, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity,
            line,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand all collected entries to the caller, leaving the collector empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Diagnostic> {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_and_filters() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info(None, "tools collapsed");
        diagnostics.warn(Some(4), "ignored header line 'FMAT,2'");

        assert_eq!(diagnostics.entries().len(), 2);
        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "line 4: ignored header line 'FMAT,2'");

        let drained: Vec<_> = diagnostics.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(diagnostics.is_empty());
    }
}
