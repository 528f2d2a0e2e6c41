//! Batch outcome accounting

use std::fmt;
use std::path::PathBuf;

/// One item that did not produce an output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub name: String,
    pub reason: String,
}

/// Outcome of a batch run: what was attempted, what was written, what failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    attempted: usize,
    written: Vec<PathBuf>,
    failures: Vec<FailedItem>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully written output
    pub fn record_success(&mut self, output: impl Into<PathBuf>) {
        self.attempted += 1;
        self.written.push(output.into());
    }

    /// Record a failed item
    pub fn record_failure(&mut self, name: impl Into<String>, reason: impl fmt::Display) {
        self.attempted += 1;
        self.failures.push(FailedItem {
            name: name.into(),
            reason: reason.to_string(),
        });
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: BatchReport) {
        self.attempted += other.attempted;
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn generated(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn failures(&self) -> &[FailedItem] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Generated 3/4 diagram(s)`
    pub fn summary(&self) -> String {
        format!(
            "Generated {}/{} diagram(s)",
            self.generated(),
            self.attempted()
        )
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} generated, {} failed", self.generated(), self.failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = BatchReport::new();
        assert_eq!(report.attempted(), 0);
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "0 generated, 0 failed");
    }

    #[test]
    fn test_counts() {
        let mut report = BatchReport::new();
        report.record_success("a.svg");
        report.record_failure("b", "HTTP 500");
        report.record_success("c.svg");

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.generated(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures()[0].name, "b");
        assert_eq!(report.summary(), "Generated 2/3 diagram(s)");
        assert_eq!(report.to_string(), "2 generated, 1 failed");
    }

    #[test]
    fn test_merge() {
        let mut first = BatchReport::new();
        first.record_success("a.svg");
        let mut second = BatchReport::new();
        second.record_failure("b", "exit 1");

        first.merge(second);
        assert_eq!(first.attempted(), 2);
        assert_eq!(first.written(), &[PathBuf::from("a.svg")]);
        assert!(!first.is_clean());
    }
}
