use serde::Serialize;

/// A source file left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    /// File name of the source
    pub file_name: String,
    /// Rendered per-file error
    pub reason: String,
}

/// Outcome of every file attempted by one combine call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Number of files tried
    pub attempted: usize,
    /// Files that produced a table, in processing order
    pub loaded: Vec<String>,
    /// Files that were skipped, in processing order
    pub skipped: Vec<SkippedSource>,
}

impl LoadReport {
    /// Whether every attempted file was loaded
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
