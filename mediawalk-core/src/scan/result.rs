use serde::Serialize;

/// Outcome of one traversal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanResult {
    /// Processed normally.
    Ok,
    /// Intentionally not processed; not an error.
    Skipped,
    /// Unrecoverable; aborts the enclosing traversal.
    Error,
}

impl ScanResult {
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Counters collected during one top-level scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub directories: u64,
    pub files: u64,
    /// Directories left out by the allow-list or deny-list.
    pub policy_skipped: u64,
    /// Directories containing the no-scan marker.
    pub marker_skipped: u64,
    /// Directories that could not be opened.
    pub unreadable: u64,
    /// Entries dropped because their path did not fit or their status could
    /// not be resolved.
    pub ignored: u64,
}

/// Result of a top-level scan together with its counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub result: ScanResult,
    pub stats: ScanStats,
}
