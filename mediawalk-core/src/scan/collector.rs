use serde::Serialize;

use crate::error::{Result, ScanError};

/// A discovered filesystem entry as handed to a [`ScanCollector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScannedEntry<'a> {
    /// Full path. Directories are reported without a trailing separator.
    pub path: &'a str,
    /// Last modification, seconds since the Unix epoch.
    pub modified: i64,
    /// File size in bytes; always 0 for directories.
    pub size: u64,
    pub is_directory: bool,
    /// Set for entries inside a `.nomedia` subtree or a hidden directory.
    pub no_media: bool,
}

/// Receiver of discovered entries.
///
/// Returning an error from [`scan_file`](Self::scan_file) is the only way to
/// stop a traversal; nothing after the failing entry is reported.
pub trait ScanCollector {
    /// Called once at the start of every top-level scan.
    fn set_locale(&mut self, _locale: Option<&str>) {}

    fn scan_file(&mut self, entry: &ScannedEntry<'_>) -> Result<()>;
}

impl<C: ScanCollector + ?Sized> ScanCollector for &mut C {
    fn set_locale(&mut self, locale: Option<&str>) {
        (**self).set_locale(locale);
    }

    fn scan_file(&mut self, entry: &ScannedEntry<'_>) -> Result<()> {
        (**self).scan_file(entry)
    }
}

/// Owned copy of a [`ScannedEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectedEntry {
    pub path: String,
    pub modified: i64,
    pub size: u64,
    pub is_directory: bool,
    pub no_media: bool,
}

impl From<&ScannedEntry<'_>> for CollectedEntry {
    fn from(entry: &ScannedEntry<'_>) -> Self {
        Self {
            path: entry.path.to_string(),
            modified: entry.modified,
            size: entry.size,
            is_directory: entry.is_directory,
            no_media: entry.no_media,
        }
    }
}

/// Collector that keeps every entry in memory.
///
/// Can be told to fail on the n-th entry, which is how traversal abort is
/// exercised in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingCollector {
    pub locale: Option<String>,
    pub entries: Vec<CollectedEntry>,
    fail_at: Option<usize>,
    calls: usize,
}

impl RecordingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the entry at zero-based position `index`. The rejected entry is
    /// not recorded.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn files(&self) -> impl Iterator<Item = &CollectedEntry> {
        self.entries.iter().filter(|e| !e.is_directory)
    }

    pub fn directories(&self) -> impl Iterator<Item = &CollectedEntry> {
        self.entries.iter().filter(|e| e.is_directory)
    }
}

impl ScanCollector for RecordingCollector {
    fn set_locale(&mut self, locale: Option<&str>) {
        self.locale = locale.map(str::to_owned);
    }

    fn scan_file(&mut self, entry: &ScannedEntry<'_>) -> Result<()> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Err(ScanError::Rejected(entry.path.to_string()));
        }
        self.entries.push(entry.into());
        Ok(())
    }
}
