//! Recursive media discovery walk.
//!
//! Each directory visit goes through the same steps: policy evaluation,
//! control-file probes, then enumeration. Children are reported to the
//! collector as they are found, directories before their contents. One
//! collector failure stops the whole traversal.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::scan::collector::{ScanCollector, ScannedEntry};
use crate::scan::fs::{DirEntryInfo, EntryKind, FileSystem, RealFs};
use crate::scan::path_buffer::PathBuffer;
use crate::scan::policy::DirectoryPolicy;
use crate::scan::result::{ScanReport, ScanResult, ScanStats};
use crate::scan::settings::{
    DEFAULT_MAX_PATH_LEN, NO_MEDIA_MARKER, NO_SCAN_MARKER,
};

/// Depth-first media scanner.
#[derive(Debug, Clone)]
pub struct MediaScanner<F: FileSystem = RealFs> {
    fs: F,
    policy: DirectoryPolicy,
    max_path_len: usize,
}

impl Default for MediaScanner<RealFs> {
    fn default() -> Self {
        Self::new(DirectoryPolicy::default())
    }
}

impl MediaScanner<RealFs> {
    pub fn new(policy: DirectoryPolicy) -> Self {
        Self::with_filesystem(RealFs::new(), policy)
    }
}

/// State owned by one top-level traversal.
struct Walk<'c> {
    path: PathBuffer,
    collector: &'c mut dyn ScanCollector,
    stats: ScanStats,
}

impl<F: FileSystem> MediaScanner<F> {
    pub fn with_filesystem(fs: F, policy: DirectoryPolicy) -> Self {
        Self {
            fs,
            policy,
            max_path_len: DEFAULT_MAX_PATH_LEN,
        }
    }

    /// Set the longest path the walker will build.
    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    pub fn policy(&self) -> &DirectoryPolicy {
        &self.policy
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Walk `root`, reporting every discovered entry to `collector`.
    pub fn process_directory(
        &self,
        root: &str,
        locale: Option<&str>,
        collector: &mut dyn ScanCollector,
    ) -> ScanResult {
        self.scan(root, locale, collector).result
    }

    /// Like [`process_directory`](Self::process_directory), also returning
    /// the traversal counters.
    pub fn scan(
        &self,
        root: &str,
        locale: Option<&str>,
        collector: &mut dyn ScanCollector,
    ) -> ScanReport {
        let path = match PathBuffer::new(root, self.max_path_len) {
            Ok(path) => path,
            Err(err) => {
                warn!("Not scanning {}: {}", root, err);
                return ScanReport {
                    result: ScanResult::Skipped,
                    stats: ScanStats::default(),
                };
            }
        };

        info!("Starting media scan of: {}", path.as_str());
        collector.set_locale(locale);

        let mut walk = Walk {
            path,
            collector,
            stats: ScanStats::default(),
        };
        let result = self.walk_directory(&mut walk, false);

        let stats = walk.stats;
        info!(
            "Scan complete ({:?}): {} directories, {} files, {} policy \
             skipped, {} marker skipped, {} unreadable, {} ignored",
            result,
            stats.directories,
            stats.files,
            stats.policy_skipped,
            stats.marker_skipped,
            stats.unreadable,
            stats.ignored
        );

        ScanReport { result, stats }
    }

    /// Visit the directory currently held in `walk.path`, which ends with a
    /// separator.
    fn walk_directory(
        &self,
        walk: &mut Walk<'_>,
        no_media: bool,
    ) -> ScanResult {
        if self.policy.should_skip_directory(walk.path.as_str()) {
            debug!("Skipping: {}", walk.path.as_str());
            walk.stats.policy_skipped += 1;
            return ScanResult::Ok;
        }

        if self.has_marker(&mut walk.path, NO_SCAN_MARKER) {
            debug!(
                "Found {} in {}, completely skipping",
                NO_SCAN_MARKER,
                walk.path.as_str()
            );
            walk.stats.marker_skipped += 1;
            return ScanResult::Skipped;
        }

        let mut no_media = no_media;
        if self.has_marker(&mut walk.path, NO_MEDIA_MARKER) {
            debug!(
                "Found {} in {}, setting no-media flag",
                NO_MEDIA_MARKER,
                walk.path.as_str()
            );
            no_media = true;
        }

        let entries = match self.fs.read_dir(walk.path.as_path()) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "Error opening directory '{}', skipping: {}",
                    walk.path.as_str(),
                    err
                );
                walk.stats.unreadable += 1;
                return ScanResult::Skipped;
            }
        };

        let parent = walk.path.mark();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(
                        "Error reading entry in '{}': {}",
                        walk.path.as_str(),
                        err
                    );
                    walk.stats.ignored += 1;
                    continue;
                }
            };

            let result = self.walk_entry(walk, &entry, no_media);
            walk.path.truncate_to(parent);
            if result.is_error() {
                return ScanResult::Error;
            }
        }

        ScanResult::Ok
    }

    fn walk_entry(
        &self,
        walk: &mut Walk<'_>,
        entry: &DirEntryInfo,
        no_media: bool,
    ) -> ScanResult {
        let name = entry.name.as_str();
        if name == "." || name == ".." {
            return ScanResult::Skipped;
        }

        if let Err(exceeded) = walk.path.append_segment(name) {
            debug!(
                "Path too long, skipping {}{} (needs {}, {} left)",
                walk.path.as_str(),
                name,
                exceeded.needed,
                exceeded.remaining
            );
            walk.stats.ignored += 1;
            return ScanResult::Skipped;
        }

        let Some(kind) = self.resolve_kind(walk.path.as_path(), entry.kind)
        else {
            walk.stats.ignored += 1;
            return ScanResult::Skipped;
        };

        match kind {
            EntryKind::Directory => {
                // Hidden directories (e.g. ".Trashes") are never media.
                let child_no_media = no_media || name.starts_with('.');

                match self.fs.metadata(walk.path.as_path()) {
                    Ok(md) => {
                        let entry = ScannedEntry {
                            path: walk.path.as_str(),
                            modified: md.modified,
                            size: 0,
                            is_directory: true,
                            no_media: child_no_media,
                        };
                        if let Err(err) = walk.collector.scan_file(&entry) {
                            return collector_failed(entry.path, &err);
                        }
                        walk.stats.directories += 1;
                    }
                    Err(err) => {
                        debug!(
                            "stat() failed for {}: {}",
                            walk.path.as_str(),
                            err
                        );
                    }
                }

                walk.path.push_separator();
                if self.walk_directory(walk, child_no_media).is_error() {
                    return ScanResult::Error;
                }
            }
            EntryKind::File if name == NO_MEDIA_MARKER => {}
            EntryKind::File => match self.fs.metadata(walk.path.as_path()) {
                Ok(md) => {
                    let entry = ScannedEntry {
                        path: walk.path.as_str(),
                        modified: md.modified,
                        size: md.len,
                        is_directory: false,
                        no_media,
                    };
                    if let Err(err) = walk.collector.scan_file(&entry) {
                        return collector_failed(entry.path, &err);
                    }
                    walk.stats.files += 1;
                }
                Err(err) => {
                    debug!("stat() failed for {}: {}", walk.path.as_str(), err);
                    walk.stats.ignored += 1;
                }
            },
            EntryKind::Other => {}
        }

        ScanResult::Ok
    }

    /// Prefer the listing's kind hint; fall back to a status query. `None`
    /// when the kind cannot be determined.
    fn resolve_kind(
        &self,
        path: &Path,
        hint: Option<EntryKind>,
    ) -> Option<EntryKind> {
        if let Some(kind) = hint {
            return Some(kind);
        }
        match self.fs.metadata(path) {
            Ok(md) => Some(md.kind),
            Err(err) => {
                debug!("stat() failed for {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Probe for a control file inside the directory held in `path`.
    ///
    /// A marker name that does not fit in the remaining budget is treated as
    /// absent.
    fn has_marker(&self, path: &mut PathBuffer, marker: &str) -> bool {
        let Ok(mark) = path.append(marker) else {
            return false;
        };
        let found = self.fs.exists(path.as_path());
        path.truncate_to(mark);
        found
    }
}

fn collector_failed(path: &str, err: &ScanError) -> ScanResult {
    warn!("Collector failed on {}, aborting scan: {}", path, err);
    ScanResult::Error
}
