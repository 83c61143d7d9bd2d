//! Allow-list anchored to monitored storage roots.
//!
//! When active, only the roots themselves and subdirectories whose relative
//! path starts with an allow-listed name are visited. Paths outside every
//! monitored root are left to the deny-list.

use std::borrow::Cow;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::scan::settings::{
    DEFAULT_ALLOW_LIST_PATH, DEFAULT_MONITORED_ROOTS, MAX_ALLOW_LIST_ENTRIES,
};

/// Verdict for a candidate directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowListVerdict {
    /// Allow-list mode is off, or the path is not under a monitored root.
    NotApplicable,
    Allowed,
    Denied,
}

/// Where allow-list entries come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowListSource {
    /// Allow-list mode is off.
    Disabled,
    /// One entry per line; a missing file disables allow-list mode.
    File(PathBuf),
    /// Entries supplied directly by configuration.
    Inline(Vec<String>),
}

impl Default for AllowListSource {
    fn default() -> Self {
        Self::File(PathBuf::from(DEFAULT_ALLOW_LIST_PATH))
    }
}

/// Allow-list policy with a load-once entry cache.
///
/// The source is read on the first [`evaluate`](Self::evaluate) call and the
/// result is kept for the lifetime of the policy. Share one instance (behind
/// an `Arc`) between walkers to read the file at most once per process.
#[derive(Debug)]
pub struct AllowListPolicy {
    source: AllowListSource,
    roots: Vec<String>,
    entries: OnceCell<Option<Vec<String>>>,
}

impl Default for AllowListPolicy {
    fn default() -> Self {
        Self::new(AllowListSource::default())
    }
}

impl AllowListPolicy {
    /// Policy over the default monitored roots.
    pub fn new(source: AllowListSource) -> Self {
        Self::with_roots(source, DEFAULT_MONITORED_ROOTS.iter().copied())
    }

    /// Policy over custom monitored roots, matched case-insensitively.
    pub fn with_roots<I, S>(source: AllowListSource, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source,
            roots: roots
                .into_iter()
                .map(|root| root.as_ref().to_ascii_lowercase())
                .collect(),
            entries: OnceCell::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(AllowListSource::Disabled)
    }

    pub fn source(&self) -> &AllowListSource {
        &self.source
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Cached entries, loading them on first use. `None` when allow-list mode
    /// is off.
    pub fn entries(&self) -> Option<&[String]> {
        self.entries
            .get_or_init(|| self.load())
            .as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.entries().is_some()
    }

    /// Judge `path` against the first monitored root it falls under.
    pub fn evaluate(&self, path: &str) -> AllowListVerdict {
        let Some(entries) = self.entries() else {
            return AllowListVerdict::NotApplicable;
        };

        let lowered = path.to_ascii_lowercase();
        let Some(root) = self
            .roots
            .iter()
            .find(|root| lowered.starts_with(root.as_str()))
        else {
            return AllowListVerdict::NotApplicable;
        };

        if lowered.len() == root.len() {
            return AllowListVerdict::Allowed;
        }

        let relative = &lowered[root.len()..];
        if entries
            .iter()
            .any(|entry| relative.starts_with(entry.as_str()))
        {
            debug!("In allow-list: {}", path);
            AllowListVerdict::Allowed
        } else {
            AllowListVerdict::Denied
        }
    }

    fn load(&self) -> Option<Vec<String>> {
        match &self.source {
            AllowListSource::Disabled => None,
            AllowListSource::Inline(entries) => {
                Some(normalize_entries(entries.iter().map(String::as_str)))
            }
            AllowListSource::File(path) => match read_allow_list(path) {
                Ok(Some(entries)) => {
                    info!(
                        "Found allow-list {}, allow-list mode on ({} entries)",
                        path.display(),
                        entries.len()
                    );
                    for entry in &entries {
                        debug!("allow-list: {}", entry);
                    }
                    Some(entries)
                }
                Ok(None) => {
                    debug!(
                        "Allow-list {} not found, allow-list mode disabled",
                        path.display()
                    );
                    None
                }
                // The file exists, so the mode stays on; with nothing
                // readable only the monitored roots themselves pass.
                Err(err) => {
                    warn!("{}; allow-list mode on with no entries", err);
                    Some(Vec::new())
                }
            },
        }
    }
}

/// Read an allow-list file. `Ok(None)` when the file does not exist.
///
/// Lines are split on `\n` only. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD rather than failing the whole file.
pub fn read_allow_list(
    path: &Path,
) -> Result<Option<Vec<String>>, ScanError> {
    let allow_list_error = |source: io::Error| ScanError::AllowList {
        path: path.to_path_buf(),
        source,
    };

    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(allow_list_error(source)),
    };

    let mut lines = Vec::new();
    for raw in BufReader::new(file).split(b'\n') {
        let raw = raw.map_err(allow_list_error)?;
        let line = String::from_utf8_lossy(&raw);
        if matches!(line, Cow::Owned(_)) {
            debug!("Allow-list {} has a non UTF-8 line", path.display());
        }
        lines.push(line.into_owned());
    }

    Ok(Some(normalize_entries(lines.iter().map(String::as_str))))
}

fn normalize_entries<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut entries = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if entries.len() >= MAX_ALLOW_LIST_ENTRIES {
            warn!(
                "Allow-list too long (>{}), ignoring remaining lines",
                MAX_ALLOW_LIST_ENTRIES
            );
            break;
        }
        entries.push(line.to_ascii_lowercase());
    }
    entries
}
