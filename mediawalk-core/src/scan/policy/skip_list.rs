use tracing::debug;

/// Deny-list of exact directory paths.
///
/// Entries come from a single comma-separated configuration value. A path is
/// deny-listed only when it equals an entry byte for byte; entries are not
/// patterns and do not cover their subdirectories by prefix.
#[derive(Debug, Clone, Default)]
pub struct SkipListPolicy {
    entries: Vec<String>,
}

impl SkipListPolicy {
    /// A policy that never skips anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Parse a raw comma-separated list. `None` or an empty string disables
    /// the policy.
    pub fn from_config(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return Self::disabled();
        };

        let entries: Vec<String> = raw
            .split(',')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        debug!("Loaded {} skip-list entries", entries.len());
        Self { entries }
    }

    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether `path` exactly matches a deny-listed entry.
    pub fn is_skipped(&self, path: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.len() == path.len() && entry == path)
    }
}
