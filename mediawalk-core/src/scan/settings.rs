//! Shared scanner defaults that align with configuration knobs.
//!
//! Keeping the reserved names and limits in one place lets the config crate
//! expose overrides without diverging from the walker's rules.

/// Longest path the walker will build, in bytes.
pub const DEFAULT_MAX_PATH_LEN: usize = 4096;

/// Presence of this file skips the containing directory and everything below.
pub const NO_SCAN_MARKER: &str = ".noscanandnomtp";

/// Presence of this file flags the containing subtree as non-media.
pub const NO_MEDIA_MARKER: &str = ".nomedia";

/// Canonical external-storage mount points the allow-list is anchored to.
pub const DEFAULT_MONITORED_ROOTS: &[&str] =
    &["/storage/emulated/0/", "/storage/sdcard0/"];

/// Well-known allow-list location; its absence disables allow-list mode.
pub const DEFAULT_ALLOW_LIST_PATH: &str = "/sdcard/.mediascanner_whitelist";

/// Lines beyond this count in the allow-list file are ignored.
pub const MAX_ALLOW_LIST_ENTRIES: usize = 100;

/// Convenience helper for consumers that work with owned strings (e.g. config
/// deserialisation layers).
pub fn default_monitored_roots_vec() -> Vec<String> {
    DEFAULT_MONITORED_ROOTS
        .iter()
        .map(|root| root.to_string())
        .collect()
}
