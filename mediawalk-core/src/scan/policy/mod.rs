//! Directory filtering policies.
//!
//! The allow-list is consulted first; only a not-applicable verdict falls
//! through to the deny-list.

pub mod allow_list;
pub mod skip_list;

use std::sync::Arc;

pub use allow_list::{AllowListPolicy, AllowListSource, AllowListVerdict};
pub use skip_list::SkipListPolicy;

/// Both directory policies, evaluated together.
#[derive(Debug, Clone)]
pub struct DirectoryPolicy {
    allow_list: Arc<AllowListPolicy>,
    skip_list: SkipListPolicy,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self::new(
            Arc::new(AllowListPolicy::default()),
            SkipListPolicy::disabled(),
        )
    }
}

impl DirectoryPolicy {
    pub fn new(
        allow_list: Arc<AllowListPolicy>,
        skip_list: SkipListPolicy,
    ) -> Self {
        Self {
            allow_list,
            skip_list,
        }
    }

    /// No filtering at all.
    pub fn permissive() -> Self {
        Self::new(
            Arc::new(AllowListPolicy::disabled()),
            SkipListPolicy::disabled(),
        )
    }

    pub fn allow_list(&self) -> &Arc<AllowListPolicy> {
        &self.allow_list
    }

    pub fn skip_list(&self) -> &SkipListPolicy {
        &self.skip_list
    }

    /// Whether the directory at `path` (with trailing separator) should be
    /// left out of the scan together with everything beneath it.
    pub fn should_skip_directory(&self, path: &str) -> bool {
        match self.allow_list.evaluate(path) {
            AllowListVerdict::Allowed => false,
            AllowListVerdict::Denied => true,
            AllowListVerdict::NotApplicable => self.skip_list.is_skipped(path),
        }
    }
}
