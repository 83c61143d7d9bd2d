use anyhow::{Context, anyhow};
use mediawalk_core::scan::settings::{
    DEFAULT_ALLOW_LIST_PATH, DEFAULT_MAX_PATH_LEN, default_monitored_roots_vec,
};
use mediawalk_core::{
    AllowListPolicy, AllowListSource, DirectoryPolicy, MediaScanner,
    SkipListPolicy,
};
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::ConfigError;

/// Environment variable carrying the comma-separated deny-list.
pub const SKIP_LIST_ENV: &str = "MEDIAWALK_SKIPLIST";
/// Environment variable pointing at a TOML or JSON config file.
pub const CONFIG_PATH_ENV: &str = "MEDIAWALK_CONFIG_PATH";
/// Environment variable carrying inline JSON config.
pub const CONFIG_JSON_ENV: &str = "MEDIAWALK_CONFIG_JSON";

fn default_allow_list_path() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_ALLOW_LIST_PATH))
}

/// Source that produced the scanner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScannerConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Scanner settings. Everything the walker needs from the outside world:
/// which directories to leave out, where the allow-list lives, and how long
/// paths may grow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Comma-separated list of exact directory paths (with trailing `/`) that
    /// are never scanned. Overridden by `$MEDIAWALK_SKIPLIST` when set.
    pub skip_list: Option<String>,
    /// Allow-list file, one relative directory name per line. The file being
    /// absent disables allow-list mode; an empty string or `null` disables it
    /// outright.
    #[serde(default = "default_allow_list_path")]
    pub allow_list_path: Option<PathBuf>,
    /// Inline allow-list entries. Takes precedence over `allow_list_path`.
    pub allow_list: Option<Vec<String>>,
    /// Storage roots the allow-list is anchored to. Each must be absolute and
    /// end with `/`.
    pub monitored_roots: Vec<String>,
    /// Longest path, in bytes, the walker will build.
    pub max_path_len: usize,
    /// Locale tag handed to the collector at the start of each scan.
    pub locale: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            skip_list: None,
            allow_list_path: default_allow_list_path(),
            allow_list: None,
            monitored_roots: default_monitored_roots_vec(),
            max_path_len: DEFAULT_MAX_PATH_LEN,
            locale: None,
        }
    }
}

impl ScannerConfigSource {
    /// Decide where configuration comes from. An explicit path wins, then
    /// `$MEDIAWALK_CONFIG_PATH`, `$MEDIAWALK_CONFIG_JSON`, and finally the
    /// first `mediawalk.{toml,json}` in the working directory or `config/`.
    pub fn locate(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::File(path.to_path_buf());
        }
        if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
            return Self::EnvPath(PathBuf::from(path));
        }
        if non_empty_env(CONFIG_JSON_ENV).is_some() {
            return Self::EnvInline;
        }

        const SEARCH_DIRS: &[&str] = &[".", "config"];
        const FILE_NAMES: &[&str] = &["mediawalk.toml", "mediawalk.json"];
        SEARCH_DIRS
            .iter()
            .flat_map(|dir| {
                FILE_NAMES.iter().map(move |name| Path::new(dir).join(name))
            })
            .find(|path| path.is_file())
            .map_or(Self::Default, Self::File)
    }
}

impl fmt::Display for ScannerConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("built-in defaults"),
            Self::EnvPath(path) => {
                write!(f, "{} (${CONFIG_PATH_ENV})", path.display())
            }
            Self::EnvInline => write!(f, "${CONFIG_JSON_ENV}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl ScannerConfig {
    /// Validated configuration from the environment, as located by
    /// [`ScannerConfigSource::locate`] with no explicit path.
    pub fn load_from_env() -> anyhow::Result<(Self, ScannerConfigSource)> {
        let (config, source) = Self::load(None)?;
        config
            .validate()
            .with_context(|| format!("invalid scanner config from {source}"))?;
        Ok((config, source))
    }

    /// Load from the located source and apply `$MEDIAWALK_SKIPLIST` on top.
    /// The result is not validated so callers can layer further overrides
    /// first.
    pub fn load(
        explicit: Option<&Path>,
    ) -> anyhow::Result<(Self, ScannerConfigSource)> {
        let source = ScannerConfigSource::locate(explicit);
        let mut config = match &source {
            ScannerConfigSource::Default => Self::default(),
            ScannerConfigSource::EnvInline => {
                let raw = env::var(CONFIG_JSON_ENV).unwrap_or_default();
                Self::parse_json(&raw)
                    .with_context(|| format!("failed to parse {source}"))?
            }
            ScannerConfigSource::EnvPath(path)
            | ScannerConfigSource::File(path) => Self::load_from_file(path)?,
        };
        config.apply_skip_list_override(env::var(SKIP_LIST_ENV).ok());
        Ok((config, source))
    }

    /// Parse a config file, choosing the format by extension. Unknown
    /// extensions are tried as TOML, then JSON.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read scanner config from {}", path.display())
        })?;

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents),
            Some("toml") => Self::parse_toml(&contents),
            _ => Self::parse_from_str(&contents),
        };
        parsed.with_context(|| {
            format!("invalid scanner config {}", path.display())
        })
    }

    pub fn parse_from_str(contents: &str) -> anyhow::Result<Self> {
        Self::parse_toml(contents).or_else(|toml_err| {
            Self::parse_json(contents).map_err(|json_err| {
                anyhow!("not TOML ({toml_err}) nor JSON ({json_err})")
            })
        })
    }

    pub fn parse_toml(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).map_err(|err| anyhow!("toml: {err}"))
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|err| anyhow!("json: {err}"))
    }

    /// Replace the deny-list when an override is present. An empty override
    /// clears it.
    pub fn apply_skip_list_override(&mut self, value: Option<String>) {
        if let Some(value) = value {
            self.skip_list = Some(value).filter(|raw| !raw.is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_path_len == 0 {
            return Err(ConfigError::ZeroMaxPathLen);
        }
        for root in &self.monitored_roots {
            if !root.starts_with('/') {
                return Err(ConfigError::RelativeRoot(root.clone()));
            }
            if !root.ends_with('/') {
                return Err(ConfigError::UnterminatedRoot(root.clone()));
            }
        }
        Ok(())
    }

    pub fn allow_list_source(&self) -> AllowListSource {
        if let Some(entries) = &self.allow_list {
            return AllowListSource::Inline(entries.clone());
        }
        match &self.allow_list_path {
            Some(path) if !path.as_os_str().is_empty() => {
                AllowListSource::File(path.clone())
            }
            _ => AllowListSource::Disabled,
        }
    }

    pub fn allow_list_policy(&self) -> AllowListPolicy {
        AllowListPolicy::with_roots(
            self.allow_list_source(),
            &self.monitored_roots,
        )
    }

    pub fn skip_list_policy(&self) -> SkipListPolicy {
        SkipListPolicy::from_config(self.skip_list.as_deref())
    }

    pub fn directory_policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::new(
            Arc::new(self.allow_list_policy()),
            self.skip_list_policy(),
        )
    }

    /// Walker over the real filesystem using these settings.
    pub fn build_scanner(&self) -> MediaScanner {
        MediaScanner::new(self.directory_policy())
            .with_max_path_len(self.max_path_len)
    }
}
