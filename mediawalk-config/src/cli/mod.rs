//! Command-line front end: argument parsing, config resolution and the scan
//! run itself. The `mediawalk` binary is a thin wrapper around [`run`].

pub mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mediawalk_core::{ScanReport, ScanResult};
use tracing::info;

use crate::models::ScannerConfig;
pub use output::{OutputFormat, WriterCollector};

#[derive(Debug, Parser)]
#[command(
    name = "mediawalk",
    about = "Walk a directory tree and list media files and directories"
)]
pub struct ScanArgs {
    /// Directory to scan
    pub root: String,

    /// Scanner config file (TOML or JSON); overrides environment lookup
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Locale tag handed to the collector
    #[arg(long)]
    pub locale: Option<String>,

    /// Comma-separated exact directory paths to leave out
    #[arg(long)]
    pub skip_list: Option<String>,

    /// Allow-list file, one relative directory name per line
    #[arg(long, conflicts_with = "no_allow_list")]
    pub allow_list: Option<PathBuf>,

    /// Ignore any allow-list file
    #[arg(long)]
    pub no_allow_list: bool,

    /// Longest path the walker will build
    #[arg(long)]
    pub max_path_len: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print scan counters to stderr when done
    #[arg(long)]
    pub summary: bool,
}

impl ScanArgs {
    /// Resolve configuration from `--config` or the environment, then apply
    /// command-line overrides on top.
    pub fn resolve_config(&self) -> anyhow::Result<ScannerConfig> {
        let (mut config, source) =
            ScannerConfig::load(self.config.as_deref())?;
        info!("Scanner config source: {}", source);

        if let Some(skip_list) = &self.skip_list {
            config.apply_skip_list_override(Some(skip_list.clone()));
        }
        if let Some(path) = &self.allow_list {
            config.allow_list = None;
            config.allow_list_path = Some(path.clone());
        }
        if self.no_allow_list {
            config.allow_list = None;
            config.allow_list_path = None;
        }
        if let Some(max_path_len) = self.max_path_len {
            config.max_path_len = max_path_len;
        }
        if let Some(locale) = &self.locale {
            config.locale = Some(locale.clone());
        }

        config.validate().context("invalid scanner configuration")?;
        Ok(config)
    }
}

/// Scan `args.root`, streaming entries to `out`.
pub fn run<W: Write>(args: &ScanArgs, out: W) -> anyhow::Result<ScanReport> {
    let config = args.resolve_config()?;
    let scanner = config.build_scanner();

    let mut collector = WriterCollector::new(out, args.format);
    let report =
        scanner.scan(&args.root, config.locale.as_deref(), &mut collector);
    collector
        .into_inner()
        .flush()
        .context("failed to flush scan output")?;

    if args.summary {
        let summary = serde_json::to_string(&report)?;
        writeln!(io::stderr(), "{summary}")?;
    }

    Ok(report)
}

/// Process exit status for a scan result.
pub fn exit_code(result: ScanResult) -> ExitCode {
    match result {
        ScanResult::Ok => ExitCode::SUCCESS,
        ScanResult::Error => ExitCode::from(1),
        ScanResult::Skipped => ExitCode::from(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(extra: &[&str]) -> ScanArgs {
        let mut argv = vec!["mediawalk"];
        argv.extend_from_slice(extra);
        ScanArgs::parse_from(argv)
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("scan.toml");
        fs::write(
            &config_path,
            "skip_list = \"/a/\"\nlocale = \"en_GB\"\nmax_path_len = 100\n",
        )
        .unwrap();
        let config_arg = config_path.to_str().unwrap();

        let config = args(&["/root", "--config", config_arg])
            .resolve_config()
            .unwrap();
        assert_eq!(config.locale.as_deref(), Some("en_GB"));
        assert_eq!(config.max_path_len, 100);

        let config = args(&[
            "/root",
            "--config",
            config_arg,
            "--skip-list",
            "/b/",
            "--locale",
            "sv_SE",
            "--no-allow-list",
            "--max-path-len",
            "300",
        ])
        .resolve_config()
        .unwrap();
        assert_eq!(config.skip_list.as_deref(), Some("/b/"));
        assert_eq!(config.locale.as_deref(), Some("sv_SE"));
        assert_eq!(config.allow_list_path, None);
        assert_eq!(config.max_path_len, 300);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("scan.json");
        fs::write(&config_path, "{}").unwrap();

        let err = args(&[
            "/root",
            "--config",
            config_path.to_str().unwrap(),
            "--max-path-len",
            "0",
        ])
        .resolve_config()
        .unwrap_err();
        assert!(format!("{err:#}").contains("max_path_len"));
    }

    #[test]
    fn test_allow_list_flags_conflict() {
        let parsed = ScanArgs::try_parse_from([
            "mediawalk",
            "/root",
            "--allow-list",
            "/tmp/list",
            "--no-allow-list",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_writes_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Music")).unwrap();
        fs::write(dir.path().join("Music").join("a.mp3"), b"abc").unwrap();
        let config_path = dir.path().join("scan.json");
        fs::write(&config_path, r#"{"allow_list_path": null}"#).unwrap();

        let root = dir.path().join("Music");
        let parsed = args(&[
            root.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "--format",
            "json",
        ]);

        let mut out = Vec::new();
        let report = run(&parsed, &mut out).unwrap();
        assert_eq!(report.result, ScanResult::Ok);
        assert_eq!(report.stats.files, 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("/Music/a.mp3\""));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(ScanResult::Ok), ExitCode::SUCCESS);
        assert_eq!(exit_code(ScanResult::Error), ExitCode::from(1));
        assert_eq!(exit_code(ScanResult::Skipped), ExitCode::from(2));
    }
}
