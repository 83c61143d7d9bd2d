//! Configuration and command-line front end for mediawalk.
//!
//! Scanner settings are loaded from a TOML/JSON file or the environment,
//! validated, and turned into a ready [`mediawalk_core::MediaScanner`]. The
//! `mediawalk` binary wires this to stdout via [`cli::run`].

pub mod cli;
pub mod error;
pub mod models;

pub use cli::{OutputFormat, ScanArgs, WriterCollector};
pub use error::ConfigError;
pub use models::scanner::{ScannerConfig, ScannerConfigSource};
