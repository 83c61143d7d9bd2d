//! Scan domain modules.
//!
//! The walker sits on top of the path buffer, the directory policies, and the
//! filesystem abstraction. Downstream crates import from this namespace
//! directly.

pub mod collector;
pub mod fs;
pub mod path_buffer;
pub mod policy;
pub mod result;
pub mod settings;
pub mod walker;

// Re-export key surfaces so downstream code can write `crate::scan::*`.
pub use collector::{
    CollectedEntry, RecordingCollector, ScanCollector, ScannedEntry,
};
pub use fs::{
    DirEntryInfo, EntryKind, FileSystem, FsMetadata, InMemoryFs, RealFs,
};
pub use path_buffer::{CapacityExceeded, Mark, PathBuffer};
pub use policy::{
    AllowListPolicy, AllowListSource, AllowListVerdict, DirectoryPolicy,
    SkipListPolicy,
};
pub use result::{ScanReport, ScanResult, ScanStats};
pub use walker::MediaScanner;
