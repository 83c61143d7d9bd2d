//! # mediawalk core
//!
//! Recursive filesystem walker for media discovery. Every file and directory
//! under a root is reported to a [`ScanCollector`], subject to:
//!
//! - **Allow-list**: when an allow-list file exists, only listed
//!   subdirectories of the monitored storage roots are visited.
//! - **Deny-list**: exact directory paths that are never visited.
//! - **Control files**: `.noscanandnomtp` hides a whole subtree and
//!   `.nomedia` flags everything beneath it as non-media.
//!
//! Traversal is single-threaded and depth-first. A directory is reported
//! before its contents, and a collector error aborts the rest of the walk.
//!
//! ## Examples
//!
//! ```no_run
//! use mediawalk_core::{
//!     DirectoryPolicy, MediaScanner, RecordingCollector, ScanResult,
//! };
//!
//! let scanner = MediaScanner::new(DirectoryPolicy::default());
//! let mut collector = RecordingCollector::new();
//! let result = scanner.process_directory(
//!     "/storage/emulated/0",
//!     Some("en_US"),
//!     &mut collector,
//! );
//! assert_ne!(result, ScanResult::Error);
//! for entry in collector.files() {
//!     println!("{} ({} bytes, no_media={})", entry.path, entry.size,
//!         entry.no_media);
//! }
//! ```

pub mod error;
pub mod scan;

pub use error::{Result, ScanError};
pub use scan::{
    AllowListPolicy, AllowListSource, AllowListVerdict, CollectedEntry,
    DirectoryPolicy, FileSystem, InMemoryFs, MediaScanner, PathBuffer, RealFs,
    RecordingCollector, ScanCollector, ScanReport, ScanResult, ScanStats,
    ScannedEntry, SkipListPolicy,
};
