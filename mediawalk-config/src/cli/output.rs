use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use mediawalk_core::{ScanCollector, ScanError, ScannedEntry};
use serde::Serialize;

/// How discovered entries are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One aligned line per entry.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
struct EntryRecord<'a> {
    path: &'a str,
    kind: &'static str,
    size: u64,
    modified: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_at: Option<String>,
    no_media: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<&'a str>,
}

/// Collector that streams entries to a writer.
///
/// A failed write is reported as a collector failure, so a closed pipe stops
/// the scan instead of walking the rest of the tree for nobody.
#[derive(Debug)]
pub struct WriterCollector<W: Write> {
    out: W,
    format: OutputFormat,
    locale: Option<String>,
    written: u64,
}

impl<W: Write> WriterCollector<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            locale: None,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_entry(&mut self, entry: &ScannedEntry<'_>) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let kind = if entry.is_directory { 'd' } else { 'f' };
                let flag = if entry.no_media { "nomedia" } else { "-" };
                writeln!(
                    self.out,
                    "{kind} {:>12} {:<25} {:<7} {}",
                    entry.size,
                    format_mtime(entry.modified)
                        .unwrap_or_else(|| entry.modified.to_string()),
                    flag,
                    entry.path
                )
            }
            OutputFormat::Json => {
                let record = EntryRecord {
                    path: entry.path,
                    kind: if entry.is_directory { "directory" } else { "file" },
                    size: entry.size,
                    modified: entry.modified,
                    modified_at: format_mtime(entry.modified),
                    no_media: entry.no_media,
                    locale: self.locale.as_deref(),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                self.out.write_all(b"\n")
            }
        }
    }
}

impl<W: Write> ScanCollector for WriterCollector<W> {
    fn set_locale(&mut self, locale: Option<&str>) {
        self.locale = locale.map(str::to_owned);
    }

    fn scan_file(&mut self, entry: &ScannedEntry<'_>) -> Result<(), ScanError> {
        self.write_entry(entry)?;
        self.written += 1;
        Ok(())
    }
}

fn format_mtime(seconds: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn entry(
        path: &str,
        is_directory: bool,
        no_media: bool,
    ) -> ScannedEntry<'_> {
        ScannedEntry {
            path,
            modified: 1_700_000_000,
            size: if is_directory { 0 } else { 2048 },
            is_directory,
            no_media,
        }
    }

    #[test]
    fn test_text_output() {
        let mut collector =
            WriterCollector::new(Vec::new(), OutputFormat::Text);
        collector.scan_file(&entry("/sdcard/Music", true, false)).unwrap();
        collector
            .scan_file(&entry("/sdcard/Music/a.mp3", false, true))
            .unwrap();
        assert_eq!(collector.written(), 2);

        let text = String::from_utf8(collector.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("d "));
        assert!(lines[0].contains("2023-11-14T22:13:20Z"));
        assert!(lines[0].ends_with("/sdcard/Music"));
        assert!(!lines[0].contains("nomedia"));
        assert!(lines[1].starts_with("f "));
        assert!(lines[1].contains("2048"));
        assert!(lines[1].contains("nomedia"));
        assert!(lines[1].ends_with("/sdcard/Music/a.mp3"));
    }

    #[test]
    fn test_json_output_carries_locale() {
        let mut collector =
            WriterCollector::new(Vec::new(), OutputFormat::Json);
        collector.set_locale(Some("ja_JP"));
        collector
            .scan_file(&entry("/sdcard/Music/a.mp3", false, false))
            .unwrap();

        let text = String::from_utf8(collector.into_inner()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["path"], "/sdcard/Music/a.mp3");
        assert_eq!(value["kind"], "file");
        assert_eq!(value["size"], 2048);
        assert_eq!(value["modified"], 1_700_000_000);
        assert_eq!(value["modified_at"], "2023-11-14T22:13:20Z");
        assert_eq!(value["no_media"], false);
        assert_eq!(value["locale"], "ja_JP");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_collector_failure() {
        let mut collector =
            WriterCollector::new(ClosedPipe, OutputFormat::Text);
        let err = collector
            .scan_file(&entry("/sdcard/a.mp3", false, false))
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::Io(ref source)
                if source.kind() == io::ErrorKind::BrokenPipe
        ));
        assert_eq!(collector.written(), 0);
    }
}
