//! Bounded scratch path reused across one traversal.
//!
//! The walker appends a child name, inspects it, then truncates back to the
//! parent before moving to the next sibling. The backing string is reserved
//! up front (capped at the default budget) so that churn does not
//! reallocate.

use std::path::Path;

use crate::error::{Result, ScanError};
use crate::scan::settings::DEFAULT_MAX_PATH_LEN;

const SEPARATOR: char = '/';

/// Fill point of a [`PathBuffer`], used to revert an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// An append did not fit in the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Bytes the append needed.
    pub needed: usize,
    /// Bytes that were left.
    pub remaining: usize,
}

/// Capacity-checked path string.
///
/// `remaining()` always equals `max_len - len`. Appends that would overflow
/// are rejected and leave the buffer untouched.
#[derive(Debug, Clone)]
pub struct PathBuffer {
    buf: String,
    max_len: usize,
}

impl PathBuffer {
    /// Start a buffer at `root`, adding a trailing separator if missing.
    ///
    /// Fails with [`ScanError::PathTooLong`] when `root` alone uses the whole
    /// budget.
    pub fn new(root: &str, max_len: usize) -> Result<Self> {
        if root.len() >= max_len {
            return Err(ScanError::PathTooLong {
                len: root.len(),
                max: max_len,
            });
        }

        // `max_len` is a limit, not an allocation size.
        let reserve = max_len.min(DEFAULT_MAX_PATH_LEN).max(root.len() + 1);
        let mut buf = String::with_capacity(reserve);
        buf.push_str(root);
        if !buf.is_empty() && !buf.ends_with(SEPARATOR) {
            buf.push(SEPARATOR);
        }

        Ok(Self { buf, max_len })
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Bytes still available before hitting `max_len`.
    pub fn remaining(&self) -> usize {
        self.max_len - self.buf.len()
    }

    /// Current fill point.
    pub fn mark(&self) -> Mark {
        Mark(self.buf.len())
    }

    /// Append `text` verbatim if it fits exactly in the remaining capacity.
    pub fn append(
        &mut self,
        text: &str,
    ) -> std::result::Result<Mark, CapacityExceeded> {
        self.append_reserving(text, 0)
    }

    /// Append a child name, keeping one byte free for a trailing separator
    /// so the child can later be entered as a directory.
    pub fn append_segment(
        &mut self,
        name: &str,
    ) -> std::result::Result<Mark, CapacityExceeded> {
        self.append_reserving(name, 1)
    }

    /// Terminate the current segment with a separator.
    ///
    /// Only called after [`append_segment`](Self::append_segment), whose
    /// reservation guarantees the byte is available.
    pub fn push_separator(&mut self) {
        debug_assert!(self.remaining() >= 1);
        self.buf.push(SEPARATOR);
    }

    /// Revert to an earlier fill point.
    pub fn truncate_to(&mut self, mark: Mark) {
        self.buf.truncate(mark.0);
    }

    fn append_reserving(
        &mut self,
        text: &str,
        reserve: usize,
    ) -> std::result::Result<Mark, CapacityExceeded> {
        let needed = text.len() + reserve;
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CapacityExceeded { needed, remaining });
        }
        let mark = self.mark();
        self.buf.push_str(text);
        Ok(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_appends_separator() {
        let buf = PathBuffer::new("/sdcard", 64).unwrap();
        assert_eq!(buf.as_str(), "/sdcard/");
        assert_eq!(buf.remaining(), 64 - 8);

        let buf = PathBuffer::new("/sdcard/", 64).unwrap();
        assert_eq!(buf.as_str(), "/sdcard/");
    }

    #[test]
    fn test_new_rejects_root_at_limit() {
        let root = "a".repeat(16);
        match PathBuffer::new(&root, 16) {
            Err(ScanError::PathTooLong { len, max }) => {
                assert_eq!(len, 16);
                assert_eq!(max, 16);
            }
            other => panic!("Expected PathTooLong, got {other:?}"),
        }
        assert!(PathBuffer::new(&"a".repeat(15), 16).is_ok());
    }

    #[test]
    fn test_empty_root_stays_empty() {
        let buf = PathBuffer::new("", 8).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.remaining(), 8);
    }

    #[test]
    fn test_append_segment_reserves_separator() {
        // "/a/" leaves 5 bytes: a 4-byte name fits, a 5-byte one does not.
        let mut buf = PathBuffer::new("/a", 8).unwrap();
        assert_eq!(buf.remaining(), 5);

        let err = buf.append_segment("abcde").unwrap_err();
        assert_eq!(err, CapacityExceeded { needed: 6, remaining: 5 });
        assert_eq!(buf.as_str(), "/a/");

        let mark = buf.append_segment("abcd").unwrap();
        buf.push_separator();
        assert_eq!(buf.as_str(), "/a/abcd/");
        assert_eq!(buf.remaining(), 0);

        buf.truncate_to(mark);
        assert_eq!(buf.as_str(), "/a/");
        assert_eq!(buf.remaining(), 5);
    }

    #[test]
    fn test_append_uses_exact_capacity() {
        let mut buf = PathBuffer::new("/a", 8).unwrap();
        assert!(buf.append("abcde").is_ok());
        assert_eq!(buf.remaining(), 0);
        assert!(buf.append("x").is_err());
    }

    #[test]
    fn test_huge_limit_does_not_reserve_it() {
        let mut buf = PathBuffer::new("/music", usize::MAX).unwrap();
        assert_eq!(buf.max_len(), usize::MAX);
        assert_eq!(buf.remaining(), usize::MAX - 7);
        assert!(buf.buf.capacity() <= DEFAULT_MAX_PATH_LEN);

        let long = "x".repeat(DEFAULT_MAX_PATH_LEN * 2);
        buf.append_segment(&long).unwrap();
        assert_eq!(buf.len(), 7 + long.len());
    }

    #[test]
    fn test_sibling_reuse() {
        let mut buf = PathBuffer::new("/music", 64).unwrap();
        let parent = buf.mark();
        for name in ["one.mp3", "two.flac", "three"] {
            buf.append_segment(name).unwrap();
            assert_eq!(buf.as_str(), format!("/music/{name}"));
            assert_eq!(buf.remaining(), buf.max_len() - buf.len());
            buf.truncate_to(parent);
        }
        assert_eq!(buf.as_str(), "/music/");
    }
}
