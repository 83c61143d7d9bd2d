use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Kind of a filesystem entry as far as the walker cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, devices and anything else the walker ignores.
    Other,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    /// Kind reported by the listing itself, when the platform provides it
    /// cheaply. `None` means the walker has to query status.
    pub kind: Option<EntryKind>,
}

/// Lightweight metadata needed by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsMetadata {
    pub kind: EntryKind,
    pub len: u64,
    /// Last modification, seconds since the Unix epoch.
    pub modified: i64,
}

/// Iterator over a directory's entries.
pub type ReadDirIter<'a> =
    Box<dyn Iterator<Item = io::Result<DirEntryInfo>> + 'a>;

/// Minimal synchronous filesystem abstraction used by the walker.
pub trait FileSystem {
    /// Check whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Open a directory for iteration.
    fn read_dir(&self, path: &Path) -> io::Result<ReadDirIter<'_>>;

    /// Status query, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<FsMetadata>;
}

/// Real filesystem implementation backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn exists(&self, path: &Path) -> bool {
        // try_exists avoids errors for permission issues by returning false
        path.try_exists().unwrap_or(false)
    }

    fn read_dir(&self, path: &Path) -> io::Result<ReadDirIter<'_>> {
        let rd = fs::read_dir(path)?;
        Ok(Box::new(rd.filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            match entry.file_name().into_string() {
                Ok(name) => Some(Ok(DirEntryInfo {
                    name,
                    kind: entry.file_type().ok().map(|ft| kind_of(&ft)),
                })),
                Err(raw) => {
                    debug!("Ignoring non UTF-8 entry name {:?}", raw);
                    None
                }
            }
        })))
    }

    fn metadata(&self, path: &Path) -> io::Result<FsMetadata> {
        let md = fs::metadata(path)?;
        Ok(FsMetadata {
            kind: kind_of(&md.file_type()),
            len: md.len(),
            modified: md.modified().map(unix_seconds).unwrap_or(0),
        })
    }
}

fn kind_of(ft: &fs::FileType) -> EntryKind {
    if ft.is_dir() {
        EntryKind::Directory
    } else if ft.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// In-memory filesystem for tests.
///
/// Directory listings come back in insertion order, which makes traversal
/// order deterministic. Paths are treated literally; callers should use
/// absolute paths without trailing separators when building the tree.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFs {
    nodes: HashMap<PathBuf, Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Dir {
        children: Vec<String>,
        modified: i64,
        hint: bool,
    },
    File {
        len: u64,
        modified: i64,
        hint: bool,
    },
    Other,
    Unreadable,
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn add_dir<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        let path = path.into();
        if !self.nodes.contains_key(&path) {
            self.ensure_parent_link(&path);
            self.nodes.insert(
                path,
                Node::Dir {
                    children: Vec::new(),
                    modified: 0,
                    hint: true,
                },
            );
        }
        self
    }

    pub fn add_file<P: Into<PathBuf>>(
        &mut self,
        path: P,
        len: u64,
    ) -> &mut Self {
        self.add_file_with_mtime(path, len, 0)
    }

    pub fn add_file_with_mtime<P: Into<PathBuf>>(
        &mut self,
        path: P,
        len: u64,
        modified: i64,
    ) -> &mut Self {
        let path = path.into();
        self.ensure_parent_link(&path);
        self.nodes.insert(
            path,
            Node::File {
                len,
                modified,
                hint: true,
            },
        );
        self
    }

    /// Add an entry that is neither a file nor a directory (e.g. a symlink).
    pub fn add_other<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        let path = path.into();
        self.ensure_parent_link(&path);
        self.nodes.insert(path, Node::Other);
        self
    }

    /// Add a directory whose listing fails, as if permission were denied.
    pub fn add_unreadable_dir<P: Into<PathBuf>>(
        &mut self,
        path: P,
    ) -> &mut Self {
        let path = path.into();
        self.ensure_parent_link(&path);
        self.nodes.insert(path, Node::Unreadable);
        self
    }

    /// Make listings of `path`'s parent report an unknown kind for `path`,
    /// forcing the walker through the status query fallback.
    pub fn hide_kind<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        match self.nodes.get_mut(path.as_ref()) {
            Some(Node::Dir { hint, .. }) | Some(Node::File { hint, .. }) => {
                *hint = false;
            }
            _ => {}
        }
        self
    }

    /// Add a child name that appears in listings but has no node, so its
    /// status query fails.
    pub fn add_dangling<P: AsRef<Path>>(
        &mut self,
        dir: P,
        name: &str,
    ) -> &mut Self {
        let dir = dir.as_ref().to_path_buf();
        self.add_dir(dir.clone());
        if let Some(Node::Dir { children, .. }) = self.nodes.get_mut(&dir) {
            children.push(name.to_string());
        }
        self
    }

    fn ensure_parent_link(&mut self, path: &Path) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        else {
            return;
        };
        // Ensure parent directory exists
        if !self.nodes.contains_key(parent) {
            self.nodes.insert(
                parent.to_path_buf(),
                Node::Dir {
                    children: Vec::new(),
                    modified: 0,
                    hint: true,
                },
            );
            self.ensure_parent_link(parent);
        }
        // Link child into parent
        let name = name.to_string_lossy().into_owned();
        if let Some(Node::Dir { children, .. }) = self.nodes.get_mut(parent)
            && !children.contains(&name)
        {
            children.push(name);
        }
    }

    fn node(&self, path: &Path) -> Option<&Node> {
        // The walker hands out directory paths with a trailing separator.
        let trimmed = path
            .to_str()
            .and_then(|raw| raw.strip_suffix('/'))
            .filter(|raw| !raw.is_empty());
        match trimmed {
            Some(raw) => self.nodes.get(Path::new(raw)),
            None => self.nodes.get(path),
        }
    }

    fn listing_kind(&self, path: &Path) -> Option<EntryKind> {
        match self.node(path)? {
            Node::Dir { hint: true, .. } | Node::Unreadable => {
                Some(EntryKind::Directory)
            }
            Node::File { hint: true, .. } => Some(EntryKind::File),
            Node::Other => Some(EntryKind::Other),
            Node::Dir { hint: false, .. }
            | Node::File { hint: false, .. } => None,
        }
    }
}

impl FileSystem for InMemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.node(path).is_some()
    }

    fn read_dir(&self, path: &Path) -> io::Result<ReadDirIter<'_>> {
        match self.node(path) {
            Some(Node::Dir { children, .. }) => {
                let base = path.to_path_buf();
                let queue: VecDeque<String> = children.clone().into();
                Ok(Box::new(queue.into_iter().map(move |name| {
                    let kind = self.listing_kind(&base.join(&name));
                    Ok(DirEntryInfo { name, kind })
                })))
            }
            Some(Node::Unreadable) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read_dir denied for {:?}", path),
            )),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("read_dir on file: {:?}", path),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("read_dir on missing path: {:?}", path),
            )),
        }
    }

    fn metadata(&self, path: &Path) -> io::Result<FsMetadata> {
        match self.node(path) {
            Some(Node::Dir { modified, .. }) => Ok(FsMetadata {
                kind: EntryKind::Directory,
                len: 0,
                modified: *modified,
            }),
            Some(Node::Unreadable) => Ok(FsMetadata {
                kind: EntryKind::Directory,
                len: 0,
                modified: 0,
            }),
            Some(Node::File { len, modified, .. }) => Ok(FsMetadata {
                kind: EntryKind::File,
                len: *len,
                modified: *modified,
            }),
            Some(Node::Other) => Ok(FsMetadata {
                kind: EntryKind::Other,
                len: 0,
                modified: 0,
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("metadata on missing path: {:?}", path),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_listing_preserves_insertion_order() {
        let mut fs = InMemoryFs::new();
        fs.add_file("/root/b.mp3", 1)
            .add_dir("/root/a")
            .add_file("/root/c.mp3", 2);

        let names: Vec<_> = fs
            .read_dir(Path::new("/root/"))
            .unwrap()
            .map(|e| e.unwrap().name)
            .collect();
        assert_eq!(names, ["b.mp3", "a", "c.mp3"]);
    }

    #[test]
    fn test_in_memory_hidden_kind_requires_status_query() {
        let mut fs = InMemoryFs::new();
        fs.add_file("/root/song.ogg", 10).hide_kind("/root/song.ogg");

        let entry = fs
            .read_dir(Path::new("/root"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(entry.kind, None);
        assert_eq!(
            fs.metadata(Path::new("/root/song.ogg")).unwrap().kind,
            EntryKind::File
        );
    }

    #[test]
    fn test_in_memory_unreadable_dir() {
        let mut fs = InMemoryFs::new();
        fs.add_unreadable_dir("/root/locked");
        let err = fs.read_dir(Path::new("/root/locked/")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(fs.exists(Path::new("/root/locked")));
    }

    #[test]
    fn test_real_fs_reports_kinds_and_sizes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("clip.mp4"), b"12345").unwrap();

        let real = RealFs::new();
        let mut entries: Vec<_> = real
            .read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries[0].name, "clip.mp4");
        assert_eq!(entries[0].kind, Some(EntryKind::File));
        assert_eq!(entries[1].name, "sub");
        assert_eq!(entries[1].kind, Some(EntryKind::Directory));

        let md = real.metadata(&dir.path().join("clip.mp4")).unwrap();
        assert_eq!(md.len, 5);
        assert!(md.modified > 0);
        assert!(real.exists(&dir.path().join("sub")));
        assert!(!real.exists(&dir.path().join("missing")));
    }
}
