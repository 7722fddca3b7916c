//! Filesystem capability used by the walker.
//!
//! The walker only ever lists directories, stats entries without following
//! links, and reads link targets. Anything that can do those three things can
//! be searched: the real OS filesystem ([`OsFs`]) or an in-memory tree
//! ([`MemoryFs`]).

mod memory;
mod os;

pub use memory::MemoryFs;
pub use os::OsFs;

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::trace;

use crate::errors::{SearchError, SearchResult};
use crate::paths;
use crate::search::CancelFlag;

/// What kind of entry a path names, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// Metadata snapshot for a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Base name of the entry
    pub name: String,
    /// Entry type as seen by lstat
    pub kind: EntryKind,
    /// Size in bytes (0 for directories in the in-memory tree)
    pub len: u64,
    /// Last modification time, when the backend knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<SystemTime>,
}

impl EntryInfo {
    pub fn new(name: impl Into<String>, kind: EntryKind, len: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            len,
            modified: None,
        }
    }

    pub fn file(name: impl Into<String>, len: u64) -> Self {
        Self::new(name, EntryKind::File, len)
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Dir, 0)
    }

    pub fn symlink(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Symlink, 0)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// The capabilities a searchable filesystem must provide.
pub trait FileSystem: Send + Sync {
    /// Lists the entries of a directory. Entries describe themselves as lstat
    /// would, so symlinks are reported as symlinks.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<EntryInfo>>;

    /// Stats a path without following a final symlink.
    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryInfo>;

    /// Reads the target a symlink points to, exactly as stored.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    fn is_symlink(&self, info: &EntryInfo) -> bool {
        info.kind == EntryKind::Symlink
    }
}

/// What the walk should do after visiting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into this entry. Has no effect on non-directories.
    SkipSubtree,
}

/// Pre-order walk of the tree rooted at the normalized path `root`.
///
/// The root is visited first, then children in lexical name order. Symlinks
/// are visited but never followed. An error from the visitor, a listing or a
/// stat stops the walk and is returned as is; a missing root is reported as
/// [`SearchError::ScopeNotFound`].
pub fn walk<F>(
    fs: &dyn FileSystem,
    root: &str,
    cancel: Option<&CancelFlag>,
    visit: &mut F,
) -> SearchResult<()>
where
    F: FnMut(&str, &EntryInfo) -> SearchResult<WalkControl>,
{
    check_cancel(cancel)?;
    let info = fs.symlink_metadata(Path::new(root)).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SearchError::scope_not_found(root)
        } else {
            SearchError::io(root, e)
        }
    })?;
    walk_entry(fs, root, &info, cancel, visit)
}

fn walk_entry<F>(
    fs: &dyn FileSystem,
    path: &str,
    info: &EntryInfo,
    cancel: Option<&CancelFlag>,
    visit: &mut F,
) -> SearchResult<()>
where
    F: FnMut(&str, &EntryInfo) -> SearchResult<WalkControl>,
{
    let control = visit(path, info)?;
    if control == WalkControl::SkipSubtree || !info.is_dir() {
        return Ok(());
    }

    check_cancel(cancel)?;
    let mut children = fs
        .read_dir(Path::new(path))
        .map_err(|e| SearchError::io(path, e))?;
    children.sort_by(|a, b| a.name.cmp(&b.name));
    trace!("Listed {} entries in {}", children.len(), path);

    for child in &children {
        let child_path = paths::join(path, &child.name);
        walk_entry(fs, &child_path, child, cancel, visit)?;
    }
    Ok(())
}

fn check_cancel(cancel: Option<&CancelFlag>) -> SearchResult<()> {
    match cancel {
        Some(flag) if flag.is_cancelled() => Err(SearchError::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.add_file("/root/b.txt", 3)
            .add_file("/root/a/inner.txt", 5)
            .add_dir("/root/c")
            .add_symlink("/root/link", "/root/a");
        fs
    }

    #[test]
    fn test_walk_is_preorder_and_sorted() {
        let fs = sample();
        let mut seen = Vec::new();
        walk(&fs, "/root", None, &mut |path: &str, _: &EntryInfo| {
            seen.push(path.to_string());
            Ok(WalkControl::Continue)
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                "/root",
                "/root/a",
                "/root/a/inner.txt",
                "/root/b.txt",
                "/root/c",
                "/root/link",
            ]
        );
    }

    #[test]
    fn test_walk_skip_subtree() {
        let fs = sample();
        let mut seen = Vec::new();
        walk(&fs, "/root", None, &mut |path: &str, _: &EntryInfo| {
            seen.push(path.to_string());
            if path == "/root/a" {
                Ok(WalkControl::SkipSubtree)
            } else {
                Ok(WalkControl::Continue)
            }
        })
        .unwrap();

        assert!(seen.contains(&"/root/a".to_string()));
        assert!(!seen.contains(&"/root/a/inner.txt".to_string()));
    }

    #[test]
    fn test_walk_missing_root() {
        let fs = sample();
        let err = walk(&fs, "/nope", None, &mut |_: &str, _: &EntryInfo| Ok(WalkControl::Continue)).unwrap_err();
        assert!(matches!(err, SearchError::ScopeNotFound(_)));
    }

    #[test]
    fn test_walk_visitor_error_stops() {
        let fs = sample();
        let mut count = 0;
        let err = walk(&fs, "/root", None, &mut |path: &str, _: &EntryInfo| {
            count += 1;
            if path == "/root/a" {
                Err(SearchError::callback("stop"))
            } else {
                Ok(WalkControl::Continue)
            }
        })
        .unwrap_err();
        assert!(matches!(err, SearchError::Callback(_)));
        assert_eq!(count, 2);
    }

    #[test]
    fn test_walk_honors_cancel() {
        let fs = sample();
        let flag = CancelFlag::new();
        flag.cancel();
        let err = walk(&fs, "/root", Some(&flag), &mut |_: &str, _: &EntryInfo| Ok(WalkControl::Continue))
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
