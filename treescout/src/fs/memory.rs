use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use super::{EntryInfo, EntryKind, FileSystem};
use crate::paths;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { len: u64 },
    Symlink { target: String },
}

/// An in-memory directory tree.
///
/// Paths are normalized on the way in, and missing parent directories are
/// created implicitly, so `add_file("/a/b/c.txt", 0)` also creates `/a` and
/// `/a/b`. Paths registered with [`MemoryFs::fail_on`] return a
/// permission-denied error from every call, which is how tests exercise the
/// walker's error handling.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: BTreeMap<String, Node>,
    failing: BTreeSet<String>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Creates a tree holding only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            nodes,
            failing: BTreeSet::new(),
        }
    }

    pub fn add_dir(&mut self, path: &str) -> &mut Self {
        let path = paths::normalize(path);
        self.insert(path, Node::Dir);
        self
    }

    pub fn add_file(&mut self, path: &str, len: u64) -> &mut Self {
        let path = paths::normalize(path);
        self.insert(path, Node::File { len });
        self
    }

    /// Adds a symlink whose target is stored verbatim, relative or absolute.
    pub fn add_symlink(&mut self, path: &str, target: &str) -> &mut Self {
        let path = paths::normalize(path);
        self.insert(
            path,
            Node::Symlink {
                target: target.to_string(),
            },
        );
        self
    }

    /// Makes every operation on `path` fail with `PermissionDenied`.
    pub fn fail_on(&mut self, path: &str) -> &mut Self {
        self.failing.insert(paths::normalize(path));
        self
    }

    fn insert(&mut self, path: String, node: Node) {
        let mut dir = paths::parent(&path).to_string();
        while dir != "/" && !self.nodes.contains_key(&dir) {
            self.nodes.insert(dir.clone(), Node::Dir);
            dir = paths::parent(&dir).to_string();
        }
        self.nodes.insert(path, node);
    }

    fn lookup(&self, path: &Path) -> io::Result<(String, &Node)> {
        let key = paths::normalize(&path.to_string_lossy());
        if self.failing.contains(&key) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access denied: {}", key),
            ));
        }
        match self.nodes.get(&key) {
            Some(node) => Ok((key, node)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such entry: {}", key),
            )),
        }
    }

    fn info(path: &str, node: &Node) -> EntryInfo {
        let name = paths::base_name(path);
        match node {
            Node::Dir => EntryInfo::dir(name),
            Node::File { len } => EntryInfo::file(name, *len),
            Node::Symlink { .. } => EntryInfo::new(name, EntryKind::Symlink, 0),
        }
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<EntryInfo>> {
        let (key, node) = self.lookup(path)?;
        if !matches!(node, Node::Dir) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a directory: {}", key),
            ));
        }

        let prefix = if key == "/" {
            "/".to_string()
        } else {
            format!("{}/", key)
        };
        let entries = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .filter(|(p, _)| p.len() > prefix.len() && !p[prefix.len()..].contains('/'))
            .map(|(p, node)| Self::info(p, node))
            .collect();
        Ok(entries)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryInfo> {
        let (key, node) = self.lookup(path)?;
        Ok(Self::info(&key, node))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let (key, node) = self.lookup(path)?;
        match node {
            Node::Symlink { target } => Ok(PathBuf::from(target)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a symlink: {}", key),
            )),
        }
    }
}
