use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{EntryInfo, EntryKind, FileSystem};

/// The host filesystem, accessed through `std::fs`.
///
/// Listing uses lstat semantics: a symlink inside a directory is reported as
/// a symlink and never followed here.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl OsFs {
    pub fn new() -> Self {
        Self
    }

    fn info(name: String, metadata: &Metadata) -> EntryInfo {
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        EntryInfo {
            name,
            kind,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }
}

impl FileSystem for OsFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // paths are rebuilt from names, so a lossy name would point nowhere
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping non UTF-8 entry {:?} in {}", raw, path.display());
                    continue;
                }
            };
            // DirEntry::metadata does not traverse symlinks
            let metadata = entry.metadata()?;
            entries.push(Self::info(name, &metadata));
        }
        Ok(entries)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryInfo> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::info(name, &metadata))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }
}
