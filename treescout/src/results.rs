use serde::Serialize;

use crate::fs::{EntryInfo, EntryKind};

/// A single reported entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    /// Normalized scope the search started from
    pub scope: String,
    /// Path relative to `scope`, `/`-separated, no leading separator
    pub relative_path: String,
    pub info: EntryInfo,
}

impl SearchMatch {
    pub fn new(scope: impl Into<String>, relative_path: impl Into<String>, info: EntryInfo) -> Self {
        Self {
            scope: scope.into(),
            relative_path: relative_path.into(),
            info,
        }
    }

    /// Absolute logical path of the match (scope joined with the relative
    /// path). For matches found through a symlink this is the path through
    /// the link, not the link target.
    pub fn display_path(&self) -> String {
        crate::paths::join(&self.scope, &self.relative_path)
    }
}

/// Buffered matches, in the order they were reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutput {
    pub matches: Vec<SearchMatch>,
    /// Total number of matches
    pub total_matches: usize,
    /// Matches that are regular files
    pub files: usize,
    /// Matches that are directories
    pub dirs: usize,
}

impl SearchOutput {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_match(&mut self, m: SearchMatch) {
        self.total_matches += 1;
        match m.info.kind {
            EntryKind::Dir => self.dirs += 1,
            _ => self.files += 1,
        }
        self.matches.push(m);
    }

    /// Appends another output after this one.
    pub fn merge(&mut self, other: SearchOutput) {
        self.total_matches += other.total_matches;
        self.files += other.files;
        self.dirs += other.dirs;
        self.matches.extend(other.matches);
    }

    /// Relative paths in report order.
    pub fn relative_paths(&self) -> Vec<&str> {
        self.matches
            .iter()
            .map(|m| m.relative_path.as_str())
            .collect()
    }
}
