use dashmap::DashMap;
use glob::Pattern;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::paths;

static GLOB_CACHE: Lazy<DashMap<String, Arc<Pattern>>> = Lazy::new(DashMap::new);

/// MIME families a `type:` condition can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Image,
    Audio,
    Video,
    Text,
    Pdf,
}

impl FileType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    fn matches_mime(&self, mime: &mime_guess::Mime) -> bool {
        match self {
            Self::Image => mime.type_() == mime_guess::mime::IMAGE,
            Self::Audio => mime.type_() == mime_guess::mime::AUDIO,
            Self::Video => mime.type_() == mime_guess::mime::VIDEO,
            Self::Text => mime.type_() == mime_guess::mime::TEXT,
            Self::Pdf => mime.essence_str() == "application/pdf",
        }
    }
}

/// A structural predicate over an entry's full normalized path.
#[derive(Debug, Clone)]
pub enum Condition {
    /// The MIME type guessed from the extension belongs to this family
    Type(FileType),
    /// The extension equals this one, ignoring ASCII case (stored without dot)
    Extension(String),
    /// The full path matches this glob
    Glob(Arc<Pattern>),
}

impl Condition {
    pub fn extension(ext: &str) -> Self {
        Self::Extension(ext.trim_start_matches('.').to_string())
    }

    /// Compiles a glob condition, reusing a previously compiled pattern when
    /// the same text was seen before. Returns `None` for invalid patterns.
    pub fn glob(pattern: &str) -> Option<Self> {
        if let Some(entry) = GLOB_CACHE.get(pattern) {
            return Some(Self::Glob(entry.clone()));
        }
        let compiled = Arc::new(Pattern::new(pattern).ok()?);
        GLOB_CACHE.insert(pattern.to_string(), compiled.clone());
        Some(Self::Glob(compiled))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Type(kind) => mime_guess::from_path(path)
                .iter()
                .any(|mime| kind.matches_mime(&mime)),
            Self::Extension(ext) => extension_of(path)
                .map(|e| e.eq_ignore_ascii_case(ext))
                .unwrap_or(false),
            Self::Glob(pattern) => pattern.matches(path),
        }
    }
}

fn extension_of(path: &str) -> Option<&str> {
    let name = paths::base_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&name[idx + 1..]),
    }
}
