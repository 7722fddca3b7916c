//! Slash-separated path normalization.
//!
//! Every path the walker hands to a checker, a condition or a callback goes
//! through [`normalize`] first, so all of them see the same absolute,
//! `/`-separated, cleaned spelling regardless of how the caller wrote it.

/// Normalizes a path to an absolute, `/`-separated, cleaned form.
///
/// Backslashes become slashes, empty and `.` segments are dropped, and `..`
/// pops the previous segment (never above the root).
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = String::with_capacity(path.len() + 1);
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Strips `scope` and any leading separator from a normalized `path`.
pub fn relative_to<'a>(path: &'a str, scope: &str) -> &'a str {
    let rest = path.strip_prefix(scope).unwrap_or(path);
    rest.trim_start_matches('/')
}

/// Final component of a normalized path; empty for the root.
pub fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Parent of a normalized path; the root is its own parent.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Joins a child name onto a normalized directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Joins two relative display paths, either of which may be empty.
pub fn join_relative(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, rest),
    }
}

/// Resolves a symlink target read from `link`. Relative targets are taken
/// relative to the directory holding the link.
pub fn resolve_link(link: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    if target.starts_with('/') {
        normalize(&target)
    } else {
        normalize(&format!("{}/{}", parent(link), target))
    }
}
