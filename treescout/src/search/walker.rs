use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::options::{CyclePolicy, SearchOptions};
use crate::errors::{CallbackError, SearchError, SearchResult};
use crate::fs::{self, EntryInfo, FileSystem, WalkControl};
use crate::paths;
use crate::permissions::PermissionChecker;
use crate::query::{self, SearchSpec};

type MatchSink<'a> = dyn FnMut(&str, &EntryInfo) -> SearchResult<()> + 'a;

/// One traversal root. A new frame starts at the top of a search and every
/// time a symlink is followed.
#[derive(Debug, Clone)]
struct Frame {
    scope: String,
    depth: usize,
    /// Where this frame's matches live under the original scope
    prefix: String,
}

struct Walker<'a, 'b> {
    fs: &'a dyn FileSystem,
    checker: &'a dyn PermissionChecker,
    spec: &'a SearchSpec,
    options: &'a SearchOptions,
    on_match: &'b mut MatchSink<'b>,
    /// Scopes of the frames currently being walked, outermost first
    chain: Vec<String>,
}

/// Searches `scope` with the default options. See [`search_with`].
pub fn search<F, E>(
    fs: &dyn FileSystem,
    scope: &str,
    query: &str,
    checker: &dyn PermissionChecker,
    on_match: F,
    depth: usize,
) -> SearchResult<()>
where
    F: FnMut(&str, &EntryInfo) -> Result<(), E>,
    E: Into<CallbackError>,
{
    search_with(
        fs,
        scope,
        query,
        checker,
        on_match,
        depth,
        &SearchOptions::default(),
    )
}

/// Walks the tree under `scope` and calls `on_match` for every entry that is
/// visible to `checker` and matches `query`.
///
/// Entries are visited depth first, siblings in name order, and each match is
/// reported as soon as it is found with its path relative to `scope`. The
/// scope itself is never reported. A directory the checker hides is skipped
/// with everything below it. A symlink is never reported itself: its target
/// is searched as a new scope one level deeper, and whatever matches there is
/// reported under the link's own relative path. Once `depth` exceeds
/// `options.max_depth` the call returns without visiting anything.
///
/// The first error from the filesystem or from `on_match` stops the search
/// and is returned. Matches already reported stay reported.
pub fn search_with<F, E>(
    fs: &dyn FileSystem,
    scope: &str,
    query: &str,
    checker: &dyn PermissionChecker,
    mut on_match: F,
    depth: usize,
    options: &SearchOptions,
) -> SearchResult<()>
where
    F: FnMut(&str, &EntryInfo) -> Result<(), E>,
    E: Into<CallbackError>,
{
    if depth > options.max_depth {
        debug!("Depth {} exceeds limit {}, skipping {}", depth, options.max_depth, scope);
        options.metrics.record_depth_limited();
        return Ok(());
    }

    let spec = query::parse(query);
    let scope = paths::normalize(scope);
    info!("Starting search in {} with query {:?}", scope, query);

    let mut sink = |relative: &str, info: &EntryInfo| {
        on_match(relative, info).map_err(SearchError::callback)
    };
    let mut walker = Walker {
        fs,
        checker,
        spec: &spec,
        options,
        on_match: &mut sink,
        chain: vec![scope.clone()],
    };
    walker.walk_frame(&Frame {
        scope: scope.clone(),
        depth,
        prefix: String::new(),
    })?;

    info!("Search of {} complete", scope);
    Ok(())
}

impl<'a, 'b> Walker<'a, 'b> {
    fn walk_frame(&mut self, frame: &Frame) -> SearchResult<()> {
        if frame.depth > self.options.max_depth {
            debug!(
                "Depth {} exceeds limit {}, skipping {}",
                frame.depth, self.options.max_depth, frame.scope
            );
            self.options.metrics.record_depth_limited();
            return Ok(());
        }
        debug!("Walking {} at depth {}", frame.scope, frame.depth);

        let fs = self.fs;
        let options = self.options;
        fs::walk(
            fs,
            &frame.scope,
            options.cancel.as_ref(),
            &mut |path: &str, info: &EntryInfo| self.visit(frame, path, info),
        )
    }

    fn visit(&mut self, frame: &Frame, path: &str, info: &EntryInfo) -> SearchResult<WalkControl> {
        self.options.metrics.record_entry();

        if path == frame.scope {
            // a scope that is itself a link costs one more hop
            if self.fs.is_symlink(info) {
                self.follow_link(frame, path, &frame.prefix)?;
            }
            return Ok(WalkControl::Continue);
        }

        let relative = paths::join_relative(&frame.prefix, paths::relative_to(path, &frame.scope));

        if !self.checker.check(path) {
            trace!("Hidden by checker: {}", path);
            self.options.metrics.record_denied();
            return Ok(WalkControl::SkipSubtree);
        }

        if self.fs.is_symlink(info) {
            self.follow_link(frame, path, &relative)?;
            return Ok(WalkControl::SkipSubtree);
        }

        if !self.spec.matches_conditions(path) || !self.spec.matches_terms(path) {
            return Ok(WalkControl::Continue);
        }

        trace!("Match: {}", relative);
        self.options.metrics.record_match();
        (self.on_match)(&relative, info)?;
        Ok(WalkControl::Continue)
    }

    fn follow_link(&mut self, frame: &Frame, link: &str, prefix: &str) -> SearchResult<()> {
        if self.options.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        let target = self
            .fs
            .read_link(Path::new(link))
            .map_err(|e| SearchError::io(link, e))?;
        let target = paths::resolve_link(link, &target.to_string_lossy());

        // the target is entered as a scope and never checked as an entry
        if !self.checker.check(&target) {
            trace!("Link target hidden by checker: {} -> {}", link, target);
            self.options.metrics.record_denied();
            return Ok(());
        }

        if self.options.cycle_policy == CyclePolicy::Visited && self.chain.contains(&target) {
            debug!("Not re-entering {} through {}", target, link);
            self.options.metrics.record_cycle_skipped();
            return Ok(());
        }

        debug!("Following {} -> {} at depth {}", link, target, frame.depth + 1);
        self.options.metrics.record_symlink();
        let next = Frame {
            scope: target,
            depth: frame.depth + 1,
            prefix: prefix.to_string(),
        };

        self.chain.push(next.scope.clone());
        let result = match self.walk_frame(&next) {
            Err(SearchError::ScopeNotFound(missing)) => {
                warn!("Skipping dangling symlink {} -> {}", link, missing.display());
                Ok(())
            }
            other => other,
        };
        self.chain.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::permissions::AllowAll;
    use crate::search::CancelFlag;
    use std::convert::Infallible;

    fn run(fs: &MemoryFs, scope: &str, query: &str, options: &SearchOptions) -> Vec<String> {
        let mut found = Vec::new();
        search_with(
            fs,
            scope,
            query,
            &AllowAll,
            |rel: &str, _: &EntryInfo| {
                found.push(rel.to_string());
                Ok::<(), Infallible>(())
            },
            0,
            options,
        )
        .unwrap();
        found
    }

    #[test]
    fn test_scope_is_normalized_and_never_reported() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/a.txt", 1);

        let found = run(&fs, "docs/./", "", &SearchOptions::default());
        assert_eq!(found, vec!["a.txt"]);
    }

    #[test]
    fn test_depth_above_limit_returns_nothing() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/a.txt", 1);

        let options = SearchOptions::default();
        let mut found = 0;
        search_with(
            &fs,
            "/docs",
            "",
            &AllowAll,
            |_: &str, _: &EntryInfo| {
                found += 1;
                Ok::<(), Infallible>(())
            },
            6,
            &options,
        )
        .unwrap();
        assert_eq!(found, 0);
        assert_eq!(options.metrics.get_stats().depth_limited, 1);
    }

    #[test]
    fn test_symlink_matches_are_reported_under_the_link() {
        let mut fs = MemoryFs::new();
        fs.add_file("/data/report.txt", 1)
            .add_dir("/docs")
            .add_symlink("/docs/shared", "/data");

        let found = run(&fs, "/docs", "report", &SearchOptions::default());
        assert_eq!(found, vec!["shared/report.txt"]);
    }

    #[test]
    fn test_relative_symlink_target() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/img/photo.png", 1)
            .add_symlink("/docs/notes/pics", "../img");

        let found = run(&fs, "/docs/notes", "", &SearchOptions::default());
        assert_eq!(found, vec!["pics/photo.png"]);
    }

    #[test]
    fn test_scope_that_is_a_link() {
        let mut fs = MemoryFs::new();
        fs.add_file("/data/a.txt", 1).add_symlink("/entry", "/data");

        let options = SearchOptions::default();
        let found = run(&fs, "/entry", "", &options);
        assert_eq!(found, vec!["a.txt"]);
        assert_eq!(options.metrics.get_stats().symlinks_followed, 1);
    }

    #[test]
    fn test_link_to_file_reports_nothing() {
        let mut fs = MemoryFs::new();
        fs.add_file("/data/a.txt", 1)
            .add_dir("/docs")
            .add_symlink("/docs/alias.txt", "/data/a.txt");

        let found = run(&fs, "/docs", "", &SearchOptions::default());
        assert!(found.is_empty());
    }

    #[test]
    fn test_dangling_link_is_skipped() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/a.txt", 1)
            .add_symlink("/docs/broken", "/nowhere")
            .add_file("/docs/z.txt", 1);

        let found = run(&fs, "/docs", "", &SearchOptions::default());
        assert_eq!(found, vec!["a.txt", "z.txt"]);
    }

    #[test]
    fn test_link_into_hidden_directory_is_not_followed() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/.secret/key.pem", 1)
            .add_file("/docs/a.txt", 1)
            .add_symlink("/docs/alias", "/docs/.secret");

        let options = SearchOptions::default();
        let checker = crate::permissions::RuleChecker::new().hide_dotfiles(true);
        let mut found = Vec::new();
        search_with(
            &fs,
            "/docs",
            "",
            &checker,
            |rel: &str, _: &EntryInfo| {
                found.push(rel.to_string());
                Ok::<(), Infallible>(())
            },
            0,
            &options,
        )
        .unwrap();

        assert_eq!(found, vec!["a.txt"]);
        let stats = options.metrics.get_stats();
        // once for /docs/.secret, once for the link target
        assert_eq!(stats.entries_denied, 2);
        assert_eq!(stats.symlinks_followed, 0);
    }

    #[test]
    fn test_visited_policy_stops_at_cycle() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/a.txt", 1).add_symlink("/docs/loop", "/docs");

        let options = SearchOptions::default().with_cycle_policy(CyclePolicy::Visited);
        let found = run(&fs, "/docs", "", &options);
        assert_eq!(found, vec!["a.txt"]);
        let stats = options.metrics.get_stats();
        assert_eq!(stats.cycles_skipped, 1);
        assert_eq!(stats.symlinks_followed, 0);
    }

    #[test]
    fn test_custom_max_depth() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/a.txt", 1).add_symlink("/docs/loop", "/docs");

        let options = SearchOptions::default().with_max_depth(1);
        let found = run(&fs, "/docs", "", &options);
        assert_eq!(found, vec!["a.txt", "loop/a.txt"]);

        let options = SearchOptions::default().with_max_depth(0);
        let found = run(&fs, "/docs", "", &options);
        assert_eq!(found, vec!["a.txt"]);
    }

    #[test]
    fn test_cancelled_search() {
        let mut fs = MemoryFs::new();
        fs.add_file("/docs/a.txt", 1).add_file("/docs/sub/b.txt", 1);

        let flag = CancelFlag::new();
        let options = SearchOptions::default().with_cancel(flag.clone());
        let mut found = Vec::new();
        let err = search_with(
            &fs,
            "/docs",
            "",
            &AllowAll,
            |rel: &str, _: &EntryInfo| {
                found.push(rel.to_string());
                flag.cancel();
                Ok::<(), Infallible>(())
            },
            0,
            &options,
        )
        .unwrap_err();

        // "sub" comes from the listing already in hand; the flag is seen
        // before "sub" itself is listed
        assert!(err.is_cancelled());
        assert_eq!(found, vec!["a.txt", "sub"]);
    }
}
