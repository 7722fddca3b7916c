use rayon::prelude::*;
use std::convert::Infallible;
use tracing::debug;

use super::options::SearchOptions;
use super::walker::search_with;
use crate::errors::SearchResult;
use crate::fs::{EntryInfo, FileSystem};
use crate::paths;
use crate::permissions::PermissionChecker;
use crate::results::{SearchMatch, SearchOutput};

/// Runs a search from depth 0 and buffers every match, in report order.
pub fn collect(
    fs: &dyn FileSystem,
    scope: &str,
    query: &str,
    checker: &dyn PermissionChecker,
    options: &SearchOptions,
) -> SearchResult<SearchOutput> {
    let scope_key = paths::normalize(scope);
    let mut output = SearchOutput::new();
    search_with(
        fs,
        scope,
        query,
        checker,
        |relative: &str, info: &EntryInfo| {
            output.add_match(SearchMatch::new(scope_key.as_str(), relative, info.clone()));
            Ok::<(), Infallible>(())
        },
        0,
        options,
    )?;
    Ok(output)
}

/// Searches several scopes in parallel on the current rayon pool.
///
/// Each scope is collected on its own, then the outputs are appended in the
/// order `scopes` was given, so the result is the same on every run. The
/// first failing scope, in that order, fails the whole call.
pub fn search_many<S>(
    fs: &dyn FileSystem,
    scopes: &[S],
    query: &str,
    checker: &dyn PermissionChecker,
    options: &SearchOptions,
) -> SearchResult<SearchOutput>
where
    S: AsRef<str> + Sync,
{
    debug!(
        "Searching {} scopes on {} threads",
        scopes.len(),
        rayon::current_num_threads()
    );

    let outputs: Vec<SearchResult<SearchOutput>> = scopes
        .par_iter()
        .map(|scope| collect(fs, scope.as_ref(), query, checker, options))
        .collect();

    let mut merged = SearchOutput::new();
    for output in outputs {
        merged.merge(output?);
    }
    Ok(merged)
}
