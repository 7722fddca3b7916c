//! Visibility checks consulted once per visited path.
//!
//! A checker answers one question: may the search see this normalized,
//! absolute path? A `false` for a directory hides everything below it; the
//! walker never asks about paths inside a hidden directory.
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{SearchError, SearchResult};
use crate::paths;

/// Decides whether a path is visible to the current search.
pub trait PermissionChecker: Send + Sync {
    fn check(&self, path: &str) -> bool;
}

impl<F> PermissionChecker for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn check(&self, path: &str) -> bool {
        self(path)
    }
}

/// Sees everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn check(&self, _path: &str) -> bool {
        true
    }
}

/// Serialized form of a [`Rule`], as it appears in configuration files.
///
/// ```yaml
/// rules:
///   - path: /private
///     allow: false
///   - path: "^/private/shared(/|$)"
///     regex: true
///     allow: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Path prefix, or a regular expression when `regex` is set
    pub path: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub allow: bool,
}

#[derive(Debug, Clone)]
enum RuleMatcher {
    Prefix(String),
    Regex(Regex),
}

/// A single allow or deny rule.
#[derive(Debug, Clone)]
pub struct Rule {
    allow: bool,
    matcher: RuleMatcher,
}

impl Rule {
    /// Matches every path starting with `prefix`.
    pub fn prefix(prefix: &str, allow: bool) -> Self {
        Self {
            allow,
            matcher: RuleMatcher::Prefix(prefix.to_string()),
        }
    }

    /// Matches every path the regular expression finds a match in.
    pub fn regex(pattern: &str, allow: bool) -> SearchResult<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| SearchError::invalid_rule(format!("{}: {}", pattern, e)))?;
        Ok(Self {
            allow,
            matcher: RuleMatcher::Regex(re),
        })
    }

    pub fn from_config(config: &RuleConfig) -> SearchResult<Self> {
        if config.regex {
            Self::regex(&config.path, config.allow)
        } else {
            Ok(Self::prefix(&config.path, config.allow))
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            RuleMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            RuleMatcher::Regex(re) => re.is_match(path),
        }
    }

    pub fn allow(&self) -> bool {
        self.allow
    }
}

/// Ordered allow/deny rules, last match wins, visible by default.
///
/// With `hide_dotfiles` set, any path whose base name starts with `.` is
/// hidden before rules are consulted.
#[derive(Debug, Clone, Default)]
pub struct RuleChecker {
    hide_dotfiles: bool,
    rules: Vec<Rule>,
}

impl RuleChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[RuleConfig], hide_dotfiles: bool) -> SearchResult<Self> {
        let rules = configs
            .iter()
            .map(Rule::from_config)
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self {
            hide_dotfiles,
            rules,
        })
    }

    pub fn hide_dotfiles(mut self, hide: bool) -> Self {
        self.hide_dotfiles = hide;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl PermissionChecker for RuleChecker {
    fn check(&self, path: &str) -> bool {
        if self.hide_dotfiles && paths::base_name(path).starts_with('.') {
            return false;
        }
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .map(Rule::allow)
            .unwrap_or(true)
    }
}

/// Hides paths matching gitignore-style patterns relative to `root`.
#[derive(Debug, Clone)]
pub struct IgnoreChecker {
    matcher: Gitignore,
}

impl IgnoreChecker {
    pub fn new(root: impl AsRef<Path>, patterns: &[String]) -> SearchResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| SearchError::invalid_rule(format!("{}: {}", pattern, e)))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| SearchError::invalid_rule(e.to_string()))?;
        Ok(Self { matcher })
    }
}

impl PermissionChecker for IgnoreChecker {
    fn check(&self, path: &str) -> bool {
        let path = Path::new(path);
        if !path.starts_with(self.matcher.path()) {
            return true;
        }
        // Directory-only patterns are matched as directories; the checker has
        // no metadata, so a path is tried both ways.
        !(self.matcher.matched(path, false).is_ignore()
            || self.matcher.matched(path, true).is_ignore())
    }
}

/// Visible only when every inner checker agrees.
pub struct AllOf {
    checkers: Vec<Box<dyn PermissionChecker>>,
}

impl AllOf {
    pub fn new(checkers: Vec<Box<dyn PermissionChecker>>) -> Self {
        Self { checkers }
    }
}

impl PermissionChecker for AllOf {
    fn check(&self, path: &str) -> bool {
        self.checkers.iter().all(|c| c.check(path))
    }
}
