use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};
use crate::paths;
use crate::permissions::{AllOf, IgnoreChecker, PermissionChecker, RuleChecker, RuleConfig};
use crate::search::{CyclePolicy, SearchOptions, DEFAULT_MAX_DEPTH};

/// Search configuration.
///
/// # Configuration Locations
///
/// Files are merged in this order, later ones overriding earlier ones:
/// 1. Global `$HOME/.config/treescout/config.yaml`
/// 2. Local `.treescout.yaml` in the current directory
/// 3. A file given with `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Directories to search
/// roots: ["/srv/share"]
///
/// # Query (see treescout::query for the grammar)
/// query: "type:image holiday"
///
/// # Symlink hops to follow before giving up on a branch
/// max_depth: 5
///
/// # depth | visited
/// cycle_policy: depth
///
/// # Hide entries whose name starts with '.'
/// hide_dotfiles: true
///
/// # Allow/deny rules, last match wins
/// rules:
///   - path: /srv/share/private
///     allow: false
///
/// # Gitignore-style patterns hidden under each root
/// ignore_patterns:
///   - "*.tmp"
///
/// thread_count: 4
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Directories to search
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// Raw query string
    #[serde(default)]
    pub query: String,

    /// Maximum number of symlink hops
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub cycle_policy: CyclePolicy,

    /// Hide entries whose base name starts with a dot
    #[serde(default)]
    pub hide_dotfiles: bool,

    /// Ordered allow/deny rules
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Gitignore-style patterns, anchored at each root
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Only print the summary line
    #[serde(default)]
    pub stats_only: bool,

    /// Print matches as JSON lines
    #[serde(default)]
    pub json: bool,

    /// Threads used when several roots are searched
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            query: String::new(),
            max_depth: default_max_depth(),
            cycle_policy: CyclePolicy::default(),
            hide_dotfiles: false,
            rules: Vec::new(),
            ignore_patterns: Vec::new(),
            stats_only: false,
            json: false,
            thread_count: default_thread_count(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("treescout/config.yaml")),
            Some(PathBuf::from(".treescout.yaml")),
        ];
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }
        // an explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values. CLI values that
    /// differ from their defaults win.
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        if cli_config.roots != default_roots() {
            self.roots = cli_config.roots;
        }
        if !cli_config.query.is_empty() {
            self.query = cli_config.query;
        }
        if cli_config.max_depth != default_max_depth() {
            self.max_depth = cli_config.max_depth;
        }
        if cli_config.cycle_policy != CyclePolicy::default() {
            self.cycle_policy = cli_config.cycle_policy;
        }
        if cli_config.hide_dotfiles {
            self.hide_dotfiles = true;
        }
        // CLI rules come after file rules so they win on overlap
        self.rules.extend(cli_config.rules);
        self.ignore_patterns.extend(cli_config.ignore_patterns);
        if cli_config.stats_only {
            self.stats_only = true;
        }
        if cli_config.json {
            self.json = true;
        }
        if cli_config.thread_count != default_thread_count() {
            self.thread_count = cli_config.thread_count;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::default()
            .with_max_depth(self.max_depth)
            .with_cycle_policy(self.cycle_policy)
    }

    /// Roots as absolute, normalized scope strings. Relative roots are taken
    /// relative to the current directory.
    pub fn scopes(&self) -> SearchResult<Vec<String>> {
        let cwd = std::env::current_dir()
            .map_err(|e| SearchError::io(".", e))?;
        Ok(self
            .roots
            .iter()
            .map(|root| {
                let absolute = if root.is_absolute() {
                    root.clone()
                } else {
                    cwd.join(root)
                };
                paths::normalize(&absolute.to_string_lossy())
            })
            .collect())
    }

    /// Builds the permission checker for a search over `scopes`: the rule
    /// checker, plus one ignore checker per scope when ignore patterns are
    /// configured.
    pub fn checker(&self, scopes: &[String]) -> SearchResult<Box<dyn PermissionChecker>> {
        let rules = RuleChecker::from_configs(&self.rules, self.hide_dotfiles)?;
        if self.ignore_patterns.is_empty() {
            return Ok(Box::new(rules));
        }
        let mut checkers: Vec<Box<dyn PermissionChecker>> = vec![Box::new(rules)];
        for scope in scopes {
            checkers.push(Box::new(IgnoreChecker::new(scope, &self.ignore_patterns)?));
        }
        Ok(Box::new(AllOf::new(checkers)))
    }
}
