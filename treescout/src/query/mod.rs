//! Query interpretation.
//!
//! A raw query string is turned into a [`SearchSpec`]: a case flag, a set of
//! structural [`Condition`]s over the entry path, and a set of literal terms
//! matched against the base name.
//!
//! # Grammar
//!
//! Tokens are recognised in this order and removed from the query:
//!
//! - `case:sensitive` turns on case-sensitive term matching; `case:insensitive`
//!   is accepted and is the default.
//! - `type:<kind>` keeps entries whose guessed MIME type is `image`, `audio`,
//!   `video`, `text` or `pdf`. Unknown kinds are ignored.
//! - `ext:<ext>` keeps entries with that extension (`ext:md`, `ext:.md`).
//! - `glob:<pattern>` keeps entries whose full path matches the glob.
//!   Patterns that do not compile are ignored.
//!
//! What is left becomes the terms. A remainder wrapped in double quotes is a
//! single term, quotes stripped; otherwise it is split on whitespace.
//!
//! Parsing never fails. A query with nothing usable in it matches everything.
//!
//! ```
//! use treescout::query::parse;
//!
//! let spec = parse("type:image Holiday case:sensitive");
//! assert!(spec.case_sensitive);
//! assert_eq!(spec.conditions.len(), 1);
//! assert_eq!(spec.terms, vec!["Holiday"]);
//! ```

mod conditions;

pub use conditions::{Condition, FileType};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::paths;

static CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)case:(sensitive|insensitive)\b").expect("valid case regex"));
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(type|ext|glob):(\S+)").expect("valid field regex"));

/// A parsed query.
#[derive(Debug, Clone, Default)]
pub struct SearchSpec {
    pub case_sensitive: bool,
    /// OR-combined; empty means every entry passes
    pub conditions: Vec<Condition>,
    /// OR-combined; empty means every entry passes
    pub terms: Vec<String>,
}

impl SearchSpec {
    /// True when the spec places no restriction on entries at all.
    pub fn matches_everything(&self) -> bool {
        self.conditions.is_empty() && self.terms.is_empty()
    }

    /// Condition phase: passes when there are no conditions or any matches.
    pub fn matches_conditions(&self, path: &str) -> bool {
        self.conditions.is_empty() || self.conditions.iter().any(|c| c.matches(path))
    }

    /// Term phase: passes when there are no terms or any term is a substring
    /// of the base name of `path`.
    pub fn matches_terms(&self, path: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let name = paths::base_name(path);
        if self.case_sensitive {
            self.terms.iter().any(|term| name.contains(term.as_str()))
        } else {
            let name = name.to_lowercase();
            self.terms
                .iter()
                .any(|term| name.contains(term.to_lowercase().as_str()))
        }
    }

    /// Both phases in order.
    pub fn matches(&self, path: &str) -> bool {
        self.matches_conditions(path) && self.matches_terms(path)
    }
}

/// Parses a raw query into a [`SearchSpec`]. See the module docs for the
/// grammar.
pub fn parse(query: &str) -> SearchSpec {
    let mut spec = SearchSpec {
        case_sensitive: CASE_RE
            .captures_iter(query)
            .any(|caps| &caps[1] == "sensitive"),
        ..Default::default()
    };

    let value = CASE_RE.replace_all(query, " ");

    for caps in FIELD_RE.captures_iter(&value) {
        let arg = &caps[2];
        let condition = match &caps[1] {
            "type" => FileType::from_name(arg).map(Condition::Type),
            "ext" => Some(Condition::extension(arg)),
            "glob" => Condition::glob(arg),
            _ => None,
        };
        match condition {
            Some(condition) => spec.conditions.push(condition),
            None => trace!("Ignoring unusable query field {}", &caps[0].trim()),
        }
    }
    let value = FIELD_RE.replace_all(&value, " ");

    let mut value = value.trim().to_string();
    if !spec.case_sensitive {
        value = value.to_lowercase();
    }
    if value.is_empty() {
        return spec;
    }

    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let unique = value[1..value.len() - 1].to_string();
        if !unique.is_empty() {
            spec.terms.push(unique);
        }
        return spec;
    }

    spec.terms = value.split_whitespace().map(str::to_string).collect();
    spec
}
