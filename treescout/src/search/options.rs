use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::metrics::WalkMetrics;

/// Symlink hops a single search follows before giving up on a branch.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// How symlink cycles are kept from running away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Only the depth guard applies. A self-referencing link is re-listed up
    /// to `max_depth` times.
    #[default]
    #[serde(alias = "depth-bounded")]
    Depth,
    /// The depth guard applies, and a link whose resolved target is already a
    /// scope on the current chain of followed links is not entered again.
    #[serde(alias = "visited-set")]
    Visited,
}

impl std::str::FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "depth" | "depth-bounded" => Ok(Self::Depth),
            "visited" | "visited-set" => Ok(Self::Visited),
            other => Err(format!("unknown cycle policy: {}", other)),
        }
    }
}

/// Shared cancellation switch. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs for a single search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// A frame deeper than this returns without visiting anything
    pub max_depth: usize,
    pub cycle_policy: CyclePolicy,
    /// Checked before every directory listing, stat and link read
    pub cancel: Option<CancelFlag>,
    /// Counters shared by every clone of these options
    pub metrics: WalkMetrics,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cycle_policy: CyclePolicy::default(),
            cancel: None,
            metrics: WalkMetrics::new(),
        }
    }
}

impl SearchOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.max_depth, 5);
        assert_eq!(options.cycle_policy, CyclePolicy::Depth);
        assert!(!options.is_cancelled());
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let options = SearchOptions::default().with_cancel(flag.clone());
        assert!(!options.is_cancelled());
        flag.cancel();
        assert!(options.is_cancelled());
    }

    #[test]
    fn test_cycle_policy_parsing() {
        assert_eq!("depth".parse::<CyclePolicy>(), Ok(CyclePolicy::Depth));
        assert_eq!("Visited".parse::<CyclePolicy>(), Ok(CyclePolicy::Visited));
        assert_eq!(
            "visited-set".parse::<CyclePolicy>(),
            Ok(CyclePolicy::Visited)
        );
        assert!("sometimes".parse::<CyclePolicy>().is_err());
    }
}
