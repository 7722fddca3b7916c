use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Traversal counters. Clones share the same counters, so one instance can be
/// handed to parallel searches and read once they finish.
#[derive(Debug, Clone, Default)]
pub struct WalkMetrics {
    entries_visited: Arc<AtomicU64>,
    entries_denied: Arc<AtomicU64>,
    symlinks_followed: Arc<AtomicU64>,
    depth_limited: Arc<AtomicU64>,
    cycles_skipped: Arc<AtomicU64>,
    matches: Arc<AtomicU64>,
}

/// A point-in-time copy of [`WalkMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub entries_visited: u64,
    pub entries_denied: u64,
    pub symlinks_followed: u64,
    pub depth_limited: u64,
    pub cycles_skipped: u64,
    pub matches: u64,
}

impl WalkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_entry(&self) {
        self.entries_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.entries_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_symlink(&self) {
        self.symlinks_followed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_depth_limited(&self) {
        self.depth_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WalkStats {
        WalkStats {
            entries_visited: self.entries_visited.load(Ordering::Relaxed),
            entries_denied: self.entries_denied.load(Ordering::Relaxed),
            symlinks_followed: self.symlinks_followed.load(Ordering::Relaxed),
            depth_limited: self.depth_limited.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Walk stats:\n\
             Entries visited: {}\n\
             Entries denied: {}\n\
             Symlinks followed: {}\n\
             Frames stopped by depth guard: {}\n\
             Links skipped as cycles: {}\n\
             Matches: {}",
            stats.entries_visited,
            stats.entries_denied,
            stats.symlinks_followed,
            stats.depth_limited,
            stats.cycles_skipped,
            stats.matches,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = WalkMetrics::new();
        metrics.record_entry();
        metrics.record_entry();
        metrics.record_denied();
        metrics.record_symlink();
        metrics.record_depth_limited();
        metrics.record_match();

        let stats = metrics.get_stats();
        assert_eq!(stats.entries_visited, 2);
        assert_eq!(stats.entries_denied, 1);
        assert_eq!(stats.symlinks_followed, 1);
        assert_eq!(stats.depth_limited, 1);
        assert_eq!(stats.cycles_skipped, 0);
        assert_eq!(stats.matches, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = WalkMetrics::new();
        let clone = metrics.clone();
        clone.record_match();
        assert_eq!(metrics.get_stats().matches, 1);
    }
}
