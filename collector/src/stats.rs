use serde::{
    Deserialize,
    Serialize,
};
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};

/// Counters of the collection loop, shared with the owning process.
#[derive(Debug, Default)]
pub struct CollectionStats {
    ticks: AtomicU64,
    targets_collected: AtomicU64,
    events_published: AtomicU64,
    fetch_failures: AtomicU64,
    decode_failures: AtomicU64,
    target_failures: AtomicU64,
    publish_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub targets_collected: u64,
    pub events_published: u64,
    pub fetch_failures: u64,
    pub decode_failures: u64,
    pub target_failures: u64,
    pub publish_failures: u64,
}

impl CollectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_target(&self) {
        self.targets_collected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_target_failure(&self) {
        self.target_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            targets_collected: self.targets_collected.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            target_failures: self.target_failures.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}
