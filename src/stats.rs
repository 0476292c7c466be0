use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct Stats {
    start_ms: AtomicU64,
    last_log_ms: AtomicU64,

    messages_seen: AtomicU64,
    invalid_commands: AtomicU64,
    replies_sent: AtomicU64,

    offers_evaluated: AtomicU64,
    offers_accepted: AtomicU64,
    offers_declined: AtomicU64,
    unknown_items: AtomicU64,
}

impl Stats {
    pub fn new(now_ms: u64) -> Arc<Self> {
        let s = Arc::new(Self::default());
        s.start_ms.store(now_ms, Ordering::Relaxed);
        s.last_log_ms.store(now_ms, Ordering::Relaxed);
        s
    }

    pub fn inc_message(&self) {
        self.messages_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_command(&self) {
        self.invalid_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reply(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_offer_evaluated(&self) {
        self.offers_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_offer_accepted(&self) {
        self.offers_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_offer_declined(&self) {
        self.offers_declined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_unknown_items(&self, n: u64) {
        self.unknown_items.fetch_add(n, Ordering::Relaxed);
    }

    pub fn should_log(&self, now_ms: u64, every_sec: u64) -> bool {
        if every_sec == 0 { return false; }
        let last = self.last_log_ms.load(Ordering::Relaxed);
        now_ms.saturating_sub(last) >= every_sec.saturating_mul(1000)
    }

    pub fn mark_logged(&self, now_ms: u64) {
        self.last_log_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self, now_ms: u64) -> StatsSnapshot {
        let start = self.start_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            now_ms,
            up_sec: (now_ms.saturating_sub(start)) / 1000,
            messages_seen: self.messages_seen.load(Ordering::Relaxed),
            invalid_commands: self.invalid_commands.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            offers_evaluated: self.offers_evaluated.load(Ordering::Relaxed),
            offers_accepted: self.offers_accepted.load(Ordering::Relaxed),
            offers_declined: self.offers_declined.load(Ordering::Relaxed),
            unknown_items: self.unknown_items.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub now_ms: u64,
    pub up_sec: u64,
    pub messages_seen: u64,
    pub invalid_commands: u64,
    pub replies_sent: u64,
    pub offers_evaluated: u64,
    pub offers_accepted: u64,
    pub offers_declined: u64,
    pub unknown_items: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_respects_interval() {
        let s = Stats::new(1_000);
        assert!(!s.should_log(5_000, 0));
        assert!(!s.should_log(5_000, 10));
        assert!(s.should_log(11_000, 10));
        s.mark_logged(11_000);
        assert!(!s.should_log(12_000, 10));
    }

    #[test]
    fn snapshot_reflects_counters() {
        let s = Stats::new(0);
        s.inc_message();
        s.inc_message();
        s.inc_offer_evaluated();
        s.inc_offer_declined();
        s.add_unknown_items(3);
        let ss = s.snapshot(4_000);
        assert_eq!(ss.up_sec, 4);
        assert_eq!(ss.messages_seen, 2);
        assert_eq!(ss.offers_declined, 1);
        assert_eq!(ss.unknown_items, 3);
    }
}
