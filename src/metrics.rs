//! Network traffic counters
//!
//! Updated lock-free from both the receiver thread and the simulation tick;
//! the binary logs a snapshot periodically.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one synchronizer
#[derive(Debug, Default)]
pub struct NetMetrics {
    pub datagrams_sent: AtomicU64,
    pub datagrams_received: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    /// Payloads that failed to decode
    pub decode_failures: AtomicU64,
    /// Well-formed datagrams of the wrong kind or from an unexpected peer
    pub ignored: AtomicU64,
    /// Unread mailbox values replaced by newer ones
    pub overwritten: AtomicU64,
    pub send_failures: AtomicU64,
}

/// Plain copy of the counters at one moment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetMetricsSnapshot {
    pub datagrams_sent: u64,
    pub datagrams_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub decode_failures: u64,
    pub ignored: u64,
    pub overwritten: u64,
    pub send_failures: u64,
}

impl NetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self, bytes: usize) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_received(&self, bytes: usize) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> NetMetricsSnapshot {
        NetMetricsSnapshot {
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}
