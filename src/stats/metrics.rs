//! Throughput counters for the frame relay

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Point-in-time view of the relay counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelaySnapshot {
    /// Frames accepted from publishers
    pub frames_received: u64,
    /// Total payload bytes accepted
    pub bytes_received: u64,
    /// Per-viewer deliveries (one frame sent to three viewers counts three)
    pub frames_delivered: u64,
    /// Frames dropped because a viewer mailbox was full
    pub frames_dropped: u64,
    /// Currently registered viewers
    pub viewers: usize,
    /// Viewers ever registered
    pub viewers_total: u64,
}

/// Atomic counters updated on the hot path
///
/// All loads and stores are `Relaxed`. The counters are monotonic and only
/// read for reporting, so no ordering between them is required.
#[derive(Debug, Default)]
pub struct RelayStats {
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
    viewers: AtomicUsize,
    viewers_total: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted frame and its payload size
    pub fn record_frame(&self, bytes: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record how many viewer mailboxes accepted a frame
    pub fn record_delivered(&self, count: usize) {
        if count > 0 {
            self.frames_delivered
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Record a frame discarded because a mailbox was full
    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn viewer_connected(&self) {
        self.viewers.fetch_add(1, Ordering::Relaxed);
        self.viewers_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn viewer_disconnected(&self) {
        self.viewers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Read all counters into a plain snapshot
    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            viewers: self.viewers.load(Ordering::Relaxed),
            viewers_total: self.viewers_total.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_at_zero() {
        let stats = RelayStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.frames_received, 0);
        assert_eq!(snap.bytes_received, 0);
        assert_eq!(snap.frames_delivered, 0);
        assert_eq!(snap.frames_dropped, 0);
        assert_eq!(snap.viewers, 0);
        assert_eq!(snap.viewers_total, 0);
    }

    #[test]
    fn test_frame_counters() {
        let stats = RelayStats::new();
        stats.record_frame(1024);
        stats.record_frame(2048);
        stats.record_delivered(3);
        stats.record_delivered(0);
        stats.record_dropped();

        let snap = stats.snapshot();
        assert_eq!(snap.frames_received, 2);
        assert_eq!(snap.bytes_received, 3072);
        assert_eq!(snap.frames_delivered, 3);
        assert_eq!(snap.frames_dropped, 1);
    }

    #[test]
    fn test_viewer_gauge_and_total() {
        let stats = RelayStats::new();
        stats.viewer_connected();
        stats.viewer_connected();
        stats.viewer_disconnected();

        let snap = stats.snapshot();
        assert_eq!(snap.viewers, 1);
        assert_eq!(snap.viewers_total, 2);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let stats = RelayStats::new();
        stats.record_frame(10);

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["frames_received"], 1);
        assert_eq!(json["bytes_received"], 10);
    }
}
