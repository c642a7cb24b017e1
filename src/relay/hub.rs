//! Frame hub implementation
//!
//! The central registry that accepts frames from publishers and fans them
//! out to per-viewer mailboxes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::stats::RelayStats;

use super::error::PublishError;
use super::viewer::Viewer;

/// Default mailbox capacity for new viewers
///
/// A viewer that falls more than this many frames behind the camera starts
/// losing the newest frames until it drains its mailbox. At typical camera
/// rates this is under a second of buffered video.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

/// Central fan-out point between frame publishers and viewers
///
/// The hub keeps one bounded mailbox per registered viewer. Publishing
/// never suspends and never waits for slow viewers: a full mailbox drops
/// the incoming frame for that viewer only, and delivery to the others
/// proceeds unaffected.
///
/// The viewer table is guarded by a `parking_lot::Mutex` held only for
/// table updates and the non-blocking send loop, so `publish` is callable
/// from async context without yielding.
pub struct FrameHub {
    /// Map of viewer id to the sending half of its mailbox
    viewers: Mutex<HashMap<u64, mpsc::Sender<Bytes>>>,

    /// Next viewer registration id
    next_viewer_id: AtomicU64,

    /// Mailbox capacity used by `register`
    mailbox_capacity: usize,

    /// Throughput counters
    stats: RelayStats,
}

impl FrameHub {
    /// Create a new hub with the default mailbox capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a new hub with a custom default mailbox capacity
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            viewers: Mutex::new(HashMap::new()),
            next_viewer_id: AtomicU64::new(1),
            mailbox_capacity: capacity.max(1),
            stats: RelayStats::new(),
        }
    }

    /// Get the default mailbox capacity
    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }

    /// Register a viewer with the default mailbox capacity
    pub fn register(self: &Arc<Self>) -> Viewer {
        self.register_with_capacity(self.mailbox_capacity)
    }

    /// Register a viewer with a custom mailbox capacity
    ///
    /// The returned handle unregisters itself when dropped, so a viewer
    /// task that is cancelled mid-receive still leaves the fan-out set.
    pub fn register_with_capacity(self: &Arc<Self>, capacity: usize) -> Viewer {
        let capacity = capacity.max(1);
        let id = self.next_viewer_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(capacity);

        self.viewers.lock().insert(id, tx);
        self.stats.viewer_connected();

        tracing::info!(viewer = id, capacity, "Viewer registered");

        Viewer::new(id, rx, Arc::clone(self))
    }

    /// Remove a viewer from the fan-out set
    ///
    /// Idempotent: unregistering an unknown or already removed id is a
    /// no-op. Dropping the sender also wakes a pending `Viewer::recv`,
    /// which then returns `None`.
    pub fn unregister(&self, id: u64) {
        let removed = self.viewers.lock().remove(&id).is_some();

        if removed {
            self.stats.viewer_disconnected();
            tracing::info!(viewer = id, "Viewer unregistered");
        }
    }

    /// Publish a frame to every registered viewer
    ///
    /// Returns the number of mailboxes that accepted the frame. Viewers
    /// with full mailboxes miss this frame; the publisher is never blocked
    /// or failed on their behalf. Empty frames are rejected.
    ///
    /// The payload is reference-counted, so fan-out shares one allocation
    /// across all viewers.
    pub fn publish(&self, frame: Bytes) -> Result<usize, PublishError> {
        if frame.is_empty() {
            return Err(PublishError::EmptyFrame);
        }

        self.stats.record_frame(frame.len());

        let mut delivered = 0;
        let mut closed: Vec<u64> = Vec::new();

        {
            let viewers = self.viewers.lock();
            for (&id, tx) in viewers.iter() {
                match tx.try_send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        self.stats.record_dropped();
                        tracing::debug!(viewer = id, "Viewer mailbox full, frame dropped");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(id),
                }
            }
        }

        // A closed mailbox means the receiving half is gone without an
        // unregister call. Prune it like an explicit unregister.
        for id in closed {
            tracing::warn!(viewer = id, "Viewer mailbox closed, pruning");
            self.unregister(id);
        }

        self.stats.record_delivered(delivered);

        Ok(delivered)
    }

    /// Get the number of registered viewers
    pub fn viewer_count(&self) -> usize {
        self.viewers.lock().len()
    }

    /// Get the relay counters
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }
}

impl Default for FrameHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHub")
            .field("viewers", &self.viewer_count())
            .field("mailbox_capacity", &self.mailbox_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use futures_util::StreamExt;

    use super::*;

    fn jpeg(tag: u8) -> Bytes {
        Bytes::from(vec![0xFF, 0xD8, 0xFF, 0xE0, tag, 0xFF, 0xD9])
    }

    #[tokio::test]
    async fn test_publish_reaches_all_viewers() {
        let hub = Arc::new(FrameHub::new());
        let mut a = hub.register();
        let mut b = hub.register();

        let frame = jpeg(1);
        let delivered = hub.publish(frame.clone()).unwrap();
        assert_eq!(delivered, 2);

        let got_a = a.recv().await.unwrap();
        let got_b = b.recv().await.unwrap();
        assert_eq!(got_a, frame);
        assert_eq!(got_b, frame);

        // Fan-out shares the allocation rather than copying the payload
        assert_eq!(got_a.as_ptr(), frame.as_ptr());
        assert_eq!(got_b.as_ptr(), frame.as_ptr());

        // Exactly one copy per viewer
        assert!(a.try_recv().is_none());
        assert!(b.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_unregistered_viewer_excluded_from_fanout() {
        let hub = Arc::new(FrameHub::new());
        let a = hub.register();
        let mut b = hub.register();
        assert_eq!(hub.viewer_count(), 2);

        drop(a);
        assert_eq!(hub.viewer_count(), 1);

        let delivered = hub.publish(jpeg(2)).unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(b.recv().await.unwrap(), jpeg(2));
    }

    #[tokio::test]
    async fn test_empty_frame_rejected() {
        let hub = Arc::new(FrameHub::new());
        let mut viewer = hub.register();

        let result = hub.publish(Bytes::new());
        assert_eq!(result, Err(PublishError::EmptyFrame));

        // Nothing was delivered and nothing was counted
        assert!(viewer.try_recv().is_none());
        assert_eq!(hub.stats().snapshot().frames_received, 0);
    }

    #[tokio::test]
    async fn test_full_mailbox_drops_newest_frame() {
        let hub = Arc::new(FrameHub::new());
        let mut viewer = hub.register_with_capacity(1);

        // Second publish finds the mailbox full and is dropped for this
        // viewer; the publisher still gets a success
        assert_eq!(hub.publish(jpeg(1)).unwrap(), 1);
        assert_eq!(hub.publish(jpeg(2)).unwrap(), 0);

        // The mailbox holds the first frame, not the second
        assert_eq!(viewer.recv().await.unwrap(), jpeg(1));
        assert!(viewer.try_recv().is_none());

        // Once drained, delivery resumes
        assert_eq!(hub.publish(jpeg(3)).unwrap(), 1);
        assert_eq!(viewer.recv().await.unwrap(), jpeg(3));

        assert_eq!(hub.stats().snapshot().frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_publish_does_not_block_on_stalled_viewer() {
        let hub = Arc::new(FrameHub::new());
        let _stalled = hub.register_with_capacity(1);

        let start = Instant::now();
        for i in 0..100 {
            hub.publish(jpeg(i)).unwrap();
        }
        assert!(start.elapsed().as_secs() < 1);

        let snap = hub.stats().snapshot();
        assert_eq!(snap.frames_received, 100);
        assert_eq!(snap.frames_delivered, 1);
        assert_eq!(snap.frames_dropped, 99);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let hub = Arc::new(FrameHub::new());
        let viewer = hub.register();
        let id = viewer.id();

        hub.unregister(id);
        hub.unregister(id);
        assert_eq!(hub.viewer_count(), 0);

        // The drop guard fires a third time with no effect
        drop(viewer);
        let snap = hub.stats().snapshot();
        assert_eq!(snap.viewers, 0);
        assert_eq!(snap.viewers_total, 1);
    }

    #[tokio::test]
    async fn test_unregister_ends_pending_recv() {
        let hub = Arc::new(FrameHub::new());
        let mut viewer = hub.register();

        hub.unregister(viewer.id());
        assert!(viewer.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_delivery_order_preserved() {
        let hub = Arc::new(FrameHub::new());
        let mut viewer = hub.register();

        hub.publish(jpeg(1)).unwrap();
        hub.publish(jpeg(2)).unwrap();
        hub.publish(jpeg(3)).unwrap();

        assert_eq!(viewer.recv().await.unwrap(), jpeg(1));
        assert_eq!(viewer.recv().await.unwrap(), jpeg(2));
        assert_eq!(viewer.recv().await.unwrap(), jpeg(3));
    }

    #[tokio::test]
    async fn test_viewer_stream_yields_frames() {
        let hub = Arc::new(FrameHub::new());
        let mut viewer = hub.register();

        hub.publish(jpeg(7)).unwrap();
        assert_eq!(viewer.next().await.unwrap(), jpeg(7));

        // Stream terminates after unregistration
        hub.unregister(viewer.id());
        assert!(viewer.next().await.is_none());
    }

    #[tokio::test]
    async fn test_zero_capacity_clamped_to_one() {
        let hub = Arc::new(FrameHub::with_capacity(0));
        assert_eq!(hub.mailbox_capacity(), 1);

        let mut viewer = hub.register_with_capacity(0);
        assert_eq!(hub.publish(jpeg(1)).unwrap(), 1);
        assert_eq!(viewer.recv().await.unwrap(), jpeg(1));
    }

    #[tokio::test]
    async fn test_viewer_gauge_tracks_registrations() {
        let hub = Arc::new(FrameHub::new());
        let a = hub.register();
        let b = hub.register();
        assert_eq!(hub.stats().snapshot().viewers, 2);

        drop(a);
        drop(b);
        let snap = hub.stats().snapshot();
        assert_eq!(snap.viewers, 0);
        assert_eq!(snap.viewers_total, 2);
    }
}
