//! Viewer handle and mailbox
//!
//! This module defines the consumer side of the relay: a handle that owns
//! the receiving half of a registered mailbox and unregisters itself when
//! dropped.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;

use super::hub::FrameHub;

/// Handle for a registered viewer
///
/// Each viewer owns a private bounded mailbox. Frames published to the hub
/// are pushed into the mailbox without blocking the publisher; a full
/// mailbox drops the incoming frame for this viewer only.
///
/// Dropping the handle unregisters the viewer, so every exit path of a
/// consumer task (including cancellation) removes it from the fan-out set.
pub struct Viewer {
    id: u64,
    rx: mpsc::Receiver<Bytes>,
    hub: Arc<FrameHub>,
}

impl Viewer {
    pub(super) fn new(id: u64, rx: mpsc::Receiver<Bytes>, hub: Arc<FrameHub>) -> Self {
        Self { id, rx, hub }
    }

    /// Get the viewer's registration id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next frame
    ///
    /// Suspends until a frame arrives. Returns `None` once the viewer has
    /// been unregistered from the hub.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Receive a frame without suspending
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Viewer {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer").field("id", &self.id).finish()
    }
}
