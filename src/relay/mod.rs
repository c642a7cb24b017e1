//! Frame relay for camera-to-viewer fan-out
//!
//! The relay accepts JPEG frames from camera publishers and fans each one
//! out to all registered viewers. Every viewer owns a private bounded
//! mailbox (`tokio::sync::mpsc`), so one stalled viewer cannot slow the
//! camera down or starve the others.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<FrameHub>
//!                   ┌──────────────────────────┐
//!                   │ viewers: HashMap<u64,    │
//!                   │   mpsc::Sender<Bytes>    │
//!                   │ >                        │
//!                   └────────────┬─────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Publisher]             [Viewer]                [Viewer]
//!   hub.publish()           viewer.recv()           viewer.recv()
//!        │                       │                       │
//!        └──► try_send per mailbox ──► multipart part ──► HTTP
//! ```
//!
//! # Zero-Copy Design
//!
//! Frames are `bytes::Bytes`, so fan-out clones a reference count rather
//! than the payload. All viewers share one allocation per frame.
//!
//! # Overrun Policy
//!
//! `publish` uses `try_send` and never waits. When a viewer's mailbox is
//! full the incoming frame is dropped for that viewer: the mailbox keeps
//! the oldest undelivered frames and loses the newest. Drops are counted
//! per viewer miss in the relay stats.

pub mod error;
pub mod hub;
pub mod viewer;

pub use error::PublishError;
pub use hub::{FrameHub, DEFAULT_MAILBOX_CAPACITY};
pub use viewer::Viewer;
