//! Relay statistics
//!
//! Lock-free counters updated on the publish path and exposed as plain
//! snapshots through the status endpoint.

pub mod metrics;

pub use metrics::{RelaySnapshot, RelayStats};
