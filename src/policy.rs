//! What the ring does when a bounded wait gives up.

use clap::ValueEnum;

/// Behavior of `put` when the buffer is still full after the wait timeout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OverflowPolicy {
    /// Drop the oldest unread element and store the new one. Never fails.
    #[default]
    EvictOldest,
    /// Leave the buffer untouched and report `BufferError::Full`.
    Reject,
}

/// Behavior of `take` when the buffer is still empty after the wait timeout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UnderflowPolicy {
    /// Hand back the last delivered element again.
    #[default]
    ReturnStale,
    /// Report `BufferError::Empty`.
    Reject,
}
