use std::{fmt, io};

use thiserror::Error;

pub type Result<T> = core::result::Result<T, BufferError>;

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("ring buffer capacity must be greater than zero")]
    ZeroCapacity,

    /// Only produced under `OverflowPolicy::Reject`
    #[error("ring buffer still full after waiting ({capacity} slots)")]
    Full { capacity: usize },

    /// Nothing arrived within the wait timeout and there was nothing stale to hand back
    #[error("no element available")]
    Empty,

    #[error("cannot parse input token `{token}`")]
    Parse { token: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Format(#[from] fmt::Error),
}
