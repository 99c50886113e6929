use std::time::Duration;

use crate::error::{BufferError, Result};
use crate::policy::{OverflowPolicy, UnderflowPolicy};

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(4);
pub const DEFAULT_INPUT_MAX: u32 = 10_000;
pub const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(8);

/// Construction parameters of one ring buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Slot count, fixed for the lifetime of the buffer
    pub capacity: usize,
    /// Upper bound on each condition wait in `put`/`take`
    pub wait_timeout: Duration,
    pub overflow: OverflowPolicy,
    pub underflow: UnderflowPolicy,
}

impl BufferConfig {
    pub const fn new(capacity: usize) -> Self {
        BufferConfig {
            capacity,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            overflow: OverflowPolicy::EvictOldest,
            underflow: UnderflowPolicy::ReturnStale,
        }
    }

    pub const fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub const fn with_underflow(mut self, underflow: UnderflowPolicy) -> Self {
        self.underflow = underflow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Where the input stage gets its values from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Count from 0 up to (not including) the given bound
    Counter(u32),
    /// Whitespace separated integers read from stdin until EOF
    Stdin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Shared by both buffers of the pipeline
    pub buffer: BufferConfig,
    pub input: InputSource,
    /// Sleep after each step of every stage
    pub stage_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            buffer: BufferConfig::default(),
            input: InputSource::Counter(DEFAULT_INPUT_MAX),
            stage_delay: DEFAULT_STAGE_DELAY,
        }
    }
}
