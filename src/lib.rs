//! Bounded single-producer/single-consumer ring buffer with timed waits,
//! plus the three-thread stream pipeline that runs on top of it.
//!
//! ```
//! use bounded_stream::{bounded, RingInfo};
//!
//! let (mut p, mut c) = bounded::<u32>(4).unwrap();
//! for v in 0..6 {
//!     p.put(v).unwrap();
//! }
//! // 0 and 1 were evicted to make room
//! assert_eq!(p.evictions(), 2);
//! assert_eq!(c.take().unwrap(), 2);
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod policy;
pub mod ring;
pub mod shutdown;

pub use config::{BufferConfig, InputSource, PipelineConfig};
pub use error::{BufferError, Result};
pub use frame::{Frame, FrameHeader, Stage};
pub use pipeline::{Delivered, Pipeline, PipelineReport};
pub use policy::{OverflowPolicy, UnderflowPolicy};
pub use ring::{bounded, parse_tokens, BoundedRingBuffer, Consumer, Producer, RingInfo};
pub use shutdown::Shutdown;
