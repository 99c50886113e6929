//! Three stages on three threads, chained by two ring buffers:
//!
//! ```text
//! input --> ring 1 --> working --> ring 2 --> output
//! ```
//!
//! The input stage triggers the shared [`Shutdown`] once its source is
//! exhausted. The other two stages check it between their bounded calls, so
//! anything still queued at that point is left behind, the way the stream
//! demo always behaved.

use core::fmt;
use std::io::{self, BufRead};
use std::panic;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{InputSource, PipelineConfig};
use crate::error::{BufferError, Result};
use crate::frame::Frame;
use crate::ring::{parse_tokens, BoundedRingBuffer, Consumer, Producer, RingInfo};
use crate::shutdown::Shutdown;

/// Counts gathered from one pipeline run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub produced: u64,
    pub worked: u64,
    pub displayed: u64,
    /// Frames turned away by a full ring under `OverflowPolicy::Reject`
    pub input_rejected: u64,
    pub output_rejected: u64,
    pub input_evictions: u64,
    pub output_evictions: u64,
    pub input_stale_reads: u64,
    pub output_stale_reads: u64,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "produced {} worked {} displayed {} | rejected {}/{} | evicted {}/{} | stale {}/{}",
            self.produced,
            self.worked,
            self.displayed,
            self.input_rejected,
            self.output_rejected,
            self.input_evictions,
            self.output_evictions,
            self.input_stale_reads,
            self.output_stale_reads,
        )
    }
}

/// What a producing stage got into its ring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub put: u64,
    pub rejected: u64,
}

impl Delivered {
    // a full ring drops the frame and the stage keeps going
    fn offer(&mut self, producer: &mut Producer<Frame>, frame: Frame) -> Result<()> {
        match producer.put(frame) {
            Ok(()) => self.put += 1,
            Err(BufferError::Full { capacity }) => {
                self.rejected += 1;
                debug!(seq = frame.seq(), capacity, "ring full, frame dropped");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Feed frames into `producer` until `source` runs dry, then trigger `shutdown`.
pub fn input_stage(
    producer: &mut Producer<Frame>,
    source: InputSource,
    delay: Duration,
    shutdown: &Shutdown,
) -> Result<Delivered> {
    info!(?source, "input stage started");
    let res = match source {
        InputSource::Counter(max) => feed_counter(producer, max, delay),
        InputSource::Stdin => feed_lines(producer, io::stdin().lock(), delay),
    };
    // trigger on error too, or the other stages never stop
    shutdown.trigger();
    info!(delivered = ?res.as_ref().ok(), "input stage finished");
    res
}

fn feed_counter(producer: &mut Producer<Frame>, max: u32, delay: Duration) -> Result<Delivered> {
    let mut delivered = Delivered::default();
    for i in 0..max {
        delivered.offer(producer, Frame::new(i, i64::from(i)))?;
        thread::sleep(delay);
    }
    Ok(delivered)
}

fn feed_lines<R: BufRead>(
    producer: &mut Producer<Frame>,
    reader: R,
    delay: Duration,
) -> Result<Delivered> {
    let mut delivered = Delivered::default();
    let mut seq = 0u64;
    for value in parse_tokens::<i64, _>(reader) {
        // Frame keeps the low 24 bits of the sequence number
        delivered.offer(producer, Frame::new(seq as u32, value?))?;
        seq += 1;
        thread::sleep(delay);
    }
    Ok(delivered)
}

/// Take from `input`, double the value, put into `output`
pub fn working_stage(
    input: &mut Consumer<Frame>,
    output: &mut Producer<Frame>,
    delay: Duration,
    shutdown: &Shutdown,
) -> Result<Delivered> {
    info!("working stage started");
    let mut delivered = Delivered::default();
    while !shutdown.is_triggered() {
        let frame = match input.take() {
            Ok(frame) => frame,
            Err(BufferError::Empty) => continue,
            Err(e) => return Err(e),
        };
        thread::sleep(delay);
        delivered.offer(output, frame.advance(frame.value * 2))?;
    }
    info!(worked = delivered.put, rejected = delivered.rejected, "working stage finished");
    Ok(delivered)
}

/// Write `\r<value>` to `out` for every frame taken from `input`
pub fn output_stage<W: fmt::Write>(
    input: &mut Consumer<Frame>,
    delay: Duration,
    shutdown: &Shutdown,
    out: &mut W,
) -> Result<u64> {
    info!("output stage started");
    let mut displayed = 0;
    let mut line = String::new();
    while !shutdown.is_triggered() {
        line.clear();
        line.push('\r');
        match input.pull(&mut line) {
            Ok(_) => {
                out.write_str(&line)?;
                displayed += 1;
            }
            Err(BufferError::Empty) => continue,
            Err(e) => return Err(e),
        }
        thread::sleep(delay);
    }
    info!(displayed, "output stage finished");
    Ok(displayed)
}

pub struct Pipeline;

impl Pipeline {
    /// Build both rings, run the three stages to completion and report
    pub fn run<W: fmt::Write + Send>(config: &PipelineConfig, out: &mut W) -> Result<PipelineReport> {
        let (mut in_tx, mut in_rx) = BoundedRingBuffer::with_config(config.buffer)?.split();
        let (mut out_tx, mut out_rx) = BoundedRingBuffer::with_config(config.buffer)?.split();
        let shutdown = Shutdown::new();
        let delay = config.stage_delay;
        let source = config.input;

        let (input, working, displayed) = thread::scope(|s| {
            let input = s.spawn(|| input_stage(&mut in_tx, source, delay, &shutdown));
            let working = s.spawn(|| working_stage(&mut in_rx, &mut out_tx, delay, &shutdown));
            let output = s.spawn(|| output_stage(&mut out_rx, delay, &shutdown, out));
            (join(input), join(working), join(output))
        });

        let (input, working) = (input?, working?);
        Ok(PipelineReport {
            produced: input.put,
            worked: working.put,
            displayed: displayed?,
            input_rejected: input.rejected,
            output_rejected: working.rejected,
            input_evictions: in_tx.evictions(),
            output_evictions: out_tx.evictions(),
            input_stale_reads: in_rx.stale_reads(),
            output_stale_reads: out_rx.stale_reads(),
        })
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|e| panic::resume_unwind(e))
}
