//! Fixed capacity SPSC ring buffer with bounded (timed) blocking on both ends.
//!
//! The buffer is built once, then split into a [`Producer`] and a [`Consumer`].
//! Neither handle can be cloned and both blocking operations take `&mut self`,
//! so a buffer instance can only ever have one writer and one reader.
//!
//! Neither side blocks forever. `put` waits at most `wait_timeout` for room and
//! then applies the [`OverflowPolicy`]; `take` waits at most `wait_timeout` for
//! an element and then applies the [`UnderflowPolicy`]. Callers poll a shutdown
//! signal between calls.

use core::fmt;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use sealed::sealed;
use tracing::{debug, trace};

use crate::config::BufferConfig;
use crate::error::{BufferError, Result};
use crate::policy::{OverflowPolicy, UnderflowPolicy};

/// Cursor into the backing store, always within [0, capacity)
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
struct Index(usize);

impl Index {
    #[inline]
    fn wrap_inc(&mut self, capacity: usize) {
        let val = self.0 + 1;
        self.0 = if val == capacity { 0 } else { val };
    }

    #[inline]
    fn get(&self) -> usize {
        self.0
    }
}

// Everything the lock protects. The producer moves `head` too when it evicts,
// so all of it sits behind the one mutex.
struct State<T> {
    // this is the backend array, a slot is None once its element moved out
    storage: Box<[Option<T>]>,
    // this is from where we dequeue items
    head: Index,
    // where we enqueue new items
    tail: Index,
    count: usize,
    evictions: u64,
}

/// The shared core. Use [`BoundedRingBuffer::split`] to get the two handles.
pub struct BoundedRingBuffer<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    stale_reads: AtomicU64,
    config: BufferConfig,
}

impl<T> BoundedRingBuffer<T> {
    pub fn new(capacity: usize, wait_timeout: Duration) -> Result<Self> {
        Self::with_config(BufferConfig::new(capacity).with_wait_timeout(wait_timeout))
    }

    pub fn with_config(config: BufferConfig) -> Result<Self> {
        config.validate()?;
        let storage = (0..config.capacity).map(|_| None).collect();
        Ok(BoundedRingBuffer {
            state: Mutex::new(State {
                storage,
                head: Index::default(),
                tail: Index::default(),
                count: 0,
                evictions: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            stale_reads: AtomicU64::new(0),
            config,
        })
    }

    /// Hand out the only producer and the only consumer of this buffer
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let ring = Arc::new(self);
        (
            Producer { ring: Arc::clone(&ring) },
            Consumer { ring, last: None },
        )
    }

    fn put(&self, value: T) -> Result<()> {
        let capacity = self.config.capacity;
        let mut state = self.state.lock();

        // best effort: the wait is abandoned once wait_timeout elapses
        let waited = self.not_full.wait_while_for(
            &mut state,
            |s| s.count == capacity,
            self.config.wait_timeout,
        );

        if state.count == capacity {
            match self.config.overflow {
                OverflowPolicy::Reject => {
                    trace!(capacity, timed_out = waited.timed_out(), "put rejected, ring full");
                    return Err(BufferError::Full { capacity });
                }
                OverflowPolicy::EvictOldest => {
                    let head = state.head.get();
                    // dropped while still locked, the slot is overwritten below
                    let _evicted = state.storage[head].take();
                    state.head.wrap_inc(capacity);
                    state.evictions += 1;
                    debug!(capacity, evictions = state.evictions, "ring full, evicted oldest element");
                }
            }
        } else {
            state.count += 1;
        }

        let tail = state.tail.get();
        state.storage[tail] = Some(value);
        state.tail.wrap_inc(capacity);

        self.not_empty.notify_one();
        Ok(())
    }

    // None when nothing arrived within wait_timeout
    fn take_slot(&self) -> Option<T> {
        let capacity = self.config.capacity;
        let mut state = self.state.lock();

        let waited = self.not_empty.wait_while_for(
            &mut state,
            |s| s.count == 0,
            self.config.wait_timeout,
        );

        if state.count == 0 {
            trace!(timed_out = waited.timed_out(), "take found the ring empty");
            return None;
        }

        let head = state.head.get();
        let value = state.storage[head].take();
        state.head.wrap_inc(capacity);
        state.count -= 1;

        self.not_full.notify_one();
        value
    }

    fn len(&self) -> usize {
        self.state.lock().count
    }

    fn evictions(&self) -> u64 {
        self.state.lock().evictions
    }
}

impl<T> fmt::Debug for BoundedRingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedRingBuffer")
            .field("capacity", &self.config.capacity)
            .field("head", &state.head.get())
            .field("tail", &state.tail.get())
            .field("count", &state.count)
            .field("evictions", &state.evictions)
            .finish()
    }
}

/// Build a buffer with the default wait timeout and split it right away
pub fn bounded<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
    Ok(BoundedRingBuffer::with_config(BufferConfig::new(capacity))?.split())
}

/// Whitespace separated tokens of `reader`, each parsed as `T`.
/// A bad token yields `BufferError::Parse`, a failed read `BufferError::Io`.
pub fn parse_tokens<T: FromStr, R: BufRead>(reader: R) -> impl Iterator<Item = Result<T>> {
    reader.lines().flat_map(|line| -> Vec<Result<T>> {
        match line {
            Ok(line) => line
                .split_whitespace()
                .map(|token| {
                    token.parse::<T>().map_err(|_| BufferError::Parse {
                        token: token.to_owned(),
                    })
                })
                .collect(),
            Err(e) => vec![Err(e.into())],
        }
    })
}

/// Read-only view shared by both ends of a ring
#[sealed]
pub trait RingInfo {
    fn capacity(&self) -> usize;

    /// Number of unread elements, a snapshot taken under the lock
    fn len(&self) -> usize;

    fn wait_timeout(&self) -> Duration;

    /// Elements dropped by `OverflowPolicy::EvictOldest` so far
    fn evictions(&self) -> u64;

    /// Stale elements handed out by `UnderflowPolicy::ReturnStale` so far
    fn stale_reads(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}

/// Writing end of a [`BoundedRingBuffer`]
#[derive(Debug)]
pub struct Producer<T> {
    ring: Arc<BoundedRingBuffer<T>>,
}

impl<T> Producer<T> {
    /// Store `value`, waiting up to the wait timeout for room.
    ///
    /// When the buffer is still full afterwards, `EvictOldest` drops the
    /// oldest unread element (this call then never fails) and `Reject` returns
    /// `BufferError::Full`, dropping `value`.
    pub fn put(&mut self, value: T) -> Result<()> {
        self.ring.put(value)
    }

    /// Chaining form of [`Producer::put`]
    pub fn push(&mut self, value: T) -> Result<&mut Self> {
        self.put(value)?;
        Ok(self)
    }

    /// Parse whitespace separated tokens from `reader` and put each one.
    /// Returns how many values were put.
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> Result<usize>
    where
        T: FromStr,
    {
        let mut n = 0;
        for value in parse_tokens::<T, R>(reader) {
            self.put(value?)?;
            n += 1;
        }
        Ok(n)
    }
}

/// Reading end of a [`BoundedRingBuffer`]
#[derive(Debug)]
pub struct Consumer<T> {
    ring: Arc<BoundedRingBuffer<T>>,
    // last element handed out by take(), kept for ReturnStale
    last: Option<T>,
}

impl<T> Consumer<T> {
    /// Move the oldest element out, waiting up to the wait timeout.
    /// Returns `None` on timeout, never a stale element.
    pub fn poll(&mut self) -> Option<T> {
        self.ring.take_slot()
    }
}

impl<T: Clone> Consumer<T> {
    /// Move the oldest element out, waiting up to the wait timeout.
    ///
    /// If the buffer is still empty afterwards, `ReturnStale` hands back a
    /// copy of the previously taken element and `Reject` returns
    /// `BufferError::Empty`. `ReturnStale` also returns `Empty` when nothing
    /// has been taken yet.
    pub fn take(&mut self) -> Result<T> {
        let underflow = self.ring.config.underflow;
        match self.ring.take_slot() {
            Some(value) => {
                if underflow == UnderflowPolicy::ReturnStale {
                    self.last = Some(value.clone());
                }
                Ok(value)
            }
            None => match (underflow, &self.last) {
                (UnderflowPolicy::ReturnStale, Some(last)) => {
                    let reads = self.ring.stale_reads.fetch_add(1, Ordering::Relaxed) + 1;
                    trace!(stale_reads = reads, "ring empty, returning stale element");
                    Ok(last.clone())
                }
                _ => Err(BufferError::Empty),
            },
        }
    }

    /// [`Consumer::take`] and write the element to `out`
    pub fn pull<W: fmt::Write>(&mut self, out: &mut W) -> Result<T>
    where
        T: fmt::Display,
    {
        let value = self.take()?;
        write!(out, "{value}")?;
        Ok(value)
    }
}

#[sealed]
impl<T> RingInfo for Producer<T> {
    fn capacity(&self) -> usize {
        self.ring.config.capacity
    }
    fn len(&self) -> usize {
        self.ring.len()
    }
    fn wait_timeout(&self) -> Duration {
        self.ring.config.wait_timeout
    }
    fn evictions(&self) -> u64 {
        self.ring.evictions()
    }
    fn stale_reads(&self) -> u64 {
        self.ring.stale_reads.load(Ordering::Relaxed)
    }
}

#[sealed]
impl<T> RingInfo for Consumer<T> {
    fn capacity(&self) -> usize {
        self.ring.config.capacity
    }
    fn len(&self) -> usize {
        self.ring.len()
    }
    fn wait_timeout(&self) -> Duration {
        self.ring.config.wait_timeout
    }
    fn evictions(&self) -> u64 {
        self.ring.evictions()
    }
    fn stale_reads(&self) -> u64 {
        self.ring.stale_reads.load(Ordering::Relaxed)
    }
}
