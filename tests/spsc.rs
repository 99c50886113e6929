use std::thread;
use std::time::{Duration, Instant};

use bounded_stream::{BoundedRingBuffer, BufferConfig, OverflowPolicy, RingInfo, Shutdown};

#[test]
fn take_on_empty_ring_returns_after_timeout() {
    let timeout = Duration::from_millis(20);
    let (_p, mut c) = BoundedRingBuffer::<u32>::new(4, timeout).unwrap().split();

    let start = Instant::now();
    assert!(c.take().is_err());
    assert!(c.poll().is_none());
    let elapsed = start.elapsed();
    assert!(elapsed >= timeout, "returned before waiting: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "blocked too long: {elapsed:?}");
}

#[test]
fn put_on_full_ring_returns_after_timeout() {
    let timeout = Duration::from_millis(20);
    let (mut p, _c) = BoundedRingBuffer::new(2, timeout).unwrap().split();
    p.put(1u32).unwrap();
    p.put(2).unwrap();

    let start = Instant::now();
    p.put(3).unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= timeout, "returned before waiting: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "blocked too long: {elapsed:?}");
    assert_eq!(p.evictions(), 1);
}

#[test]
fn waiting_put_is_woken_by_take() {
    let cfg = BufferConfig::new(1)
        .with_wait_timeout(Duration::from_secs(5))
        .with_overflow(OverflowPolicy::Reject);
    let (mut p, mut c) = BoundedRingBuffer::with_config(cfg).unwrap().split();
    p.put(1u32).unwrap();

    let consumer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        let first = c.take().unwrap();
        let second = c.take().unwrap();
        (first, second)
    });

    // blocks until the consumer makes room, well within the 5s bound
    let start = Instant::now();
    p.put(2).unwrap();
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(consumer.join().unwrap(), (1, 2));
}

fn stress_increasing_subsequence(capacity: usize) {
    const N: u64 = 20_000;
    let (mut p, mut c) = BoundedRingBuffer::new(capacity, Duration::from_millis(1))
        .unwrap()
        .split();
    let done = Shutdown::new();

    let producer = {
        let done = done.clone();
        thread::spawn(move || {
            for i in 0..N {
                p.put(i).unwrap();
            }
            done.trigger();
            p
        })
    };

    let consumer = thread::spawn(move || {
        let mut seen = Vec::new();
        loop {
            match c.poll() {
                Some(v) => seen.push(v),
                None if done.is_triggered() => {
                    while let Some(v) = c.poll() {
                        seen.push(v);
                    }
                    break;
                }
                None => {}
            }
            if seen.len() % 64 == 0 {
                thread::yield_now();
            }
        }
        seen
    });

    let p = producer.join().unwrap();
    let seen = consumer.join().unwrap();

    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert!(seen.iter().all(|&v| v < N));
    assert_eq!(seen.len() as u64, N - p.evictions());
    assert_eq!(seen.last(), Some(&(N - 1)));
}

#[test]
fn concurrent_stress_yields_increasing_subsequence() {
    stress_increasing_subsequence(8);
}

#[test]
fn concurrent_stress_with_a_single_slot() {
    stress_increasing_subsequence(1);
}

#[test]
fn equal_pace_loses_nothing() {
    const N: u32 = 10_000;
    let delay = Duration::from_micros(20);
    // long wait so a briefly descheduled consumer never triggers an eviction
    let (mut p, mut c) = BoundedRingBuffer::new(100, Duration::from_millis(500))
        .unwrap()
        .split();

    let producer = thread::spawn(move || {
        for i in 0..N {
            p.put(i).unwrap();
            thread::sleep(delay);
        }
        p
    });

    let consumer = thread::spawn(move || {
        let mut seen = Vec::with_capacity(N as usize);
        while seen.len() < N as usize {
            if let Some(v) = c.poll() {
                seen.push(v);
                thread::sleep(delay);
            }
        }
        seen
    });

    let p = producer.join().unwrap();
    let seen = consumer.join().unwrap();
    assert_eq!(p.evictions(), 0);
    assert_eq!(seen, (0..N).collect::<Vec<_>>());
}
