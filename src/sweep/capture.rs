//! Bounded capture of `source -> channel` into a fixed-size buffer.
//!
//! A producer thread pulls from the source, runs the channel and forwards
//! chunks over a bounded queue. The caller waits with a deadline and a
//! cancellation token; the producer is stopped and joined on every exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};
use num_complex::Complex32;
use tracing::{debug, warn};

use crate::channel::{ChannelChain, ChannelModel};
use crate::error::{SweepError, SweepResult};
use crate::source::WaveformSource;
use crate::utils::consts::{
    CHUNK_LEN, POLL_INTERVAL_MS, STALL_BACKOFF_MS, STREAM_QUEUE_DEPTH,
};

/// Shared flag that asks in-flight jobs to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capture exactly `capacity` impaired samples, or fail with
/// `CaptureTimeout`, `Cancelled` or `StreamClosed`.
pub fn capture(
    source: Box<dyn WaveformSource>,
    channel: ChannelChain,
    capacity: usize,
    timeout: Duration,
    cancel: &CancelToken,
) -> SweepResult<Vec<Complex32>> {
    let (tx, rx) = crossbeam_channel::bounded::<Vec<Complex32>>(STREAM_QUEUE_DEPTH);
    let stop = Arc::new(AtomicBool::new(false));

    let producer_stop = stop.clone();
    let handle = thread::spawn(move || {
        produce(source, channel, tx, producer_stop, capacity)
    });

    let started = Instant::now();
    let deadline = started + timeout;
    let poll = Duration::from_millis(POLL_INTERVAL_MS);
    let mut captured: Vec<Complex32> = Vec::with_capacity(capacity);

    let outcome = loop {
        if captured.len() >= capacity {
            break Ok(());
        }
        if cancel.is_cancelled() {
            break Err(SweepError::Cancelled {
                captured: captured.len(),
            });
        }
        let now = Instant::now();
        if now >= deadline {
            break Err(SweepError::CaptureTimeout {
                captured: captured.len(),
                capacity,
                waited: now - started,
            });
        }

        match rx.recv_timeout(poll.min(deadline - now)) {
            Ok(chunk) => captured.extend(chunk),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                break Err(SweepError::StreamClosed {
                    captured: captured.len(),
                    capacity,
                });
            }
        }
    };

    stop.store(true, Ordering::SeqCst);
    // unblocks a producer waiting on a full queue
    drop(rx);
    if handle.join().is_err() {
        warn!("Capture producer panicked");
    }

    outcome.map(|()| {
        debug!("Captured {} samples in {:?}", captured.len(), started.elapsed());
        captured
    })
}

fn produce(
    mut source: Box<dyn WaveformSource>,
    mut channel: ChannelChain,
    tx: Sender<Vec<Complex32>>,
    stop: Arc<AtomicBool>,
    capacity: usize,
) {
    let mut raw = vec![Complex32::new(0.0, 0.0); CHUNK_LEN];
    let mut sent = 0;

    while sent < capacity && !stop.load(Ordering::SeqCst) {
        let produced = source.work(&mut raw);
        if produced == 0 {
            thread::sleep(Duration::from_millis(STALL_BACKOFF_MS));
            continue;
        }

        let mut chunk = Vec::with_capacity(produced + 2);
        channel.process(&raw[..produced], &mut chunk);
        chunk.truncate(capacity - sent);
        if chunk.is_empty() {
            continue;
        }
        sent += chunk.len();
        if tx.send(chunk).is_err() {
            break;
        }
    }
    debug!("Producer for '{}' stopping after {} samples", source.label(), sent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKind;

    /// Counts upward forever.
    struct Counter {
        next: f32,
    }

    impl WaveformSource for Counter {
        fn label(&self) -> &str {
            "counter"
        }

        fn work(&mut self, out: &mut [Complex32]) -> usize {
            for s in out.iter_mut() {
                *s = Complex32::new(self.next, 0.0);
                self.next += 1.0;
            }
            out.len()
        }
    }

    /// Produces `limit` samples, then nothing.
    struct Stalling {
        remaining: usize,
    }

    impl WaveformSource for Stalling {
        fn label(&self) -> &str {
            "stalling"
        }

        fn work(&mut self, out: &mut [Complex32]) -> usize {
            let n = out.len().min(self.remaining);
            out[..n].fill(Complex32::new(1.0, 0.0));
            self.remaining -= n;
            n
        }
    }

    fn passthrough() -> ChannelChain {
        ChannelKind::None.build(0.0, 0)
    }

    #[test]
    fn test_captures_exact_capacity_in_order() {
        let samples = capture(
            Box::new(Counter { next: 0.0 }),
            passthrough(),
            10_000,
            Duration::from_secs(10),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(samples.len(), 10_000);
        assert_eq!(samples[0].re, 0.0);
        assert_eq!(samples[9_999].re, 9_999.0);
    }

    #[test]
    fn test_stalled_source_times_out() {
        let err = capture(
            Box::new(Stalling { remaining: 100 }),
            passthrough(),
            1_000,
            Duration::from_millis(200),
            &CancelToken::new(),
        )
        .unwrap_err();
        match err {
            SweepError::CaptureTimeout {
                captured,
                capacity,
                waited,
            } => {
                assert_eq!(captured, 100);
                assert_eq!(capacity, 1_000);
                assert!(waited >= Duration::from_millis(200));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = capture(
            Box::new(Stalling { remaining: 0 }),
            passthrough(),
            1_000,
            Duration::from_secs(10),
            &cancel,
        )
        .unwrap_err();
        assert_eq!(err, SweepError::Cancelled { captured: 0 });
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.cancel();
        });
        let started = Instant::now();
        let err = capture(
            Box::new(Stalling { remaining: 10 }),
            passthrough(),
            1_000,
            Duration::from_secs(30),
            &cancel,
        )
        .unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(err, SweepError::Cancelled { captured: 10 }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
