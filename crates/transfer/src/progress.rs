use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default sliding window for speed calculation.
const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Default number of retained samples.
const DEFAULT_MAX_SAMPLES: usize = 100;

/// Percentage of `uploaded` over `size`, in `0.0..=100.0`.
///
/// A zero-byte file reports 0 until it is completed.
pub fn progress_percent(uploaded: u64, size: u64) -> f64 {
    if size == 0 {
        return 0.0;
    }
    (uploaded.min(size) as f64 / size as f64) * 100.0
}

struct SpeedSample {
    bytes: u64,
    at: Instant,
}

/// Calculates transfer speed over a sliding window of samples.
///
/// Owned by a single upload loop, so it needs no locking.
pub struct SpeedCalculator {
    samples: VecDeque<SpeedSample>,
    max_samples: usize,
    window: Duration,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl SpeedCalculator {
    /// Creates a new calculator.
    ///
    /// - `window`: time window for the average (default 5 s).
    /// - `max_samples`: maximum retained samples (default 100).
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples: max_samples.unwrap_or(DEFAULT_MAX_SAMPLES).max(2),
            window: window.unwrap_or(DEFAULT_WINDOW),
        }
    }

    /// Records `bytes` transferred now.
    pub fn add_sample(&mut self, bytes: u64) {
        self.add_sample_at(bytes, Instant::now());
    }

    fn add_sample_at(&mut self, bytes: u64, at: Instant) {
        self.samples.push_back(SpeedSample { bytes, at });

        while let Some(front) = self.samples.front() {
            if at.duration_since(front.at) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Average speed in bytes/second. 0.0 with fewer than 2 samples.
    ///
    /// The first sample only anchors the start of the window; its bytes were
    /// transferred before it and are not counted.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        if self.samples.len() < 2 {
            return 0.0;
        }
        let elapsed = last.at.duration_since(first.at);
        if elapsed.is_zero() {
            return 0.0;
        }
        let bytes: u64 = self.samples.iter().skip(1).map(|s| s.bytes).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to transfer `remaining` bytes. `None` at zero speed.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }
}
