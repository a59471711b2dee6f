//! Per-row download rate: a rolling window of delivery samples.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Divide, yielding zero for a zero denominator.
pub fn divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Rate summary over the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    /// No samples since the row was created or last reset.
    pub idle: bool,
    /// Blocks delivered within the window.
    pub events: usize,
    /// Time spent importing those blocks (excluded from the normal rate).
    pub discount: Duration,
    /// Total time spent receiving those blocks.
    pub window: Duration,
}

impl Default for Rate {
    fn default() -> Self {
        Self {
            idle: true,
            events: 0,
            discount: Duration::ZERO,
            window: Duration::ZERO,
        }
    }
}

impl Rate {
    /// Blocks per second including time spent in the chain sink.
    pub fn total(&self) -> f64 {
        divide(self.events as f64, self.window.as_secs_f64())
    }

    /// Blocks per second excluding time spent in the chain sink, so peers are
    /// compared on network throughput only.
    pub fn normal(&self) -> f64 {
        let network = self.window.saturating_sub(self.discount);
        divide(self.events as f64, network.as_secs_f64())
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    events: usize,
    elapsed: Duration,
    discount: Duration,
    at: Instant,
}

/// Samples recorded within the last `window` of wall-clock time.
#[derive(Debug)]
pub(super) struct RateHistory {
    window: Duration,
    samples: VecDeque<Sample>,
}

impl RateHistory {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub(super) fn clear(&mut self) {
        self.samples.clear();
    }

    /// Record a sample at `now`, drop samples older than the window and return
    /// the recomputed rate.
    pub(super) fn record(
        &mut self,
        events: usize,
        elapsed: Duration,
        discount: Duration,
        now: Instant,
    ) -> Rate {
        self.samples.push_back(Sample {
            events,
            elapsed,
            discount,
            at: now,
        });

        if let Some(cutoff) = now.checked_sub(self.window) {
            while self.samples.front().is_some_and(|s| s.at < cutoff) {
                self.samples.pop_front();
            }
        }

        self.samples.iter().fold(
            Rate {
                idle: false,
                ..Rate::default()
            },
            |mut rate, s| {
                rate.events += s.events;
                rate.window += s.elapsed;
                rate.discount += s.discount;
                rate
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_zero_is_zero() {
        assert_eq!(divide(10.0, 0.0), 0.0);
        assert_eq!(divide(10.0, 4.0), 2.5);
    }

    #[test]
    fn default_rate_is_idle_and_zero() {
        let r = Rate::default();
        assert!(r.idle);
        assert_eq!(r.total(), 0.0);
        assert_eq!(r.normal(), 0.0);
    }

    #[test]
    fn normal_rate_excludes_discount() {
        let r = Rate {
            idle: false,
            events: 10,
            discount: Duration::from_secs(3),
            window: Duration::from_secs(5),
        };
        assert!((r.total() - 2.0).abs() < 1e-9);
        assert!((r.normal() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn discount_larger_than_window_yields_zero() {
        let r = Rate {
            idle: false,
            events: 10,
            discount: Duration::from_secs(6),
            window: Duration::from_secs(5),
        };
        assert_eq!(r.normal(), 0.0);
    }

    #[test]
    fn history_accumulates_and_prunes() {
        let t0 = Instant::now();
        let mut h = RateHistory::new(Duration::from_secs(10));
        let r = h.record(4, Duration::from_secs(2), Duration::ZERO, t0);
        assert!(!r.idle);
        assert_eq!(r.events, 4);

        let r = h.record(6, Duration::from_secs(3), Duration::ZERO, t0 + Duration::from_secs(5));
        assert_eq!(r.events, 10);
        assert_eq!(r.window, Duration::from_secs(5));

        // First sample is now older than the window.
        let r = h.record(2, Duration::from_secs(1), Duration::ZERO, t0 + Duration::from_secs(12));
        assert_eq!(r.events, 8);
        assert_eq!(r.window, Duration::from_secs(4));
        assert!((r.normal() - 2.0).abs() < 1e-9);
    }
}
