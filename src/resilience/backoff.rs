//! Backoff schedules and injectable jitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Random delay added on top of exponential backoff
pub struct Jitter {
    max: Duration,
    rng: Mutex<StdRng>,
}

impl Jitter {
    pub fn new(max: Duration) -> Self {
        Self {
            max,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic jitter for tests
    #[allow(dead_code)] // Production jitter is always entropy-seeded
    pub fn seeded(max: Duration, seed: u64) -> Self {
        Self {
            max,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform in `[0, max)` at millisecond granularity
    pub fn sample(&self) -> Duration {
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..max_ms);
        Duration::from_millis(ms)
    }
}

pub enum Backoff {
    /// `base * 2^(attempt - 1)` plus jitter
    Exponential { base: Duration, jitter: Jitter },
    Fixed(Duration),
}

impl Backoff {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base, jitter } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).saturating_add(jitter.sample())
            }
            Backoff::Fixed(delay) => *delay,
        }
    }
}
