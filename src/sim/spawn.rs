//! Spawn scheduling and shared spawn-time sampling

use rand::Rng;

/// Countdown that fires once after an initial delay, then every `interval_ms`
///
/// Fires at most once per poll; a long stall drops the backlog instead of bursting.
#[derive(Debug, Clone)]
pub struct SpawnClock {
    interval_ms: f32,
    remaining_ms: f32,
}

impl SpawnClock {
    pub fn new(initial_delay_ms: f32, interval_ms: f32) -> Self {
        Self {
            interval_ms: interval_ms.max(1.0),
            remaining_ms: initial_delay_ms.max(0.0),
        }
    }

    /// Advance by `dt_ms`; true when a spawn attempt is due
    ///
    /// Non-finite or negative deltas count as no elapsed time.
    pub fn poll(&mut self, dt_ms: f32) -> bool {
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        self.remaining_ms -= dt_ms;
        if self.remaining_ms > 0.0 {
            return false;
        }
        self.remaining_ms += self.interval_ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = self.interval_ms;
        }
        true
    }

    pub fn remaining_ms(&self) -> f32 {
        self.remaining_ms
    }
}

/// Uniform value in `[lo, hi]` (a collapsed range returns `lo`)
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Uniform offset along an edge of length `span` (0 when nothing fits)
pub fn edge_offset<R: Rng + ?Sized>(rng: &mut R, span: f32) -> f32 {
    uniform(rng, 0.0, span.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_initial_delay_then_interval() {
        let mut clock = SpawnClock::new(100.0, 1000.0);
        assert!(!clock.poll(50.0));
        assert!(clock.poll(50.0));
        assert!(!clock.poll(500.0));
        assert!(clock.poll(500.0));
    }

    #[test]
    fn test_long_stall_fires_once() {
        let mut clock = SpawnClock::new(0.0, 100.0);
        assert!(clock.poll(10_000.0));
        assert!((clock.remaining_ms() - 100.0).abs() < 1e-3);
        assert!(!clock.poll(50.0));
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut clock = SpawnClock::new(100.0, 1000.0);
        assert!(!clock.poll(f32::NAN));
        assert!(!clock.poll(f32::INFINITY));
        assert!(!clock.poll(-500.0));
        assert_eq!(clock.remaining_ms(), 100.0);
        for _ in 0..50 {
            assert!(!clock.poll(0.0));
        }
        assert!(clock.poll(100.0));
        assert!(clock.remaining_ms().is_finite());
    }

    #[test]
    fn test_uniform_collapsed_range() {
        let mut rng = Pcg32::seed_from_u64(9);
        assert_eq!(uniform(&mut rng, 4.0, 4.0), 4.0);
        assert_eq!(edge_offset(&mut rng, -20.0), 0.0);
        let v = uniform(&mut rng, 1.0, 2.0);
        assert!((1.0..=2.0).contains(&v));
    }
}
