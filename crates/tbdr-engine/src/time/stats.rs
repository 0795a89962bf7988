use std::time::Duration;

use super::FrameTime;

/// Aggregated frame durations.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    samples: Vec<Duration>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(frames: usize) -> Self {
        Self {
            samples: Vec::with_capacity(frames),
        }
    }

    pub fn record(&mut self, time: FrameTime) {
        self.record_duration(time.dt);
    }

    pub fn record_duration(&mut self, dt: Duration) {
        self.samples.push(dt);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().min().copied().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or_default()
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.samples.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total() / n,
        }
    }

    /// Frames per second derived from the mean frame time.
    pub fn fps(&self) -> f64 {
        let mean = self.mean().as_secs_f64();
        if mean > 0.0 { 1.0 / mean } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn empty_stats_are_zero() {
        let s = FrameStats::new();
        assert_eq!(s.count(), 0);
        assert_eq!(s.min(), Duration::ZERO);
        assert_eq!(s.max(), Duration::ZERO);
        assert_eq!(s.mean(), Duration::ZERO);
        assert_eq!(s.fps(), 0.0);
    }

    #[test]
    fn aggregates_samples() {
        let mut s = FrameStats::with_capacity(3);
        s.record_duration(ms(10));
        s.record_duration(ms(30));
        s.record_duration(ms(20));
        assert_eq!(s.count(), 3);
        assert_eq!(s.min(), ms(10));
        assert_eq!(s.max(), ms(30));
        assert_eq!(s.mean(), ms(20));
        assert_eq!(s.total(), ms(60));
        assert!((s.fps() - 50.0).abs() < 1e-9);
    }
}
