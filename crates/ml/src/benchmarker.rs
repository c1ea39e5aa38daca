//! Accumulates preprocessing and model time since engine load.

use std::time::Duration;

use qabench_core::TimingPair;

#[derive(Debug, Default)]
pub struct Benchmarker {
    enabled: bool,
    preprocessing: Duration,
    model: Duration,
}

impl Benchmarker {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn record_preprocessing(&mut self, elapsed: Duration) {
        if self.enabled {
            self.preprocessing += elapsed;
        }
    }

    pub fn record_model(&mut self, elapsed: Duration) {
        if self.enabled {
            self.model += elapsed;
        }
    }

    /// Seconds spent so far. All zero when benchmarking is disabled.
    #[must_use]
    pub fn summary(&self) -> TimingPair {
        TimingPair::new(self.preprocessing.as_secs_f64(), self.model.as_secs_f64())
    }
}
