//! Timing breakdown derived from a dummy-head run and a real-head run.

/// Seconds spent in preprocessing and in the model, as reported by one
/// benchmarked inference run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingPair {
    pub preprocessing: f64,
    pub model: f64,
}

impl TimingPair {
    #[must_use]
    pub const fn new(preprocessing: f64, model: f64) -> Self {
        Self {
            preprocessing,
            model,
        }
    }

    #[must_use]
    pub fn combined(&self) -> f64 {
        self.preprocessing + self.model
    }
}

/// The four reported figures of a successful trial, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingBreakdown {
    pub preprocessing: f64,
    pub language_model: f64,
    pub prediction_head: f64,
    pub total: f64,
}

impl TimingBreakdown {
    /// Split timings into components.
    ///
    /// The dummy-head run measures the language model alone, so the
    /// prediction head is whatever the real-head run adds on top. The two
    /// preprocessing measurements are averaged rather than deduplicated.
    #[must_use]
    pub fn analyse(dummy: TimingPair, real: TimingPair) -> Self {
        let language_model = dummy.combined();
        let full = real.combined();
        Self {
            preprocessing: (dummy.preprocessing + real.preprocessing) / 2.0,
            language_model,
            prediction_head: full - language_model,
            total: full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn analyse_splits_components() {
        let timing = TimingBreakdown::analyse(TimingPair::new(1.0, 2.0), TimingPair::new(1.2, 5.0));
        assert_relative_eq!(timing.preprocessing, 1.1, epsilon = 1e-9);
        assert_relative_eq!(timing.language_model, 3.0, epsilon = 1e-9);
        assert_relative_eq!(timing.prediction_head, 3.2, epsilon = 1e-9);
        assert_relative_eq!(timing.total, 6.2, epsilon = 1e-9);
    }

    #[test]
    fn identical_runs_have_no_head_cost() {
        let pair = TimingPair::new(0.5, 4.0);
        let timing = TimingBreakdown::analyse(pair, pair);
        assert_relative_eq!(timing.prediction_head, 0.0);
        assert_relative_eq!(timing.total, timing.language_model);
        assert_relative_eq!(timing.preprocessing, 0.5);
    }

    #[test]
    fn faster_real_run_gives_negative_head_time() {
        // Noise between runs is reported as-is, not clamped.
        let timing = TimingBreakdown::analyse(TimingPair::new(1.0, 3.0), TimingPair::new(1.0, 2.5));
        assert!(timing.prediction_head < 0.0);
    }
}
