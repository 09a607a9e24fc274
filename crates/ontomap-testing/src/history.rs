//! Sample history generation
//!
//! Seeded so that fixtures are reproducible.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use ontomap_core::Sample;

/// Shape of a generated history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataPattern {
    /// Constant value
    Constant { base: f64 },
    /// Linear ramp
    Linear { start: f64, slope: f64 },
    /// Uniform noise in a range
    Random { min: f64, max: f64 },
    /// Base value with a trend and bounded noise
    TrendWithNoise { base: f64, trend: f64, noise: f64 },
    /// On/off states, `1.0` with probability `on_rate`
    Binary { on_rate: f64 },
}

/// Generator for sample histories
#[derive(Debug, Clone)]
pub struct HistoryGenerator {
    seed: u64,
    start: i64,
}

impl HistoryGenerator {
    /// Generator with a fixed seed and a start time of now.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            start: Utc::now().timestamp_millis(),
        }
    }

    /// First sample timestamp (unix millis).
    pub fn starting_at(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Generate `points` samples, oldest first, `interval_seconds` apart.
    pub fn generate(&self, pattern: &DataPattern, points: usize, interval_seconds: u64) -> Vec<Sample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = interval_seconds as i64 * 1000;

        (0..points)
            .map(|i| {
                let value = match pattern {
                    DataPattern::Constant { base } => *base,
                    DataPattern::Linear { start, slope } => start + slope * i as f64,
                    DataPattern::Random { min, max } => rng.gen_range(*min..=*max),
                    DataPattern::TrendWithNoise { base, trend, noise } => {
                        base + trend * i as f64 + rng.gen_range(-*noise..=*noise)
                    }
                    DataPattern::Binary { on_rate } => {
                        if rng.gen_bool(on_rate.clamp(0.0, 1.0)) {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                Sample::new(self.start + i as i64 * step, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_history() {
        let pattern = DataPattern::TrendWithNoise {
            base: 55.0,
            trend: 0.01,
            noise: 1.5,
        };
        let a = HistoryGenerator::with_seed(7).starting_at(0).generate(&pattern, 50, 60);
        let b = HistoryGenerator::with_seed(7).starting_at(0).generate(&pattern, 50, 60);
        assert_eq!(a, b);
        assert_eq!(a[1].timestamp, 60_000);
    }

    #[test]
    fn test_binary_pattern_values() {
        let samples = HistoryGenerator::with_seed(1).generate(&DataPattern::Binary { on_rate: 0.5 }, 100, 60);
        assert!(samples.iter().all(|s| s.value == 0.0 || s.value == 1.0));
    }
}
