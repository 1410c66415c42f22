// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Bootstrap Uncertainty Estimator
// ─────────────────────────────────────────────────────────────────────
//! Confidence interval around the risk score by noisy resampling.
//!
//! Each resample perturbs the four fusion inputs independently with
//! N(0, σ), σ = min(attention_variance, 0.1), clips each to [0, 1] and
//! recombines them with the overall risk weights. The 2.5th and 97.5th
//! percentiles of the resamples form the interval.
//!
//! The inputs all derive from one forward pass and are likely
//! correlated; resampling them independently is an accepted modelling
//! simplification and changing it changes what the interval means.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use judge_types::{
    clamp_unit, ComponentScores, ConfidenceInterval, JudgeConfig, JudgeError, JudgeResult,
};

use crate::combiner::weighted_sum;
use crate::stats;

/// Upper bound on the perturbation standard deviation.
pub const MAX_NOISE_SCALE: f64 = 0.1;

pub const LOWER_QUANTILE: f64 = 0.025;
pub const UPPER_QUANTILE: f64 = 0.975;

#[derive(Debug, Clone, Copy)]
pub struct UncertaintyEstimator {
    n_bootstrap: usize,
    seed: Option<u64>,
}

impl Default for UncertaintyEstimator {
    fn default() -> Self {
        Self::new(100, None)
    }
}

impl UncertaintyEstimator {
    pub fn new(n_bootstrap: usize, seed: Option<u64>) -> Self {
        Self { n_bootstrap, seed }
    }

    pub fn from_config(config: &JudgeConfig) -> Self {
        Self::new(config.n_bootstrap, config.bootstrap_seed)
    }

    pub fn n_bootstrap(&self) -> usize {
        self.n_bootstrap
    }

    /// Bootstrap interval using the configured random source.
    ///
    /// A fixed seed restarts the stream on every call, so identical
    /// inputs give identical intervals.
    pub fn interval(
        &self,
        components: &ComponentScores,
        attention_variance: f64,
    ) -> JudgeResult<ConfidenceInterval> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.interval_with_rng(components, attention_variance, &mut rng)
    }

    /// Bootstrap interval drawing from a caller-supplied generator.
    pub fn interval_with_rng<R: Rng>(
        &self,
        components: &ComponentScores,
        attention_variance: f64,
        rng: &mut R,
    ) -> JudgeResult<ConfidenceInterval> {
        if self.n_bootstrap == 0 {
            return Err(JudgeError::Computation(
                "bootstrap: n_bootstrap is 0".to_string(),
            ));
        }
        if !attention_variance.is_finite() {
            return Err(JudgeError::Computation(format!(
                "bootstrap: non-finite attention variance {attention_variance}"
            )));
        }
        let noise = Normal::new(0.0, noise_scale(attention_variance))
            .map_err(|e| JudgeError::Computation(format!("bootstrap: noise distribution: {e}")))?;
        let base = components.as_array();

        let samples: Vec<f64> = (0..self.n_bootstrap)
            .map(|_| {
                let perturbed = base.map(|v| clamp_unit(v + noise.sample(rng)));
                weighted_sum(&perturbed)
            })
            .collect();

        let lower = stats::quantile(&samples, LOWER_QUANTILE)?;
        let upper = stats::quantile(&samples, UPPER_QUANTILE)?;
        Ok(ConfidenceInterval::new(lower, upper))
    }
}

/// `min(attention_variance, 0.1)`, floored at zero.
pub fn noise_scale(attention_variance: f64) -> f64 {
    attention_variance.clamp(0.0, MAX_NOISE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid() -> ComponentScores {
        ComponentScores::new(0.5, 0.5, 0.5, 0.5)
    }

    fn seeded(n: usize) -> UncertaintyEstimator {
        UncertaintyEstimator::new(n, Some(42))
    }

    #[test]
    fn test_interval_bounds() {
        let ci = seeded(200)
            .interval(&ComponentScores::new(0.9, 0.1, 0.7, 1.0), 0.08)
            .unwrap();
        assert!(0.0 <= ci.lower && ci.lower <= ci.upper && ci.upper <= 1.0);
    }

    #[test]
    fn test_zero_variance_collapses_to_point() {
        let c = ComponentScores::new(0.9, 0.5, 0.3, 1.0);
        let ci = seeded(50).interval(&c, 0.0).unwrap();
        assert!((ci.lower - 0.67).abs() < 1e-12);
        assert!((ci.upper - 0.67).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = seeded(100).interval(&mid(), 0.05).unwrap();
        let b = seeded(100).interval(&mid(), 0.05).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_width_grows_with_variance_up_to_cap() {
        let est = seeded(400);
        let mut previous = 0.0;
        for var in [0.0, 0.02, 0.05, 0.08, 0.1] {
            let w = est.interval(&mid(), var).unwrap().width();
            assert!(w + 1e-12 >= previous, "width shrank at variance {var}");
            previous = w;
        }
        let capped = est.interval(&mid(), 0.1).unwrap();
        for var in [0.2, 0.5, 3.0] {
            assert_eq!(est.interval(&mid(), var).unwrap(), capped);
        }
    }

    #[test]
    fn test_noise_scale_cap() {
        assert_eq!(noise_scale(0.03), 0.03);
        assert_eq!(noise_scale(0.7), MAX_NOISE_SCALE);
        assert_eq!(noise_scale(-1.0), 0.0);
    }

    #[test]
    fn test_failures() {
        assert!(UncertaintyEstimator::new(0, Some(1)).interval(&mid(), 0.05).is_err());
        assert!(seeded(10).interval(&mid(), f64::NAN).is_err());
    }

    #[test]
    fn test_noise_follows_normal_draws() {
        let c = ComponentScores::new(0.6, 0.4, 0.3, 1.0);
        let ci = UncertaintyEstimator::new(32, None)
            .interval_with_rng(&c, 0.05, &mut StdRng::seed_from_u64(3))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let normal = Normal::new(0.0, 0.05).unwrap();
        let samples: Vec<f64> = (0..32)
            .map(|_| weighted_sum(&c.as_array().map(|v| clamp_unit(v + normal.sample(&mut rng)))))
            .collect();
        let expected = ConfidenceInterval::new(
            stats::quantile(&samples, LOWER_QUANTILE).unwrap(),
            stats::quantile(&samples, UPPER_QUANTILE).unwrap(),
        );
        assert_eq!(ci, expected);
    }

    #[test]
    fn test_explicit_rng() {
        let mut rng = StdRng::seed_from_u64(9);
        let ci = seeded(64)
            .interval_with_rng(&mid(), 0.1, &mut rng)
            .unwrap();
        assert!(ci.width() > 0.0);
    }
}
