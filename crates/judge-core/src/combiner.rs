// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Score Combiner
// ─────────────────────────────────────────────────────────────────────
//! Fixed-weight linear fusions.
//!
//! Attention sub-score:
//!   `0.5·entropy + 0.3·min(variance, 1) + 0.2·(1 − context_ratio)`
//!
//! Overall risk:
//!   `0.4·entropy + 0.3·confidence + 0.2·attention + 0.1·context`
//!
//! The weights are product constants, not learned parameters.

use judge_types::{clamp_unit, AttentionMetrics, ComponentScores, JudgeError, JudgeResult};

pub const W_ATTN_ENTROPY: f64 = 0.5;
pub const W_ATTN_VARIANCE: f64 = 0.3;
pub const W_ATTN_CONTEXT: f64 = 0.2;

pub const W_ENTROPY: f64 = 0.4;
pub const W_CONFIDENCE: f64 = 0.3;
pub const W_ATTENTION: f64 = 0.2;
pub const W_CONTEXT: f64 = 0.1;

/// Overall-fusion weights in `ComponentScores::as_array()` order.
pub const RISK_WEIGHTS: [f64; 4] = [W_ENTROPY, W_CONFIDENCE, W_ATTENTION, W_CONTEXT];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCombiner;

impl ScoreCombiner {
    /// Collapse attention metrics into one [0, 1] sub-score.
    pub fn attention_subscore(&self, metrics: &AttentionMetrics) -> JudgeResult<f64> {
        let fused = W_ATTN_ENTROPY * metrics.attention_entropy
            + W_ATTN_VARIANCE * metrics.attention_variance.min(1.0)
            + W_ATTN_CONTEXT * (1.0 - metrics.context_ratio);
        finite(fused, "attention fusion").map(clamp_unit)
    }

    /// Weighted overall risk score in [0, 1].
    pub fn risk_score(&self, components: &ComponentScores) -> JudgeResult<f64> {
        finite(weighted_sum(&components.as_array()), "risk fusion").map(clamp_unit)
    }
}

/// `Σ RISK_WEIGHTS[i] · values[i]`, unclamped.
#[inline]
pub fn weighted_sum(values: &[f64; 4]) -> f64 {
    RISK_WEIGHTS.iter().zip(values).map(|(w, v)| w * v).sum()
}

fn finite(value: f64, what: &str) -> JudgeResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(JudgeError::Computation(format!("{what}: non-finite result {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        assert!((RISK_WEIGHTS.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((W_ATTN_ENTROPY + W_ATTN_VARIANCE + W_ATTN_CONTEXT - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_attention_subscore_formula() {
        // 0.5·0.4 + 0.3·0.2 + 0.2·(1 − 0.5) = 0.2 + 0.06 + 0.1 = 0.36
        let m = AttentionMetrics::new(0.4, 0.5, 0.2, vec![]);
        let s = ScoreCombiner.attention_subscore(&m).unwrap();
        assert!((s - 0.36).abs() < 1e-12);
    }

    #[test]
    fn test_attention_variance_capped_at_one() {
        let low = AttentionMetrics::new(0.0, 0.5, 1.0, vec![]);
        let high = AttentionMetrics::new(0.0, 0.5, 25.0, vec![]);
        let c = ScoreCombiner;
        assert_eq!(
            c.attention_subscore(&low).unwrap(),
            c.attention_subscore(&high).unwrap()
        );
    }

    #[test]
    fn test_neutral_attention_subscore() {
        // 0.5·0.5 + 0.3·0.5 + 0.2·0.5 = 0.5
        let s = ScoreCombiner
            .attention_subscore(&AttentionMetrics::neutral())
            .unwrap();
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_risk_formula() {
        // 0.4·0.9 + 0.3·0.5 + 0.2·0.3 + 0.1·1.0 = 0.36 + 0.15 + 0.06 + 0.1 = 0.67
        let c = ComponentScores::new(0.9, 0.5, 0.3, 1.0);
        assert!((ScoreCombiner.risk_score(&c).unwrap() - 0.67).abs() < 1e-12);
    }

    #[test]
    fn test_risk_bounds() {
        let c = ScoreCombiner;
        assert_eq!(c.risk_score(&ComponentScores::new(0.0, 0.0, 0.0, 0.0)).unwrap(), 0.0);
        let top = c.risk_score(&ComponentScores::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        assert!((top - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_fails() {
        let m = AttentionMetrics {
            attention_entropy: f64::NAN,
            context_ratio: 0.5,
            attention_variance: 0.0,
            high_entropy_tokens: vec![],
        };
        assert!(ScoreCombiner.attention_subscore(&m).is_err());
    }

    #[test]
    fn test_deterministic() {
        let c = ComponentScores::new(0.123, 0.456, 0.789, 0.321);
        let a = ScoreCombiner.risk_score(&c).unwrap();
        let b = ScoreCombiner.risk_score(&c).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
