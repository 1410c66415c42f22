// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Score Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Neutral value every scalar component falls back to on failure.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Shorthand for `clamp_score(value, 0.0, 1.0)`.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    clamp_score(value, 0.0, 1.0)
}

/// Attention statistics for one evaluation, taken from the last layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionMetrics {
    /// Mean per-row attention entropy normalised by ln(N), in [0, 1].
    pub attention_entropy: f64,
    /// Reserved slot, always the neutral constant from the analyzer.
    pub context_ratio: f64,
    /// Population variance of the raw per-row entropies.
    pub attention_variance: f64,
    /// Ascending query positions with unusually diffuse attention.
    pub high_entropy_tokens: Vec<usize>,
}

impl AttentionMetrics {
    pub fn new(
        attention_entropy: f64,
        context_ratio: f64,
        attention_variance: f64,
        mut high_entropy_tokens: Vec<usize>,
    ) -> Self {
        high_entropy_tokens.sort_unstable();
        high_entropy_tokens.dedup();
        Self {
            attention_entropy: clamp_unit(attention_entropy),
            context_ratio: clamp_unit(context_ratio),
            attention_variance: clamp_score(attention_variance, 0.0, f64::MAX),
            high_entropy_tokens,
        }
    }

    /// Metrics used when the attention stack cannot be analysed.
    pub fn neutral() -> Self {
        Self {
            attention_entropy: NEUTRAL_SCORE,
            context_ratio: NEUTRAL_SCORE,
            attention_variance: NEUTRAL_SCORE,
            high_entropy_tokens: Vec::new(),
        }
    }
}

/// Bootstrap confidence interval, always `0 <= lower <= upper <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Clamp both bounds into [0, 1] and order them.
    pub fn new(lower: f64, upper: f64) -> Self {
        let a = clamp_unit(lower);
        let b = clamp_unit(upper);
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    /// The maximally uninformative interval [0, 1].
    pub fn full() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

/// Primary return value of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Risk in [0, 1]; higher means more likely fabricated.
    pub hallucination_score: f64,
    pub confidence_interval: ConfidenceInterval,
}

impl EvaluationResult {
    pub fn new(hallucination_score: f64, confidence_interval: ConfidenceInterval) -> Self {
        Self {
            hallucination_score: clamp_unit(hallucination_score),
            confidence_interval,
        }
    }

    /// `(0.5, [0, 1])`: what a caller sees when evaluation fell over.
    pub fn neutral() -> Self {
        Self {
            hallucination_score: NEUTRAL_SCORE,
            confidence_interval: ConfidenceInterval::full(),
        }
    }
}

/// The four pre-fusion inputs to the overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub entropy: f64,
    pub confidence: f64,
    pub attention: f64,
    pub context: f64,
}

impl ComponentScores {
    pub fn new(entropy: f64, confidence: f64, attention: f64, context: f64) -> Self {
        Self {
            entropy: clamp_unit(entropy),
            confidence: clamp_unit(confidence),
            attention: clamp_unit(attention),
            context: clamp_unit(context),
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.entropy, self.confidence, self.attention, self.context]
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_score(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_neg_inf() {
        assert_eq!(clamp_score(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_normal() {
        assert_eq!(clamp_unit(0.75), 0.75);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.3), 0.0);
    }

    #[test]
    fn test_interval_orders_and_clamps() {
        let ci = ConfidenceInterval::new(0.9, -0.2);
        assert_eq!(ci.as_tuple(), (0.0, 0.9));
        assert!((ci.width() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_attention_metrics_sorted_indices() {
        let m = AttentionMetrics::new(0.4, 0.5, 0.01, vec![3, 1, 3]);
        assert_eq!(m.high_entropy_tokens, vec![1, 3]);
    }

    #[test]
    fn test_attention_metrics_clamps() {
        let m = AttentionMetrics::new(1.2, -1.0, f64::NAN, vec![]);
        assert_eq!(m.attention_entropy, 1.0);
        assert_eq!(m.context_ratio, 0.0);
        assert_eq!(m.attention_variance, 0.0);
    }

    #[test]
    fn test_neutral_result() {
        let r = EvaluationResult::neutral();
        assert_eq!(r.hallucination_score, 0.5);
        assert_eq!(r.confidence_interval.as_tuple(), (0.0, 1.0));
    }

    #[test]
    fn test_component_scores_clamp() {
        let c = ComponentScores::new(1.1, 0.2, f64::NAN, 0.9);
        assert_eq!(c.as_array(), [1.0, 0.2, 0.0, 0.9]);
    }
}
