// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Analyzer
// ─────────────────────────────────────────────────────────────────────
//! Per-position attention entropy over the model's last layer.
//!
//! Pipeline:
//!   1. Take the last layer (heads × N × N); earlier layers are ignored.
//!   2. Average across heads → one N × N matrix.
//!   3. Per query row: normalise to a distribution, take its entropy.
//!   4. Mean entropy / ln(N) → `attention_entropy`;
//!      population variance of raw entropies → `attention_variance`;
//!      rows above `threshold · ln(N)` → `high_entropy_tokens`.
//!
//! Step 3 rescales non-negative rows by their sum (attention weights
//! come out of a softmax, possibly rounded in float32) and applies
//! softmax only to rows carrying negative logits, so an identity matrix
//! yields zero entropy in every row.

use judge_types::{clamp_unit, AttentionMetrics, JudgeConfig, JudgeError, JudgeResult};

use crate::stats;
use crate::tensor::AttentionStack;

/// Value emitted for `AttentionMetrics::context_ratio`.
///
/// Reserved slot for a contextual-embedding comparison that is not
/// computed here. Lexical grounding lives in `ContextAlignmentScorer`
/// and is deliberately not wired into this field.
pub const RESERVED_CONTEXT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct AttentionAnalyzer {
    high_entropy_threshold: f64,
}

impl Default for AttentionAnalyzer {
    fn default() -> Self {
        Self::new(0.7)
    }
}

impl AttentionAnalyzer {
    pub fn new(high_entropy_threshold: f64) -> Self {
        Self {
            high_entropy_threshold,
        }
    }

    pub fn from_config(config: &JudgeConfig) -> Self {
        Self::new(config.high_entropy_threshold)
    }

    pub fn high_entropy_threshold(&self) -> f64 {
        self.high_entropy_threshold
    }

    /// Analyse the last attention layer for a sequence of `seq_len` tokens.
    pub fn analyze(
        &self,
        attentions: &AttentionStack,
        seq_len: usize,
    ) -> JudgeResult<AttentionMetrics> {
        let layer = attentions.last().ok_or_else(|| {
            JudgeError::Computation("attention: empty attention stack".to_string())
        })?;
        if seq_len < 2 {
            return Err(JudgeError::Computation(format!(
                "attention: sequence length {seq_len} cannot be normalised by ln(N)"
            )));
        }
        if layer.seq_len() != seq_len {
            return Err(JudgeError::Computation(format!(
                "attention: last layer is {0}x{0} for {seq_len} tokens",
                layer.seq_len()
            )));
        }

        let matrix = layer.mean_over_heads()?;
        let entropies = row_entropies(&matrix, seq_len)?;

        let ln_n = (seq_len as f64).ln();
        let attention_entropy = clamp_unit(stats::mean(&entropies)? / ln_n);
        let attention_variance = stats::variance(&entropies)?;

        let cutoff = self.high_entropy_threshold * ln_n;
        let high_entropy_tokens = entropies
            .iter()
            .enumerate()
            .filter(|&(_, &h)| h > cutoff)
            .map(|(i, _)| i)
            .collect();

        Ok(AttentionMetrics::new(
            attention_entropy,
            RESERVED_CONTEXT_RATIO,
            attention_variance,
            high_entropy_tokens,
        ))
    }
}

/// Raw (un-normalised) entropy of every row of a flattened N×N matrix.
pub fn row_entropies(matrix: &[f64], n: usize) -> JudgeResult<Vec<f64>> {
    if n == 0 || matrix.len() != n * n {
        return Err(JudgeError::Computation(format!(
            "attention: {} values for a {n}x{n} matrix",
            matrix.len()
        )));
    }
    matrix
        .chunks_exact(n)
        .map(|row| stats::as_distribution(row).map(|p| stats::shannon_entropy(&p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::AttentionLayer;

    fn identity(n: usize) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect()
    }

    fn uniform(n: usize) -> Vec<Vec<f64>> {
        vec![vec![1.0 / n as f64; n]; n]
    }

    fn stack(heads: Vec<Vec<Vec<f64>>>) -> AttentionStack {
        AttentionStack::new(vec![AttentionLayer::from_heads(heads).unwrap()])
    }

    #[test]
    fn test_identity_attention_is_zero_entropy() {
        let m = AttentionAnalyzer::default()
            .analyze(&stack(vec![identity(5), identity(5)]), 5)
            .unwrap();
        assert_eq!(m.attention_entropy, 0.0);
        assert_eq!(m.attention_variance, 0.0);
        assert!(m.high_entropy_tokens.is_empty());
        assert_eq!(m.context_ratio, RESERVED_CONTEXT_RATIO);
    }

    #[test]
    fn test_uniform_attention_flags_every_token() {
        let m = AttentionAnalyzer::default()
            .analyze(&stack(vec![uniform(4)]), 4)
            .unwrap();
        assert!(m.attention_entropy > 0.999);
        assert!(m.attention_variance < 1e-12);
        assert_eq!(m.high_entropy_tokens, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_mixed_rows_flag_only_diffuse_positions() {
        // Row 1 is uniform, the rest are one-hot.
        let mut rows = identity(4);
        rows[1] = vec![0.25; 4];
        let m = AttentionAnalyzer::default().analyze(&stack(vec![rows]), 4).unwrap();
        assert_eq!(m.high_entropy_tokens, vec![1]);
        assert!(m.attention_variance > 0.0);
        // mean entropy = ln(4) / 4 → normalised 0.25
        assert!((m.attention_entropy - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_float32_rounded_rows_keep_their_entropy() {
        let n = 512;
        let mut rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let raw: Vec<f32> = (0..n).map(|j| if i == j { 1.0 } else { 1e-3 }).collect();
                let sum: f32 = raw.iter().sum();
                raw.iter().map(|&w| f64::from(w / sum)).collect()
            })
            .collect();
        // Mass drifted past 1e-6, as float32 accumulation over long rows does.
        rows[3].iter_mut().for_each(|w| *w *= 1.0 + 2e-6);

        let m = AttentionAnalyzer::default().analyze(&stack(vec![rows]), n).unwrap();
        assert!(m.high_entropy_tokens.is_empty());
        assert!(m.attention_entropy < 0.5);
        assert!(m.attention_variance < 1e-9);
    }

    #[test]
    fn test_indices_within_bounds() {
        let rows: Vec<Vec<f64>> = (0..6)
            .map(|i| (0..6).map(|j| ((i * 7 + j * 3) % 5) as f64).collect())
            .collect();
        let m = AttentionAnalyzer::new(0.1).analyze(&stack(vec![rows]), 6).unwrap();
        assert!(m.high_entropy_tokens.iter().all(|&i| i < 6));
    }

    #[test]
    fn test_only_last_layer_used() {
        let first = AttentionLayer::from_heads(vec![uniform(3)]).unwrap();
        let last = AttentionLayer::from_heads(vec![identity(3)]).unwrap();
        let m = AttentionAnalyzer::default()
            .analyze(&AttentionStack::new(vec![first, last]), 3)
            .unwrap();
        assert_eq!(m.attention_entropy, 0.0);
    }

    #[test]
    fn test_deterministic() {
        let s = stack(vec![uniform(3), identity(3)]);
        let a = AttentionAnalyzer::default().analyze(&s, 3).unwrap();
        let b = AttentionAnalyzer::default().analyze(&s, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_failures() {
        let analyzer = AttentionAnalyzer::default();
        assert!(analyzer.analyze(&AttentionStack::default(), 3).is_err());
        assert!(analyzer.analyze(&stack(vec![identity(1)]), 1).is_err());
        assert!(analyzer.analyze(&stack(vec![identity(3)]), 4).is_err());
    }
}
