// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Representation Uncertainty Scorers
// ─────────────────────────────────────────────────────────────────────
//! Two scalar signals read directly off the hidden states:
//!
//! - **Entropy score**: softmax entropy of the sequence-averaged hidden
//!   vector, normalised by ln(H). A proxy for representational
//!   uncertainty. It is *not* a next-token distribution: the judge never
//!   assumes access to a vocabulary-sized output layer.
//! - **Confidence score**: `1 / (1 + var)` of the first (summary) token's
//!   representation. A flatter summary embedding reads as a more
//!   settled encoding.

use judge_types::{clamp_unit, JudgeError, JudgeResult};

use crate::stats;
use crate::tensor::HiddenStates;

/// Normalised entropy of the averaged token representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyScorer;

impl EntropyScorer {
    /// Returns a value in [0, 1]; 0 for a near one-hot average,
    /// 1 for a uniform one.
    pub fn score(&self, hidden: &HiddenStates) -> JudgeResult<f64> {
        if hidden.width() < 2 {
            return Err(JudgeError::Computation(format!(
                "entropy: representation width {} is too small to normalise",
                hidden.width()
            )));
        }
        let averaged = stats::column_means(hidden.as_slice(), hidden.seq_len(), hidden.width())?;
        let probs = stats::softmax(&averaged)?;
        Ok(clamp_unit(stats::normalized_entropy(&probs)?))
    }
}

/// Inverse-variance confidence of the summary token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn score(&self, hidden: &HiddenStates) -> JudgeResult<f64> {
        let summary = hidden.row(0).ok_or_else(|| {
            JudgeError::Computation("confidence: hidden states have no rows".to_string())
        })?;
        let var = stats::variance(summary)?;
        Ok(clamp_unit(1.0 / (1.0 + var)))
    }
}
