// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Context Alignment Scorer
// ─────────────────────────────────────────────────────────────────────
//! Lexical grounding of the evaluated text in a reference context.
//!
//! `ratio = |text ∩ context| / |text|` over lower-cased token sets.
//! Asymmetric on purpose: it measures how much of the evaluated text's
//! vocabulary appears in the context, not how similar the two are.

use std::collections::HashSet;
use std::sync::Arc;

use judge_types::{clamp_unit, JudgeResult, NEUTRAL_SCORE};

use crate::encoder::Encoder;

/// Combiner input used when the caller supplies no context.
///
/// A documented default, not a claim that the text is risk-free.
pub const NO_CONTEXT_SCORE: f64 = 1.0;

/// Grounding ratio between an evaluated text and its context.
pub struct ContextAlignmentScorer {
    encoder: Arc<dyn Encoder>,
}

impl ContextAlignmentScorer {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self { encoder }
    }

    /// Tokenise both strings with the encoder's tokenizer and compare.
    pub fn score(&self, text: &str, context: &str) -> JudgeResult<f64> {
        let text_tokens = self.encoder.tokenize(text)?;
        let context_tokens = self.encoder.tokenize(context)?;
        Ok(context_ratio(&text_tokens, &context_tokens))
    }
}

/// Fraction of distinct `text_tokens` also present in `context_tokens`.
///
/// Returns 0.5 when `text_tokens` is empty.
pub fn context_ratio<S: AsRef<str>>(text_tokens: &[S], context_tokens: &[S]) -> f64 {
    let text_set: HashSet<String> = text_tokens
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect();
    if text_set.is_empty() {
        return NEUTRAL_SCORE;
    }
    let context_set: HashSet<String> = context_tokens
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect();
    let shared = text_set.intersection(&context_set).count();
    clamp_unit(shared as f64 / text_set.len() as f64)
}
