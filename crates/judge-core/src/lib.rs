// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Statistical hallucination-risk estimation from a transformer's
//! forward pass, with no external judging service.
//!
//! Given per-token hidden states and self-attention weights for a piece
//! of generated text, the judge produces a bounded risk score and a 95%
//! bootstrap confidence interval around it.
//!
//! # Guarantees
//!
//! 1. **Always well-formed**: `Judge::evaluate()` returns a score in
//!    [0, 1] and an interval with `0 <= lower <= upper <= 1`. It never
//!    returns an error and never panics on degenerate tensors.
//!
//! 2. **Fail open to neutral**: a stage that cannot compute falls back
//!    to 0.5 (scalars), neutral `AttentionMetrics`, or the [0, 1]
//!    interval. Each fallback is logged and recorded as a
//!    `ComponentFault` on the detailed result.
//!
//! 3. **Deterministic scorers**: every stage except the bootstrap is a
//!    pure function of its tensors. Set `bootstrap_seed` to make the
//!    interval reproducible too.
//!
//! 4. **One shared counter set**: `RunningStatsTracker` is the only
//!    cross-call mutable state and serialises its own updates.

pub mod attention;
pub mod combiner;
pub mod context;
pub mod encoder;
pub mod entropy;
pub mod judge;
pub mod running_stats;
pub mod stats;
pub mod tensor;
pub mod uncertainty;

pub use attention::AttentionAnalyzer;
pub use combiner::ScoreCombiner;
pub use context::ContextAlignmentScorer;
pub use encoder::{EncodeOptions, Encoder, Encoding, ExternalEncoder, HashingEncoder};
pub use entropy::{ConfidenceScorer, EntropyScorer};
pub use judge::{Judge, JudgeState};
pub use running_stats::{RunningStats, RunningStatsTracker};
pub use tensor::{AttentionLayer, AttentionStack, HiddenStates};
pub use uncertainty::UncertaintyEstimator;
