// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! attention judge, a statistical hallucination-risk estimator.

pub mod config;
pub mod error;
pub mod report;
pub mod score;

pub use config::{Device, JudgeConfig};
pub use error::{JudgeError, JudgeResult};
pub use report::{
    BatchItem, Component, ComponentFault, DatasetMetrics, DetailedEvaluation, FlagReason,
    FlaggedToken, GroundTruth, LabeledItem, StatsSnapshot,
};
pub use score::{
    clamp_score, clamp_unit, AttentionMetrics, ComponentScores, ConfidenceInterval,
    EvaluationResult, NEUTRAL_SCORE,
};
