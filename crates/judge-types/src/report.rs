// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Reports
// ─────────────────────────────────────────────────────────────────────
//! Detailed, batch, dataset and stats views built on top of the
//! primary `EvaluationResult`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Device;
use crate::error::{JudgeError, JudgeResult};
use crate::score::{AttentionMetrics, ComponentScores, ConfidenceInterval};

/// Pipeline stage that can fall back to a neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Encoder,
    Entropy,
    Confidence,
    Attention,
    ContextAlignment,
    AttentionFusion,
    RiskFusion,
    Bootstrap,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encoder => "encoder",
            Self::Entropy => "entropy",
            Self::Confidence => "confidence",
            Self::Attention => "attention",
            Self::ContextAlignment => "context_alignment",
            Self::AttentionFusion => "attention_fusion",
            Self::RiskFusion => "risk_fusion",
            Self::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component that failed and was replaced by its neutral default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFault {
    pub component: Component,
    /// Error class: `encoder` or `computation`.
    pub kind: String,
    pub reason: String,
}

impl ComponentFault {
    pub fn new(component: Component, err: &JudgeError) -> Self {
        Self {
            component,
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    HighEntropy,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighEntropy => "high_entropy",
        }
    }
}

/// A token position flagged as a candidate problem span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedToken {
    pub index: usize,
    pub token: String,
    pub reason: FlagReason,
}

/// Score, interval and the evidence behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedEvaluation {
    pub hallucination_score: f64,
    pub confidence_interval: ConfidenceInterval,
    pub flagged_tokens: Vec<FlaggedToken>,
    pub attention: AttentionMetrics,
    pub components: ComponentScores,
    /// Empty when every component produced a real value.
    pub faults: Vec<ComponentFault>,
}

impl DetailedEvaluation {
    pub fn is_degraded(&self) -> bool {
        !self.faults.is_empty()
    }
}

/// One entry of a batch evaluation; `index` is the input position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub hallucination_score: f64,
    pub confidence_interval: ConfidenceInterval,
}

/// Ground-truth label for dataset evaluation (0 = accurate, 1 = hallucination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GroundTruth {
    Accurate,
    Hallucination,
}

impl GroundTruth {
    pub fn is_hallucination(&self) -> bool {
        matches!(self, Self::Hallucination)
    }
}

impl TryFrom<u8> for GroundTruth {
    type Error = JudgeError;

    fn try_from(value: u8) -> JudgeResult<Self> {
        match value {
            0 => Ok(Self::Accurate),
            1 => Ok(Self::Hallucination),
            other => Err(JudgeError::Validation(format!(
                "label must be 0 (accurate) or 1 (hallucination), got {other}"
            ))),
        }
    }
}

impl From<GroundTruth> for u8 {
    fn from(value: GroundTruth) -> Self {
        match value {
            GroundTruth::Accurate => 0,
            GroundTruth::Hallucination => 1,
        }
    }
}

/// A text with its known label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledItem {
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
    pub label: GroundTruth,
}

impl LabeledItem {
    pub fn new(text: impl Into<String>, label: GroundTruth) -> Self {
        Self {
            text: text.into(),
            context: None,
            label,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Confusion-matrix metrics over a labelled dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub samples: usize,
}

/// Point-in-time copy of the running counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub evaluations: u64,
    /// Cumulative wall time in seconds.
    pub total_time: f64,
    pub avg_score: f64,
    /// `total_time / evaluations`, 0 before the first evaluation.
    pub avg_processing_time: f64,
    pub model_name: String,
    pub device: Device,
}
