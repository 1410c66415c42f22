// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge
// ─────────────────────────────────────────────────────────────────────
//! Orchestrates one encoder forward pass through every scorer.
//!
//! Per call:
//!   1. Encode (token ids, hidden states, attention stack).
//!   2. Entropy, confidence and attention scores from the tensors.
//!   3. Context alignment if a reference context was supplied,
//!      otherwise the fixed `NO_CONTEXT_SCORE`.
//!   4. Attention sub-score, overall risk score, bootstrap interval.
//!   5. Fold the result into the running stats.
//!
//! Every stage returns a `JudgeResult`. A failed stage is replaced by its
//! neutral default, logged, and recorded as a `ComponentFault`; the
//! caller always receives a well-formed score and interval.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use judge_types::{
    AttentionMetrics, BatchItem, Component, ComponentFault, ComponentScores, ConfidenceInterval,
    DatasetMetrics, DetailedEvaluation, EvaluationResult, FlagReason, FlaggedToken, JudgeConfig,
    JudgeError, JudgeResult, LabeledItem, StatsSnapshot, NEUTRAL_SCORE,
};

use crate::attention::AttentionAnalyzer;
use crate::combiner::ScoreCombiner;
use crate::context::{ContextAlignmentScorer, NO_CONTEXT_SCORE};
use crate::encoder::{EncodeOptions, Encoder, Encoding};
use crate::entropy::{ConfidenceScorer, EntropyScorer};
use crate::running_stats::RunningStatsTracker;
use crate::uncertainty::UncertaintyEstimator;

/// Scores strictly above this are predicted as hallucinations.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Token text reported when a flagged index has no token string.
const UNKNOWN_TOKEN: &str = "[UNK]";

/// Lifecycle as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeState {
    /// Encoder attached, no evaluation in flight.
    Ready,
    /// At least one evaluation in flight.
    Evaluating,
}

/// Hallucination-risk judge.
///
/// Thread-safe: scorers are immutable, the only shared mutable state is
/// the `RunningStatsTracker`, which serialises its own updates.
pub struct Judge {
    config: JudgeConfig,
    options: EncodeOptions,
    encoder: Arc<dyn Encoder>,
    entropy: EntropyScorer,
    confidence: ConfidenceScorer,
    attention: AttentionAnalyzer,
    context: ContextAlignmentScorer,
    combiner: ScoreCombiner,
    uncertainty: UncertaintyEstimator,
    stats: Arc<RunningStatsTracker>,
    in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Judge {
    /// Build a judge with its own stats tracker.
    pub fn new(config: JudgeConfig, encoder: Arc<dyn Encoder>) -> JudgeResult<Self> {
        let stats = Arc::new(RunningStatsTracker::new(
            config.model_name.clone(),
            config.device,
        ));
        Self::with_tracker(config, encoder, stats)
    }

    /// Build a judge that reports into an existing tracker.
    pub fn with_tracker(
        config: JudgeConfig,
        encoder: Arc<dyn Encoder>,
        stats: Arc<RunningStatsTracker>,
    ) -> JudgeResult<Self> {
        config.validate()?;
        log::info!(
            "attention judge ready: model={} device={} n_bootstrap={}",
            config.model_name,
            config.device,
            config.n_bootstrap
        );
        Ok(Self {
            options: EncodeOptions::from_config(&config),
            attention: AttentionAnalyzer::from_config(&config),
            uncertainty: UncertaintyEstimator::from_config(&config),
            context: ContextAlignmentScorer::new(Arc::clone(&encoder)),
            entropy: EntropyScorer,
            confidence: ConfidenceScorer,
            combiner: ScoreCombiner,
            encoder,
            stats,
            config,
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn state(&self) -> JudgeState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            JudgeState::Evaluating
        } else {
            JudgeState::Ready
        }
    }

    /// Score `text`, optionally against a reference `context`.
    ///
    /// Never fails: internal faults degrade to `(0.5, [0, 1])` or to
    /// per-component neutral values.
    pub fn evaluate(&self, text: &str, context: Option<&str>) -> EvaluationResult {
        let detail = self.evaluate_with_attention_details(text, context);
        EvaluationResult::new(detail.hallucination_score, detail.confidence_interval)
    }

    /// Score `text` and expose the flagged tokens, component scores and
    /// any component faults behind the result.
    pub fn evaluate_with_attention_details(
        &self,
        text: &str,
        context: Option<&str>,
    ) -> DetailedEvaluation {
        let _guard = InFlight::enter(&self.in_flight);
        let start = Instant::now();
        let detail = self.run(text, context);
        self.stats.record(start.elapsed(), detail.hallucination_score);

        if detail.is_degraded() {
            log::warn!(
                "evaluation degraded: score={:.4} faults={}",
                detail.hallucination_score,
                detail.faults.len()
            );
        } else {
            log::debug!(
                "evaluation: score={:.4} ci=[{:.4}, {:.4}] flagged={}",
                detail.hallucination_score,
                detail.confidence_interval.lower,
                detail.confidence_interval.upper,
                detail.flagged_tokens.len()
            );
        }
        detail
    }

    /// Evaluate each text independently, preserving input order.
    ///
    /// `contexts`, when given, must match `texts` in length; a mismatch is
    /// the one failure returned to the caller.
    pub fn batch_evaluate<S, C>(
        &self,
        texts: &[S],
        contexts: Option<&[C]>,
    ) -> JudgeResult<Vec<BatchItem>>
    where
        S: AsRef<str>,
        C: AsRef<str>,
    {
        if let Some(ctx) = contexts {
            if ctx.len() != texts.len() {
                return Err(JudgeError::Validation(format!(
                    "contexts length {} does not match texts length {}",
                    ctx.len(),
                    texts.len()
                )));
            }
        }
        Ok(texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let context = contexts.map(|c| c[index].as_ref());
                let result = self.evaluate(text.as_ref(), context);
                BatchItem {
                    index,
                    hallucination_score: result.hallucination_score,
                    confidence_interval: result.confidence_interval,
                }
            })
            .collect())
    }

    /// Confusion-matrix metrics of thresholded scores against labels.
    pub fn evaluate_dataset(&self, items: &[LabeledItem]) -> DatasetMetrics {
        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
        for item in items {
            let score = self
                .evaluate(&item.text, item.context.as_deref())
                .hallucination_score;
            let predicted = score > DECISION_THRESHOLD;
            match (predicted, item.label.is_hallucination()) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fn_ += 1,
            }
        }
        let metrics = confusion_metrics(tp, fp, tn, fn_);
        log::info!(
            "dataset evaluation: samples={} accuracy={:.4} f1={:.4}",
            metrics.samples,
            metrics.accuracy,
            metrics.f1
        );
        metrics
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn stats_tracker(&self) -> Arc<RunningStatsTracker> {
        Arc::clone(&self.stats)
    }

    fn encode(&self, text: &str) -> JudgeResult<Encoding> {
        let encoding = self.encoder.encode(text, &self.options)?;
        encoding.validate()?;
        Ok(encoding)
    }

    fn run(&self, text: &str, context: Option<&str>) -> DetailedEvaluation {
        let mut faults = Vec::new();

        let encoding = match self.encode(text) {
            Ok(encoding) => encoding,
            Err(err) => {
                log::error!("encoder failed, returning neutral result: {err}");
                faults.push(ComponentFault::new(Component::Encoder, &err));
                return neutral_detail(faults);
            }
        };

        let hidden = &encoding.hidden_states;
        let entropy = recover(
            Component::Entropy,
            self.entropy.score(hidden),
            NEUTRAL_SCORE,
            &mut faults,
        );
        let confidence = recover(
            Component::Confidence,
            self.confidence.score(hidden),
            NEUTRAL_SCORE,
            &mut faults,
        );
        let attention = recover(
            Component::Attention,
            self.attention.analyze(&encoding.attentions, encoding.seq_len()),
            AttentionMetrics::neutral(),
            &mut faults,
        );
        let context_score = match context {
            Some(ctx) => recover(
                Component::ContextAlignment,
                self.context.score(text, ctx),
                NEUTRAL_SCORE,
                &mut faults,
            ),
            None => NO_CONTEXT_SCORE,
        };
        let attention_score = recover(
            Component::AttentionFusion,
            self.combiner.attention_subscore(&attention),
            NEUTRAL_SCORE,
            &mut faults,
        );

        let components = ComponentScores::new(entropy, confidence, attention_score, context_score);
        let hallucination_score = recover(
            Component::RiskFusion,
            self.combiner.risk_score(&components),
            NEUTRAL_SCORE,
            &mut faults,
        );
        let confidence_interval = recover(
            Component::Bootstrap,
            self.uncertainty
                .interval(&components, attention.attention_variance),
            ConfidenceInterval::full(),
            &mut faults,
        );

        let flagged_tokens = attention
            .high_entropy_tokens
            .iter()
            .map(|&index| FlaggedToken {
                index,
                token: encoding
                    .tokens
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_TOKEN.to_string()),
                reason: FlagReason::HighEntropy,
            })
            .collect();

        DetailedEvaluation {
            hallucination_score,
            confidence_interval,
            flagged_tokens,
            attention,
            components,
            faults,
        }
    }
}

/// Unwrap a component result, or log, record the fault and fall back.
fn recover<T>(
    component: Component,
    result: JudgeResult<T>,
    fallback: T,
    faults: &mut Vec<ComponentFault>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::warn!("{component} fell back to neutral default: {err}");
            faults.push(ComponentFault::new(component, &err));
            fallback
        }
    }
}

fn neutral_detail(faults: Vec<ComponentFault>) -> DetailedEvaluation {
    let neutral = EvaluationResult::neutral();
    DetailedEvaluation {
        hallucination_score: neutral.hallucination_score,
        confidence_interval: neutral.confidence_interval,
        flagged_tokens: Vec::new(),
        attention: AttentionMetrics::neutral(),
        components: ComponentScores::from_array([NEUTRAL_SCORE; 4]),
        faults,
    }
}

/// Accuracy, precision, recall and F1; each ratio is 0 on a zero denominator.
pub fn confusion_metrics(tp: usize, fp: usize, tn: usize, fn_: usize) -> DatasetMetrics {
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let samples = tp + fp + tn + fn_;
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    DatasetMetrics {
        accuracy: ratio(tp + tn, samples),
        precision,
        recall,
        f1,
        samples,
    }
}
