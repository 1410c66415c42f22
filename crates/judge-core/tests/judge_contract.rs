// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Contract Tests
// ─────────────────────────────────────────────────────────────────────
//! End-to-end checks of the public `Judge` contract.

use std::sync::Arc;
use std::thread;

use judge_core::{
    AttentionLayer, AttentionStack, Encoding, ExternalEncoder, HashingEncoder, HiddenStates,
    Judge, RunningStatsTracker,
};
use judge_types::{
    Component, Device, GroundTruth, JudgeConfig, JudgeError, LabeledItem,
};

fn seeded(seed: u64) -> JudgeConfig {
    JudgeConfig {
        bootstrap_seed: Some(seed),
        ..Default::default()
    }
}

/// Encoder whose last attention layer has one diffuse row and N−1
/// sharp rows, so attention variance is strictly positive.
fn spiky_encoder(n: usize, width: usize) -> Arc<ExternalEncoder> {
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..width).map(|d| ((i * 31 + d * 17) % 11) as f64 / 10.0).collect())
        .collect();
    let mut attention: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();
    attention[n / 2] = vec![1.0 / n as f64; n];

    let hidden = HiddenStates::from_rows(rows).unwrap();
    let stack = AttentionStack::new(vec![
        AttentionLayer::from_heads(vec![vec![vec![1.0 / n as f64; n]; n]]).unwrap(),
        AttentionLayer::from_heads(vec![attention]).unwrap(),
    ]);
    Arc::new(ExternalEncoder::new(
        move |_, _| {
            Ok(Encoding {
                token_ids: (0..n as u32).collect(),
                tokens: (0..n).map(|i| format!("tok{i}")).collect(),
                hidden_states: hidden.clone(),
                attentions: stack.clone(),
            })
        },
        |t| Ok(t.split_whitespace().map(str::to_lowercase).collect()),
    ))
}

#[test]
fn eiffel_tower_scores_are_bounded_and_repeatable() {
    let judge = Judge::new(seeded(11), Arc::new(HashingEncoder::default())).unwrap();
    let a = judge.evaluate("The Eiffel Tower is 500m tall", None);
    let b = judge.evaluate("The Eiffel Tower is 500m tall", None);

    assert!((0.0..=1.0).contains(&a.hallucination_score));
    let (lo, hi) = a.confidence_interval.as_tuple();
    assert!(0.0 <= lo && lo <= hi && hi <= 1.0);
    assert_eq!(a, b);
}

#[test]
fn unseeded_judge_still_returns_well_formed_intervals() {
    let judge = Judge::new(JudgeConfig::default(), spiky_encoder(6, 8)).unwrap();
    for _ in 0..5 {
        let r = judge.evaluate("whatever", None);
        let ci = r.confidence_interval;
        assert!(0.0 <= ci.lower && ci.lower <= ci.upper && ci.upper <= 1.0);
    }
}

#[test]
fn detailed_result_flags_the_diffuse_position() {
    let judge = Judge::new(seeded(3), spiky_encoder(6, 8)).unwrap();
    let detail = judge.evaluate_with_attention_details("six tokens of text here", None);
    assert!(detail.faults.is_empty());
    assert_eq!(detail.flagged_tokens.len(), 1);
    assert_eq!(detail.flagged_tokens[0].index, 3);
    assert_eq!(detail.flagged_tokens[0].token, "tok3");
    assert!(detail.attention.attention_variance > 0.0);
    assert!(detail.confidence_interval.width() > 0.0);

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["flagged_tokens"][0]["reason"], "high_entropy");
}

#[test]
fn detailed_and_plain_evaluation_agree() {
    let judge = Judge::new(seeded(5), Arc::new(HashingEncoder::default())).unwrap();
    let text = "Mount Everest is the tallest mountain above sea level";
    let plain = judge.evaluate(text, Some("Everest is 8849 m above sea level"));
    let detail =
        judge.evaluate_with_attention_details(text, Some("Everest is 8849 m above sea level"));
    assert_eq!(plain.hallucination_score, detail.hallucination_score);
    assert_eq!(plain.confidence_interval, detail.confidence_interval);
}

#[test]
fn malformed_encoder_output_degrades_to_neutral() {
    let encoder = Arc::new(ExternalEncoder::new(
        |_, _| {
            Ok(Encoding {
                token_ids: vec![1, 2, 3],
                tokens: vec!["a".into(), "b".into(), "c".into()],
                hidden_states: HiddenStates::from_rows(vec![vec![0.0; 4]; 2])?,
                attentions: AttentionStack::default(),
            })
        },
        |_| Ok(Vec::new()),
    ));
    let judge = Judge::new(seeded(1), encoder).unwrap();
    let detail = judge.evaluate_with_attention_details("text", None);
    assert_eq!(detail.hallucination_score, 0.5);
    assert_eq!(detail.confidence_interval.as_tuple(), (0.0, 1.0));
    assert_eq!(detail.faults[0].component, Component::Encoder);
}

#[test]
fn batch_rejects_mismatched_contexts() {
    let judge = Judge::new(seeded(1), Arc::new(HashingEncoder::default())).unwrap();
    let result = judge.batch_evaluate(&["a", "b"], Some(&["only one"][..]));
    assert!(matches!(result, Err(JudgeError::Validation(_))));
}

#[test]
fn batch_with_contexts_matches_single_calls() {
    let judge = Judge::new(seeded(9), Arc::new(HashingEncoder::default())).unwrap();
    let texts = vec!["Water boils at 100 C".to_string(), "The moon is cheese".to_string()];
    let contexts = vec![
        "At sea level water boils at 100 C".to_string(),
        "The moon is rock".to_string(),
    ];
    let items = judge.batch_evaluate(texts.as_slice(), Some(contexts.as_slice())).unwrap();
    for item in &items {
        let single = judge.evaluate(&texts[item.index], Some(contexts[item.index].as_str()));
        assert_eq!(item.hallucination_score, single.hallucination_score);
        assert_eq!(item.confidence_interval, single.confidence_interval);
    }
}

#[test]
fn dataset_evaluation_counts_every_sample() {
    let judge = Judge::new(seeded(2), Arc::new(HashingEncoder::default())).unwrap();
    let items = vec![
        LabeledItem::new("Paris is the capital of France", GroundTruth::Accurate),
        LabeledItem::new("The sun orbits the earth", GroundTruth::Hallucination),
        LabeledItem::new("Two plus two is four", GroundTruth::Accurate)
            .with_context("Basic arithmetic: two plus two is four"),
    ];
    let metrics = judge.evaluate_dataset(&items);
    assert_eq!(metrics.samples, 3);
    for v in [metrics.accuracy, metrics.precision, metrics.recall, metrics.f1] {
        assert!((0.0..=1.0).contains(&v));
    }
    assert_eq!(judge.get_stats().evaluations, 3);
}

#[test]
fn concurrent_evaluations_share_one_tracker() {
    let tracker = Arc::new(RunningStatsTracker::new("shared-model", Device::Gpu));
    let judge = Arc::new(
        Judge::with_tracker(seeded(4), Arc::new(HashingEncoder::default()), Arc::clone(&tracker))
            .unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let judge = Arc::clone(&judge);
            thread::spawn(move || {
                (0..10)
                    .map(|i| {
                        let text = format!("thread {t} sample {i}");
                        judge.evaluate(&text, None).hallucination_score
                    })
                    .collect::<Vec<f64>>()
            })
        })
        .collect();
    let scores: Vec<f64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let snap = tracker.snapshot();
    assert_eq!(snap.evaluations, 40);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    assert!((snap.avg_score - mean).abs() < 1e-9);
    assert_eq!(snap.device, Device::Gpu);
    assert_eq!(judge.get_stats(), snap);
}
