// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust attention judge.
//!
//! The transformer stays in Python. The service passes two callables:
//! one running the forward pass, one running the tokenizer. Everything
//! after the forward pass runs in Rust.
//!
//! # FFI Safety
//!
//! - GIL acquired via `Python::with_gil` before every Python callback.
//! - Python exceptions and malformed callback output become encoder
//!   faults, which the judge turns into neutral scores.
//! - The GIL is released while the judge scores a text.
//! - Config validated before storage (`JudgeConfig::validate()`).
//!
//! Usage from Python:
//! ```python
//! from attention_judge import Judge, JudgeConfig
//!
//! judge = Judge(JudgeConfig(bootstrap_seed=7), encode_fn, tokenize_fn)
//! score, (lower, upper) = judge.evaluate("The Eiffel Tower is 500m tall")
//! ```

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use judge_core::encoder::{EncodeOptions, Encoder, Encoding, ExternalEncoder, HashingEncoder};
use judge_core::{AttentionLayer, AttentionStack, HiddenStates, Judge};
use judge_types::{
    DetailedEvaluation, GroundTruth, JudgeConfig, JudgeError, JudgeResult, LabeledItem,
};

/// Encode callback output:
/// `(token_ids, tokens, hidden[N][H], attentions[layer][head][N][N])`.
type PyEncoding = (Vec<u32>, Vec<String>, Vec<Vec<f64>>, Vec<Vec<Vec<Vec<f64>>>>);

fn to_py_err(err: JudgeError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ─── PyJudgeConfig ──────────────────────────────────────────────────

/// Python-visible configuration for the attention judge.
#[pyclass(name = "JudgeConfig")]
#[derive(Clone)]
struct PyJudgeConfig {
    inner: JudgeConfig,
}

#[pymethods]
impl PyJudgeConfig {
    #[new]
    #[pyo3(signature = (
        model_name = "bert-base-uncased".to_string(),
        device = "auto",
        high_entropy_threshold = 0.7,
        context_ratio_threshold = 0.3,
        attention_variance_threshold = 0.5,
        n_bootstrap = 100,
        max_length = 512,
        truncation = true,
        padding = true,
        bootstrap_seed = None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        model_name: String,
        device: &str,
        high_entropy_threshold: f64,
        context_ratio_threshold: f64,
        attention_variance_threshold: f64,
        n_bootstrap: usize,
        max_length: usize,
        truncation: bool,
        padding: bool,
        bootstrap_seed: Option<u64>,
    ) -> PyResult<Self> {
        let config = JudgeConfig {
            model_name,
            device: device.parse().map_err(to_py_err)?,
            high_entropy_threshold,
            context_ratio_threshold,
            attention_variance_threshold,
            n_bootstrap,
            max_length,
            truncation,
            padding,
            bootstrap_seed,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = JudgeConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    #[getter]
    fn model_name(&self) -> &str {
        &self.inner.model_name
    }

    #[getter]
    fn device(&self) -> &'static str {
        self.inner.device.as_str()
    }

    #[getter]
    fn n_bootstrap(&self) -> usize {
        self.inner.n_bootstrap
    }

    fn __repr__(&self) -> String {
        format!(
            "JudgeConfig(model_name={:?}, device={}, high_entropy_threshold={}, n_bootstrap={})",
            self.inner.model_name,
            self.inner.device,
            self.inner.high_entropy_threshold,
            self.inner.n_bootstrap
        )
    }
}

// ─── Python-backed encoder ──────────────────────────────────────────

fn encoding_from_py(raw: PyEncoding) -> JudgeResult<Encoding> {
    let (token_ids, tokens, hidden, attentions) = raw;
    let layers = attentions
        .into_iter()
        .map(AttentionLayer::from_heads)
        .collect::<JudgeResult<Vec<_>>>()?;
    Ok(Encoding {
        token_ids,
        tokens,
        hidden_states: HiddenStates::from_rows(hidden)?,
        attentions: AttentionStack::new(layers),
    })
}

fn python_encoder(encode_cb: PyObject, tokenize_cb: PyObject) -> ExternalEncoder {
    ExternalEncoder::new(
        move |text: &str, options: &EncodeOptions| {
            let raw = Python::with_gil(|py| -> PyResult<PyEncoding> {
                encode_cb
                    .call1(
                        py,
                        (text, options.max_length, options.truncation, options.padding),
                    )?
                    .extract::<PyEncoding>(py)
            })
            .map_err(|e| JudgeError::Encoder(format!("python encode callback: {e}")))?;
            encoding_from_py(raw)
        },
        move |text: &str| {
            Python::with_gil(|py| -> PyResult<Vec<String>> {
                tokenize_cb.call1(py, (text,))?.extract::<Vec<String>>(py)
            })
            .map_err(|e| JudgeError::Encoder(format!("python tokenize callback: {e}")))
        },
    )
}

fn detail_to_dict<'py>(
    py: Python<'py>,
    detail: &DetailedEvaluation,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("hallucination_score", detail.hallucination_score)?;
    dict.set_item("confidence_interval", detail.confidence_interval.as_tuple())?;

    let flagged = PyList::empty(py);
    for token in &detail.flagged_tokens {
        let item = PyDict::new(py);
        item.set_item("index", token.index)?;
        item.set_item("token", &token.token)?;
        item.set_item("reason", token.reason.as_str())?;
        flagged.append(item)?;
    }
    dict.set_item("flagged_tokens", flagged)?;

    let attention = PyDict::new(py);
    attention.set_item("attention_entropy", detail.attention.attention_entropy)?;
    attention.set_item("context_ratio", detail.attention.context_ratio)?;
    attention.set_item("attention_variance", detail.attention.attention_variance)?;
    attention.set_item("high_entropy_tokens", detail.attention.high_entropy_tokens.clone())?;
    dict.set_item("attention_metrics", attention)?;

    let components = PyDict::new(py);
    components.set_item("entropy", detail.components.entropy)?;
    components.set_item("confidence", detail.components.confidence)?;
    components.set_item("attention", detail.components.attention)?;
    components.set_item("context", detail.components.context)?;
    dict.set_item("components", components)?;

    let faults = PyList::empty(py);
    for fault in &detail.faults {
        let item = PyDict::new(py);
        item.set_item("component", fault.component.as_str())?;
        item.set_item("kind", &fault.kind)?;
        item.set_item("reason", &fault.reason)?;
        faults.append(item)?;
    }
    dict.set_item("faults", faults)?;
    Ok(dict)
}

fn labeled_item_from_dict(entry: &Bound<'_, PyDict>) -> PyResult<LabeledItem> {
    let text: String = entry
        .get_item("text")?
        .ok_or_else(|| PyValueError::new_err("dataset item is missing 'text'"))?
        .extract()?;
    let label: u8 = entry
        .get_item("label")?
        .ok_or_else(|| PyValueError::new_err("dataset item is missing 'label'"))?
        .extract()?;
    let context: Option<String> = match entry.get_item("context")? {
        Some(value) => value.extract()?,
        None => None,
    };
    Ok(LabeledItem {
        text,
        context,
        label: GroundTruth::try_from(label).map_err(to_py_err)?,
    })
}

// ─── PyJudge ────────────────────────────────────────────────────────

/// Attention-based hallucination judge exposed to Python.
///
/// The forward pass and tokenizer are Python callables that cross the
/// FFI boundary per invocation. The scoring runs in Rust.
#[pyclass(name = "Judge")]
struct PyJudge {
    inner: Arc<Judge>,
}

#[pymethods]
impl PyJudge {
    /// Create a new judge.
    ///
    /// Args:
    ///     config: Optional JudgeConfig (uses defaults if None).
    ///     encode_callback: Optional Callable[[str, int, bool, bool],
    ///         tuple[list[int], list[str], list[list[float]],
    ///         list[list[list[list[float]]]]]] running the forward pass.
    ///     tokenize_callback: Callable[[str], list[str]]; required with
    ///         encode_callback.
    ///
    /// Without callbacks the deterministic hashing encoder is used.
    #[new]
    #[pyo3(signature = (config = None, encode_callback = None, tokenize_callback = None))]
    fn new(
        config: Option<PyJudgeConfig>,
        encode_callback: Option<PyObject>,
        tokenize_callback: Option<PyObject>,
    ) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let encoder: Arc<dyn Encoder> = match (encode_callback, tokenize_callback) {
            (Some(enc), Some(tok)) => Arc::new(python_encoder(enc, tok)),
            (None, None) => Arc::new(HashingEncoder::default()),
            _ => {
                return Err(PyValueError::new_err(
                    "encode_callback and tokenize_callback must be given together",
                ))
            }
        };
        let judge = Judge::new(cfg, encoder).map_err(to_py_err)?;
        Ok(Self {
            inner: Arc::new(judge),
        })
    }

    /// Score a text.
    ///
    /// Returns: tuple(score: float, (lower: float, upper: float))
    #[pyo3(signature = (text, context = None))]
    fn evaluate(
        &self,
        py: Python<'_>,
        text: &str,
        context: Option<&str>,
    ) -> (f64, (f64, f64)) {
        let judge = Arc::clone(&self.inner);
        let result = py.allow_threads(|| judge.evaluate(text, context));
        (
            result.hallucination_score,
            result.confidence_interval.as_tuple(),
        )
    }

    /// Score a text and return flagged tokens, components and faults.
    #[pyo3(signature = (text, context = None))]
    fn evaluate_with_attention_details<'py>(
        &self,
        py: Python<'py>,
        text: &str,
        context: Option<&str>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let judge = Arc::clone(&self.inner);
        let detail = py.allow_threads(|| judge.evaluate_with_attention_details(text, context));
        detail_to_dict(py, &detail)
    }

    /// Score each text independently.
    ///
    /// Raises ValueError if `contexts` is given with a different length.
    #[pyo3(signature = (texts, contexts = None))]
    fn batch_evaluate<'py>(
        &self,
        py: Python<'py>,
        texts: Vec<String>,
        contexts: Option<Vec<String>>,
    ) -> PyResult<Bound<'py, PyList>> {
        let judge = Arc::clone(&self.inner);
        let items = py
            .allow_threads(|| judge.batch_evaluate(&texts, contexts.as_deref()))
            .map_err(to_py_err)?;
        let out = PyList::empty(py);
        for item in items {
            let dict = PyDict::new(py);
            dict.set_item("index", item.index)?;
            dict.set_item("hallucination_score", item.hallucination_score)?;
            dict.set_item("confidence_interval", item.confidence_interval.as_tuple())?;
            out.append(dict)?;
        }
        Ok(out)
    }

    /// Accuracy/precision/recall/F1 over `[{"text", "label", "context"?}]`.
    fn evaluate_dataset<'py>(
        &self,
        py: Python<'py>,
        dataset: Vec<Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let items = dataset
            .iter()
            .map(labeled_item_from_dict)
            .collect::<PyResult<Vec<_>>>()?;
        let judge = Arc::clone(&self.inner);
        let metrics = py.allow_threads(|| judge.evaluate_dataset(&items));
        let dict = PyDict::new(py);
        dict.set_item("accuracy", metrics.accuracy)?;
        dict.set_item("precision", metrics.precision)?;
        dict.set_item("recall", metrics.recall)?;
        dict.set_item("f1", metrics.f1)?;
        dict.set_item("samples", metrics.samples)?;
        Ok(dict)
    }

    fn get_stats<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let snap = self.inner.get_stats();
        let dict = PyDict::new(py);
        dict.set_item("evaluations", snap.evaluations)?;
        dict.set_item("total_time", snap.total_time)?;
        dict.set_item("avg_score", snap.avg_score)?;
        dict.set_item("avg_processing_time", snap.avg_processing_time)?;
        dict.set_item("model_name", snap.model_name)?;
        dict.set_item("device", snap.device.as_str())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        let snap = self.inner.get_stats();
        format!(
            "Judge(model_name={:?}, device={}, evaluations={})",
            snap.model_name, snap.device, snap.evaluations
        )
    }
}

// ─── Module Registration ────────────────────────────────────────────

/// Attention Judge — Rust statistical hallucination-risk estimator.
///
/// - `JudgeConfig` — configuration
/// - `Judge` — evaluate / details / batch / dataset / stats
#[pymodule]
fn attention_judge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyJudgeConfig>()?;
    m.add_class::<PyJudge>()?;
    Ok(())
}
