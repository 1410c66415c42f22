// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Tensor Statistics
// ─────────────────────────────────────────────────────────────────────
//! Entropy and variance primitives over numeric vectors.
//!
//! Every function either returns a finite value or a
//! `JudgeError::Computation`; none of them panic on empty or
//! non-finite input.

use std::cmp::Ordering;

use judge_types::{JudgeError, JudgeResult};

/// Added inside `ln(p + ε)` so zero probabilities contribute nothing.
pub const LOG_EPSILON: f64 = 1e-10;

/// Tolerance when deciding whether a row already sums to one.
const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

fn ensure_finite(values: &[f64], what: &str) -> JudgeResult<()> {
    if values.is_empty() {
        return Err(JudgeError::Computation(format!("{what}: empty input")));
    }
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(JudgeError::Computation(format!(
            "{what}: non-finite value at position {pos}"
        )));
    }
    Ok(())
}

/// Numerically stable softmax.
pub fn softmax(values: &[f64]) -> JudgeResult<Vec<f64>> {
    ensure_finite(values, "softmax")?;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return Err(JudgeError::Computation(format!(
            "softmax: degenerate partition sum {sum}"
        )));
    }
    Ok(exps.into_iter().map(|e| e / sum).collect())
}

/// Shannon entropy in nats: `-Σ p·ln(p + ε)`.
///
/// Never negative; the ε term would otherwise push a one-hot
/// distribution a hair below zero.
pub fn shannon_entropy(probs: &[f64]) -> f64 {
    let h: f64 = probs.iter().map(|&p| -p * (p + LOG_EPSILON).ln()).sum();
    h.max(0.0)
}

/// Entropy divided by `ln(len)`, the maximum for `len` outcomes.
pub fn normalized_entropy(probs: &[f64]) -> JudgeResult<f64> {
    if probs.len() < 2 {
        return Err(JudgeError::Computation(format!(
            "normalized_entropy: need at least 2 outcomes, got {}",
            probs.len()
        )));
    }
    Ok(shannon_entropy(probs) / (probs.len() as f64).ln())
}

/// True when `values` is already a probability distribution.
pub fn is_distribution(values: &[f64]) -> bool {
    !values.is_empty()
        && values.iter().all(|v| v.is_finite() && *v >= 0.0)
        && (values.iter().sum::<f64>() - 1.0).abs() <= DISTRIBUTION_TOLERANCE
}

/// Turn a row of weights into a probability distribution.
///
/// Non-negative rows with positive mass are divided by their sum, so
/// attention that sums to one up to float32 rounding keeps its shape.
/// Rows with negative entries are logits and go through softmax; an
/// all-zero row becomes uniform.
pub fn as_distribution(values: &[f64]) -> JudgeResult<Vec<f64>> {
    ensure_finite(values, "as_distribution")?;
    let sum: f64 = values.iter().sum();
    if values.iter().all(|v| *v >= 0.0) && sum > 0.0 {
        Ok(values.iter().map(|v| v / sum).collect())
    } else {
        softmax(values)
    }
}

pub fn mean(values: &[f64]) -> JudgeResult<f64> {
    ensure_finite(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`, not `n - 1`).
pub fn variance(values: &[f64]) -> JudgeResult<f64> {
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(var.max(0.0))
}

/// Column means of a row-major `rows × cols` matrix.
pub fn column_means(data: &[f64], rows: usize, cols: usize) -> JudgeResult<Vec<f64>> {
    if rows == 0 || cols == 0 || data.len() != rows * cols {
        return Err(JudgeError::Computation(format!(
            "column_means: bad shape {rows}x{cols} for {} values",
            data.len()
        )));
    }
    ensure_finite(data, "column_means")?;
    let mut out = vec![0.0; cols];
    for row in data.chunks_exact(cols) {
        for (acc, v) in out.iter_mut().zip(row) {
            *acc += v;
        }
    }
    let n = rows as f64;
    out.iter_mut().for_each(|v| *v /= n);
    Ok(out)
}

/// Linear-interpolated quantile, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> JudgeResult<f64> {
    ensure_finite(values, "quantile")?;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let q = q.clamp(0.0, 1.0);
    let idx = q * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        Ok(sorted[lo])
    } else {
        let t = idx - lo as f64;
        Ok(sorted[lo] * (1.0 - t) + sorted[hi] * t)
    }
}
