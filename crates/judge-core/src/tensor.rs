// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Encoder Tensors
// ─────────────────────────────────────────────────────────────────────
//! Flat row-major containers for the encoder's forward-pass outputs.
//!
//! Constructors only check that the buffer length matches the declared
//! shape. Degenerate shapes (zero rows, zero width) are representable
//! so that the scorers can report them as computation faults.

use judge_types::{JudgeError, JudgeResult};

/// N×H token representations for a single example.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenStates {
    seq_len: usize,
    width: usize,
    data: Vec<f64>, // flattened N×H, row-major
}

impl HiddenStates {
    pub fn new(seq_len: usize, width: usize, data: Vec<f64>) -> JudgeResult<Self> {
        if data.len() != seq_len * width {
            return Err(JudgeError::Encoder(format!(
                "hidden states: {} values for shape {seq_len}x{width}",
                data.len()
            )));
        }
        Ok(Self {
            seq_len,
            width,
            data,
        })
    }

    /// Build from one vector per token. Ragged rows are rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> JudgeResult<Self> {
        let seq_len = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(i) = rows.iter().position(|r| r.len() != width) {
            return Err(JudgeError::Encoder(format!(
                "hidden states: row {i} has width {}, expected {width}",
                rows[i].len()
            )));
        }
        Self::new(seq_len, width, rows.into_iter().flatten().collect())
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i < self.seq_len && self.width > 0 {
            Some(&self.data[i * self.width..(i + 1) * self.width])
        } else {
            None
        }
    }
}

/// One layer of self-attention weights, heads×N×N.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionLayer {
    heads: usize,
    seq_len: usize,
    data: Vec<f64>, // flattened heads×N×N, row-major
}

impl AttentionLayer {
    pub fn new(heads: usize, seq_len: usize, data: Vec<f64>) -> JudgeResult<Self> {
        if data.len() != heads * seq_len * seq_len {
            return Err(JudgeError::Encoder(format!(
                "attention layer: {} values for shape {heads}x{seq_len}x{seq_len}",
                data.len()
            )));
        }
        Ok(Self {
            heads,
            seq_len,
            data,
        })
    }

    /// Build from `[head][query][key]` nested vectors.
    pub fn from_heads(heads: Vec<Vec<Vec<f64>>>) -> JudgeResult<Self> {
        let n_heads = heads.len();
        let seq_len = heads.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_heads * seq_len * seq_len);
        for (h, matrix) in heads.into_iter().enumerate() {
            if matrix.len() != seq_len || matrix.iter().any(|row| row.len() != seq_len) {
                return Err(JudgeError::Encoder(format!(
                    "attention layer: head {h} is not {seq_len}x{seq_len}"
                )));
            }
            data.extend(matrix.into_iter().flatten());
        }
        Self::new(n_heads, seq_len, data)
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Average across the head axis, giving one flattened N×N matrix.
    pub fn mean_over_heads(&self) -> JudgeResult<Vec<f64>> {
        if self.heads == 0 || self.seq_len == 0 {
            return Err(JudgeError::Computation(format!(
                "attention layer: degenerate shape {}x{}x{}",
                self.heads, self.seq_len, self.seq_len
            )));
        }
        let plane = self.seq_len * self.seq_len;
        let mut out = vec![0.0; plane];
        for head in self.data.chunks_exact(plane) {
            for (acc, v) in out.iter_mut().zip(head) {
                *acc += v;
            }
        }
        let h = self.heads as f64;
        out.iter_mut().for_each(|v| *v /= h);
        Ok(out)
    }
}

/// Per-layer attention, first layer first. Only the last layer is scored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttentionStack {
    layers: Vec<AttentionLayer>,
}

impl AttentionStack {
    pub fn new(layers: Vec<AttentionLayer>) -> Self {
        Self { layers }
    }

    pub fn last(&self) -> Option<&AttentionLayer> {
        self.layers.last()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[AttentionLayer] {
        &self.layers
    }
}
