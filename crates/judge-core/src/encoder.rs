// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Encoder Interface
// ─────────────────────────────────────────────────────────────────────
//! Encoder trait, closure-backed external encoder, and a deterministic
//! hashing encoder.
//!
//! In production the real transformer runs behind this trait, either
//! in the Python service (via the PyO3 bridge) or in an embedded
//! runtime. The hashing encoder needs no model weights and gives
//! reproducible tensors for testing and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use judge_types::{JudgeConfig, JudgeError, JudgeResult};

use crate::tensor::{AttentionLayer, AttentionStack, HiddenStates};

/// Tokenisation options forwarded to the encoder on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub max_length: usize,
    pub truncation: bool,
    pub padding: bool,
}

impl EncodeOptions {
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self {
            max_length: config.max_length,
            truncation: config.truncation,
            padding: config.padding,
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::from_config(&JudgeConfig::default())
    }
}

/// Output of a single inference-mode forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub token_ids: Vec<u32>,
    /// Token strings aligned with `token_ids`.
    pub tokens: Vec<String>,
    pub hidden_states: HiddenStates,
    pub attentions: AttentionStack,
}

impl Encoding {
    pub fn seq_len(&self) -> usize {
        self.token_ids.len()
    }

    /// Check that ids, tokens, hidden rows and attention layers agree on N.
    pub fn validate(&self) -> JudgeResult<()> {
        let n = self.token_ids.len();
        if self.tokens.len() != n {
            return Err(JudgeError::Encoder(format!(
                "{} token strings for {n} token ids",
                self.tokens.len()
            )));
        }
        if self.hidden_states.seq_len() != n {
            return Err(JudgeError::Encoder(format!(
                "hidden states have {} rows for {n} tokens",
                self.hidden_states.seq_len()
            )));
        }
        if let Some((i, layer)) = self
            .attentions
            .layers()
            .iter()
            .enumerate()
            .find(|(_, layer)| layer.seq_len() != n)
        {
            return Err(JudgeError::Encoder(format!(
                "attention layer {i} is {0}x{0} for {n} tokens",
                layer.seq_len()
            )));
        }
        Ok(())
    }
}

/// Trait for encoder backends.
///
/// Implementations must be inference-only: no gradients, no state
/// carried between calls.
pub trait Encoder: Send + Sync {
    /// Run one forward pass over `text`.
    fn encode(&self, text: &str, options: &EncodeOptions) -> JudgeResult<Encoding>;

    /// Tokenise `text` without special tokens.
    fn tokenize(&self, text: &str) -> JudgeResult<Vec<String>>;
}

type EncodeFn = Box<dyn Fn(&str, &EncodeOptions) -> JudgeResult<Encoding> + Send + Sync>;
type TokenizeFn = Box<dyn Fn(&str) -> JudgeResult<Vec<String>> + Send + Sync>;

/// External encoder that calls back into closures.
///
/// Used by the PyO3 FFI layer to delegate the forward pass to Python
/// (where the transformer lives) while the scoring stays in Rust.
pub struct ExternalEncoder {
    encode_fn: EncodeFn,
    tokenize_fn: TokenizeFn,
}

impl ExternalEncoder {
    pub fn new(
        encode_fn: impl Fn(&str, &EncodeOptions) -> JudgeResult<Encoding> + Send + Sync + 'static,
        tokenize_fn: impl Fn(&str) -> JudgeResult<Vec<String>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            encode_fn: Box::new(encode_fn),
            tokenize_fn: Box::new(tokenize_fn),
        }
    }
}

impl Encoder for ExternalEncoder {
    fn encode(&self, text: &str, options: &EncodeOptions) -> JudgeResult<Encoding> {
        (self.encode_fn)(text, options)
    }

    fn tokenize(&self, text: &str) -> JudgeResult<Vec<String>> {
        (self.tokenize_fn)(text)
    }
}

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";

const VOCAB_SIZE: u64 = 30_522;

/// Deterministic model-free encoder.
///
/// - Tokens: lower-cased alphanumeric runs, each punctuation mark on its
///   own, wrapped in `[CLS]` … `[SEP]`.
/// - Hidden states: per-token vectors seeded from an FNV-1a hash of the
///   token, plus a small sinusoidal position signal.
/// - Attention: scaled dot-product softmax over the hidden states, with
///   a per-head temperature.
pub struct HashingEncoder {
    width: usize,
    heads: usize,
    layers: usize,
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(32, 4, 2)
    }
}

impl HashingEncoder {
    pub fn new(width: usize, heads: usize, layers: usize) -> Self {
        Self {
            width: width.max(1),
            heads: heads.max(1),
            layers: layers.max(1),
        }
    }

    fn embed(&self, token: &str, position: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(fnv1a(token));
        (0..self.width)
            .map(|d| {
                let value: f64 = rng.gen_range(-1.0..1.0);
                let exponent = (2 * (d / 2)) as f64 / self.width as f64;
                let angle = position as f64 / 10_000f64.powf(exponent);
                let pos = if d % 2 == 0 { angle.sin() } else { angle.cos() };
                value + 0.1 * pos
            })
            .collect()
    }

    fn attention_layer(&self, hidden: &[Vec<f64>], layer: usize) -> JudgeResult<AttentionLayer> {
        let n = hidden.len();
        let scale = (self.width as f64).sqrt();
        let mut data = Vec::with_capacity(self.heads * n * n);
        for head in 0..self.heads {
            let temperature = 1.0 + (head + layer) as f64 * 0.5;
            for q in hidden {
                let logits: Vec<f64> = hidden
                    .iter()
                    .map(|k| dot(q, k) / (scale * temperature))
                    .collect();
                data.extend(crate::stats::softmax(&logits)?);
            }
        }
        AttentionLayer::new(self.heads, n, data)
    }
}

impl Encoder for HashingEncoder {
    fn encode(&self, text: &str, options: &EncodeOptions) -> JudgeResult<Encoding> {
        if options.max_length < 2 {
            return Err(JudgeError::Encoder(format!(
                "max_length {} leaves no room for {CLS_TOKEN} and {SEP_TOKEN}",
                options.max_length
            )));
        }
        let mut body = self.tokenize(text)?;
        let budget = options.max_length - 2;
        if body.len() > budget {
            if !options.truncation {
                return Err(JudgeError::Encoder(format!(
                    "sequence of {} tokens exceeds max_length {}",
                    body.len() + 2,
                    options.max_length
                )));
            }
            body.truncate(budget);
        }
        // Padding to the longest sequence is a no-op for a single example.

        let mut tokens = Vec::with_capacity(body.len() + 2);
        tokens.push(CLS_TOKEN.to_string());
        tokens.extend(body);
        tokens.push(SEP_TOKEN.to_string());

        let token_ids = tokens
            .iter()
            .map(|t| (fnv1a(t) % VOCAB_SIZE) as u32)
            .collect();
        let hidden: Vec<Vec<f64>> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| self.embed(t, i))
            .collect();
        let attentions = (0..self.layers)
            .map(|l| self.attention_layer(&hidden, l))
            .collect::<JudgeResult<Vec<_>>>()?;

        Ok(Encoding {
            token_ids,
            tokens,
            hidden_states: HiddenStates::from_rows(hidden)?,
            attentions: AttentionStack::new(attentions),
        })
    }

    fn tokenize(&self, text: &str) -> JudgeResult<Vec<String>> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        for ch in text.chars() {
            if ch.is_alphanumeric() {
                current.extend(ch.to_lowercase());
                continue;
            }
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !ch.is_whitespace() {
                tokens.push(ch.to_string());
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        Ok(tokens)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}
