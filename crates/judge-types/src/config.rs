// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Configuration
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{JudgeError, JudgeResult};

/// Compute device requested from the encoder.
///
/// Opaque to the scoring arithmetic: it is forwarded to the encoder
/// collaborator and echoed in stats, nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Gpu,
    #[default]
    Auto,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Device {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" | "cuda" => Ok(Self::Gpu),
            "auto" => Ok(Self::Auto),
            other => Err(JudgeError::Config(format!(
                "device must be one of cpu, gpu, auto; got {other:?}"
            ))),
        }
    }
}

/// Construction-time configuration for the judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Opaque model identifier forwarded to the encoder.
    pub model_name: String,

    /// Compute device forwarded to the encoder.
    pub device: Device,

    /// A token is flagged when its raw attention entropy exceeds
    /// `high_entropy_threshold * ln(N)`.
    /// Default: 0.7.
    pub high_entropy_threshold: f64,

    /// Reserved. Not read by any scoring formula.
    /// Default: 0.3.
    pub context_ratio_threshold: f64,

    /// Reserved. Not read by any scoring formula.
    /// Default: 0.5.
    pub attention_variance_threshold: f64,

    /// Number of bootstrap resamples per evaluation.
    /// Default: 100.
    pub n_bootstrap: usize,

    /// Maximum token count handed to the encoder.
    /// Default: 512.
    pub max_length: usize,

    /// Truncate inputs longer than `max_length`.
    pub truncation: bool,

    /// Ask the encoder to pad to a fixed length.
    pub padding: bool,

    /// Seed for the bootstrap random source. `None` draws from OS entropy,
    /// `Some` makes every evaluation of identical tensors reproducible.
    pub bootstrap_seed: Option<u64>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model_name: "bert-base-uncased".to_string(),
            device: Device::Auto,
            high_entropy_threshold: 0.7,
            context_ratio_threshold: 0.3,
            attention_variance_threshold: 0.5,
            n_bootstrap: 100,
            max_length: 512,
            truncation: true,
            padding: true,
            bootstrap_seed: None,
        }
    }
}

impl JudgeConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> JudgeResult<()> {
        let unit_params = [
            ("high_entropy_threshold", self.high_entropy_threshold),
            ("context_ratio_threshold", self.context_ratio_threshold),
            (
                "attention_variance_threshold",
                self.attention_variance_threshold,
            ),
        ];
        for (name, value) in unit_params {
            if !(0.0..=1.0).contains(&value) {
                return Err(JudgeError::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.n_bootstrap == 0 {
            return Err(JudgeError::Config(
                "n_bootstrap must be >= 1".to_string(),
            ));
        }
        // Room for the [CLS] and [SEP] sentinels.
        if self.max_length < 2 {
            return Err(JudgeError::Config(format!(
                "max_length must be >= 2, got {}",
                self.max_length
            )));
        }
        if self.model_name.trim().is_empty() {
            return Err(JudgeError::Config(
                "model_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> JudgeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| JudgeError::Config(format!("JSON parse error: {e}")))
    }
}
