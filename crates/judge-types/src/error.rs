// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Attention Judge Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all attention judge failures.
///
/// Only `Validation` and `Config` ever reach a caller as an `Err`.
/// `Encoder` and `Computation` are caught at the boundary of the
/// component that produced them and collapsed to a neutral default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JudgeError {
    /// The encoder collaborator failed or returned malformed tensors.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// Numeric degeneracy: empty sequence, zero-width matrix, NaN/Inf.
    #[error("computation error: {0}")]
    Computation(String),

    /// Caller contract violation (e.g. mismatched batch lengths).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl JudgeError {
    /// Short machine-readable tag, used in fault records and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encoder(_) => "encoder",
            Self::Computation(_) => "computation",
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
        }
    }
}

pub type JudgeResult<T> = Result<T, JudgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_reason() {
        let err = JudgeError::Validation("texts=2, contexts=1".into());
        assert_eq!(err.to_string(), "validation error: texts=2, contexts=1");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(JudgeError::Encoder(String::new()).kind(), "encoder");
        assert_eq!(JudgeError::Computation(String::new()).kind(), "computation");
    }
}
