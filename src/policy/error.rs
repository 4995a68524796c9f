use std::time::Duration;

use thiserror::Error;

/// Why the policy could not produce a direction for a tick.
///
/// None of these reach the simulation: a failed decision is treated exactly
/// like having no suggestion at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The model could not be loaded or the call itself failed
    #[error("policy unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish inside its budget
    #[error("policy call timed out after {0:?}")]
    Timeout(Duration),

    /// The model returned the wrong number of action scores
    #[error("policy returned {actual} scores, expected {expected}")]
    WrongShape { expected: usize, actual: usize },

    /// An action score was NaN or infinite
    #[error("policy score {index} is not finite ({value})")]
    NonFinite { index: usize, value: f32 },
}

impl PolicyError {
    /// True for output that arrived but could not be decoded
    pub fn is_malformed(&self) -> bool {
        matches!(self, PolicyError::WrongShape { .. } | PolicyError::NonFinite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_classification() {
        assert!(PolicyError::WrongShape { expected: 4, actual: 3 }.is_malformed());
        assert!(PolicyError::NonFinite { index: 0, value: f32::NAN }.is_malformed());
        assert!(!PolicyError::Unavailable("gone".into()).is_malformed());
        assert!(!PolicyError::Timeout(Duration::from_millis(5)).is_malformed());
    }

    #[test]
    fn test_messages() {
        let err = PolicyError::WrongShape { expected: 4, actual: 2 };
        assert_eq!(err.to_string(), "policy returned 2 scores, expected 4");

        let err = PolicyError::Unavailable("no model configured".into());
        assert_eq!(err.to_string(), "policy unavailable: no model configured");
    }
}
