//! EvaluationOracle trait abstraction for position evaluators

use async_trait::async_trait;
use chess::PositionEvaluation;

use crate::GoParams;

/// Something that can score a position and recommend a move.
/// Implemented by the real StockfishEngine and by MockOracle.
///
/// Returned scores are always from White's point of view.
#[async_trait]
pub trait EvaluationOracle: Send {
    /// Evaluate the position described by `fen`.
    ///
    /// Must only be called for positions with at least one legal move;
    /// terminal positions are scored by the rules side.
    async fn evaluate(
        &mut self,
        fen: &str,
        go: &GoParams,
    ) -> Result<PositionEvaluation, OracleError>;

    /// Release the underlying resources. Further calls fail with
    /// [`OracleError::Unavailable`].
    async fn shutdown(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("Evaluator unavailable: {0}")]
    Unavailable(String),
    #[error("Evaluation timed out")]
    Timeout,
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

impl OracleError {
    /// Whether the caller may retry the same position once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_is_retryable() {
        assert!(OracleError::Timeout.is_retryable());
        assert!(!OracleError::Unavailable("gone".into()).is_retryable());
        assert!(!OracleError::InvalidPosition("bad".into()).is_retryable());
    }
}
