//! Scripted EvaluationOracle for testing

use crate::oracle::{EvaluationOracle, OracleError};
use crate::GoParams;
use async_trait::async_trait;
use chess::PositionEvaluation;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type Script = HashMap<String, VecDeque<Result<PositionEvaluation, OracleError>>>;

/// Mock oracle answering from a per-FEN script - only compiled in test mode
/// or with the mock feature.
///
/// Clones share the script and the call log, so one mock can back every
/// worker of a pool. For each FEN the scripted responses are consumed in
/// order and the last one repeats.
#[derive(Clone, Default)]
pub struct MockOracle {
    script: Arc<Mutex<Script>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    fallback: Option<PositionEvaluation>,
    delay: Option<Duration>,
    shut_down: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Evaluate { fen: String, go: GoParams },
    Shutdown,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `evaluation` for `fen`.
    pub fn with_evaluation(self, fen: impl Into<String>, evaluation: PositionEvaluation) -> Self {
        self.with_responses(fen, vec![Ok(evaluation)])
    }

    /// Answer `responses` for `fen`, one per call, repeating the last.
    pub fn with_responses(
        self,
        fen: impl Into<String>,
        responses: Vec<Result<PositionEvaluation, OracleError>>,
    ) -> Self {
        lock(&self.script).insert(fen.into(), responses.into());
        self
    }

    /// Answer `evaluation` for every position without a script entry.
    pub fn with_fallback(mut self, evaluation: PositionEvaluation) -> Self {
        self.fallback = Some(evaluation);
        self
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All calls made through this mock and its clones.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    /// Number of evaluations requested for `fen`.
    pub fn evaluations_of(&self, fen: &str) -> usize {
        lock(&self.call_log)
            .iter()
            .filter(|call| matches!(call, MockCall::Evaluate { fen: f, .. } if f == fen))
            .count()
    }

    fn next_response(&self, fen: &str) -> Result<PositionEvaluation, OracleError> {
        let mut script = lock(&self.script);
        match script.get_mut(fen) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(OracleError::Unavailable("empty script".to_string()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(OracleError::Unavailable("empty script".to_string()))),
            None => self.fallback.clone().ok_or_else(|| {
                OracleError::Unavailable(format!("No scripted evaluation for {}", fen))
            }),
        }
    }
}

#[async_trait]
impl EvaluationOracle for MockOracle {
    async fn evaluate(
        &mut self,
        fen: &str,
        go: &GoParams,
    ) -> Result<PositionEvaluation, OracleError> {
        lock(&self.call_log).push(MockCall::Evaluate {
            fen: fen.to_string(),
            go: go.clone(),
        });
        if self.shut_down {
            return Err(OracleError::Unavailable("Mock was shut down".to_string()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_response(fen)
    }

    async fn shutdown(&mut self) {
        lock(&self.call_log).push(MockCall::Shutdown);
        self.shut_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[tokio::test]
    async fn test_scripted_responses_then_repeat_last() {
        let mut mock = MockOracle::new().with_responses(
            FEN,
            vec![
                Err(OracleError::Timeout),
                Ok(PositionEvaluation::centipawns("e2e4", 30)),
            ],
        );
        let go = GoParams::depth(10);

        assert_eq!(mock.evaluate(FEN, &go).await, Err(OracleError::Timeout));
        let second = mock.evaluate(FEN, &go).await.unwrap();
        let third = mock.evaluate(FEN, &go).await.unwrap();
        assert_eq!(second, third);
        assert_eq!(mock.evaluations_of(FEN), 3);
    }

    #[tokio::test]
    async fn test_unscripted_uses_fallback() {
        let mut bare = MockOracle::new();
        assert!(matches!(
            bare.evaluate("8/8/8/8/8/8/8/8 w - - 0 1", &GoParams::default()).await,
            Err(OracleError::Unavailable(_))
        ));

        let mut mock = MockOracle::new().with_fallback(PositionEvaluation::centipawns("a2a3", 0));
        let eval = mock.evaluate(FEN, &GoParams::default()).await.unwrap();
        assert_eq!(eval.best_move.as_deref(), Some("a2a3"));
    }

    #[tokio::test]
    async fn test_clones_share_call_log() {
        let mock = MockOracle::new().with_fallback(PositionEvaluation::centipawns("e2e4", 0));
        let mut worker = mock.clone();
        worker.evaluate(FEN, &GoParams::default()).await.unwrap();
        worker.shutdown().await;

        assert_eq!(mock.calls().len(), 2);
        assert_eq!(mock.calls()[1], MockCall::Shutdown);
        assert!(worker.evaluate(FEN, &GoParams::default()).await.is_err());
    }
}
