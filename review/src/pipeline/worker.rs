use std::sync::Arc;
use std::time::Duration;

use chess::PositionEvaluation;
use engine::{EvaluationOracle, GoParams, OracleError};
use tokio::sync::{mpsc, watch, Mutex};

/// Attempts per position: the first call plus one retry after a timeout.
const MAX_ATTEMPTS: u32 = 2;

/// A position waiting for the oracle.
#[derive(Debug, Clone)]
pub struct PositionJob {
    pub index: usize,
    pub fen: String,
}

/// What a worker reports back for one job.
#[derive(Debug)]
pub struct PositionOutcome {
    pub index: usize,
    pub worker_id: usize,
    pub result: Result<PositionEvaluation, OracleError>,
}

/// A long-lived worker task. Receives jobs from the shared channel and
/// evaluates them one at a time with its own oracle, until the queue is
/// drained or `stop` flips to true.
///
/// An oracle that reports [`OracleError::Unavailable`] is finished: the
/// worker reports that job and exits, leaving the queue to the others.
pub async fn run_eval_worker(
    worker_id: usize,
    mut oracle: Box<dyn EvaluationOracle>,
    job_rx: Arc<Mutex<mpsc::Receiver<PositionJob>>>,
    result_tx: mpsc::Sender<PositionOutcome>,
    go: GoParams,
    eval_timeout: Duration,
    mut stop: watch::Receiver<bool>,
) {
    tracing::debug!(worker_id, "Eval worker started");

    loop {
        if *stop.borrow() {
            tracing::debug!(worker_id, "Stop requested, worker exiting");
            break;
        }

        // Wait for next job (only one worker picks up each job)
        let job = {
            let mut rx = job_rx.lock().await;
            match rx.recv().await {
                Some(job) => job,
                None => {
                    tracing::debug!(worker_id, "Job queue drained, worker exiting");
                    break;
                }
            }
        };

        let evaluation = evaluate_with_retry(oracle.as_mut(), &job, &go, eval_timeout, worker_id);
        let result = tokio::select! {
            biased;
            _ = stopped(&mut stop) => {
                tracing::debug!(worker_id, index = job.index, "Abandoning in-flight evaluation");
                break;
            }
            result = evaluation => result,
        };

        let oracle_lost = matches!(result, Err(OracleError::Unavailable(_)));
        let outcome = PositionOutcome {
            index: job.index,
            worker_id,
            result,
        };
        if result_tx.send(outcome).await.is_err() {
            tracing::debug!(worker_id, "Result channel closed, worker exiting");
            break;
        }
        if oracle_lost {
            tracing::warn!(worker_id, "Oracle unavailable, worker exiting");
            break;
        }
    }

    oracle.shutdown().await;
}

async fn evaluate_with_retry(
    oracle: &mut dyn EvaluationOracle,
    job: &PositionJob,
    go: &GoParams,
    eval_timeout: Duration,
    worker_id: usize,
) -> Result<PositionEvaluation, OracleError> {
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(eval_timeout, oracle.evaluate(&job.fen, go)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout),
        };

        match result {
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    worker_id,
                    index = job.index,
                    fen = %job.fen,
                    attempt,
                    "Evaluation failed ({}), retrying",
                    e
                );
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(
                    worker_id,
                    index = job.index,
                    fen = %job.fen,
                    "Evaluation failed: {}",
                    e
                );
                return Err(e);
            }
            Ok(evaluation) => {
                tracing::debug!(
                    worker_id,
                    index = job.index,
                    score = %evaluation.score,
                    best = ?evaluation.best_move,
                    "Position evaluated"
                );
                return Ok(evaluation);
            }
        }
    }
}

/// Resolves once `stop` is true; never resolves if the sender is gone.
pub async fn stopped(stop: &mut watch::Receiver<bool>) {
    if stop.wait_for(|&s| s).await.is_err() {
        std::future::pending::<()>().await;
    }
}
