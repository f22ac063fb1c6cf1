pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use analysis::{
    arrow_for, AccuracyAggregator, Classifier, ClassifierConfig, MoveRecord, RecordError,
};
use chess::{
    parse_pgn, validate_pgn_length, Game, GameError, GameStatusKind, HistoryEntry, PgnError,
    PgnGame, PositionEvaluation, MAX_PGN_LENGTH,
};
use engine::{EvaluationOracle, GoParams, OracleError};
use tokio::sync::{mpsc, watch, Mutex};

use crate::types::{GameReview, MoveReview, MoveVerdict, ReviewProgress, ReviewStatus};
use worker::{PositionJob, PositionOutcome};

/// Configuration for one game review.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Upper bound on concurrent oracle calls. The pool never grows past the
    /// number of oracles handed to [`review_game`].
    pub workers: usize,
    /// Search budget passed to the oracle for every position.
    pub go: GoParams,
    /// Per-call timeout enforced around each oracle evaluation.
    pub eval_timeout: Duration,
    /// Plies below this index may be labelled `theory`. Overrides
    /// `classifier.opening_plies`.
    pub opening_plies: u32,
    pub classifier: ClassifierConfig,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let classifier = ClassifierConfig::default();
        Self {
            workers: 1,
            go: GoParams::depth(18),
            eval_timeout: Duration::from_secs(30),
            opening_plies: classifier.opening_plies,
            classifier,
        }
    }
}

impl ReviewConfig {
    /// Classifier thresholds with the review's opening window applied.
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            opening_plies: self.opening_plies,
            ..self.classifier.clone()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Pgn(#[from] PgnError),
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("No evaluation oracles available")]
    NoOracles,
}

impl From<GameError> for ReviewError {
    fn from(e: GameError) -> Self {
        Self::InvalidPosition(e.to_string())
    }
}

impl From<RecordError> for ReviewError {
    fn from(e: RecordError) -> Self {
        Self::InvalidPosition(e.to_string())
    }
}

/// A position of the game: the start position, or the one after a ply.
struct Position {
    fen: String,
    /// Known without asking the oracle (checkmate or draw on the board).
    terminal: Option<PositionEvaluation>,
}

type Slot = Option<Result<PositionEvaluation, OracleError>>;

/// Parse `pgn` and review the game.
pub async fn review_pgn(
    pgn: &str,
    oracles: Vec<Box<dyn EvaluationOracle>>,
    config: &ReviewConfig,
    cancel: watch::Receiver<bool>,
    progress: Option<mpsc::Sender<ReviewProgress>>,
) -> Result<GameReview, ReviewError> {
    validate_pgn_length(pgn, MAX_PGN_LENGTH)?;
    let game = parse_pgn(pgn)?;
    review_game(&game, oracles, config, cancel, progress).await
}

/// Review a parsed game.
///
/// Positions are evaluated by a pool of `min(config.workers, oracles.len())`
/// worker tasks, each owning one oracle. Results are classified and folded
/// into the accuracy summaries strictly in ply order, whatever order the
/// evaluations finish in.
///
/// Setting `cancel` to true stops issuing oracle calls. Plies whose
/// positions were already evaluated are still classified; the rest are
/// `Unknown` and both summaries are flagged partial.
#[tracing::instrument(skip_all, fields(plies = game.moves.len()))]
pub async fn review_game(
    game: &PgnGame,
    oracles: Vec<Box<dyn EvaluationOracle>>,
    config: &ReviewConfig,
    mut cancel: watch::Receiver<bool>,
    progress: Option<mpsc::Sender<ReviewProgress>>,
) -> Result<GameReview, ReviewError> {
    let moves: Vec<_> = game.moves.iter().map(|m| m.mv).collect();
    let history = Game::replay(Some(&game.start_fen), &moves)?;
    let records = history
        .iter()
        .map(MoveRecord::from_history)
        .collect::<Result<Vec<_>, _>>()?;
    let positions = collect_positions(&history);

    let jobs: Vec<PositionJob> = positions
        .iter()
        .enumerate()
        .filter(|(_, p)| p.terminal.is_none())
        .map(|(index, p)| PositionJob {
            index,
            fen: p.fen.clone(),
        })
        .collect();
    let total_jobs = jobs.len();

    tracing::info!(
        plies = history.len(),
        positions = positions.len(),
        to_evaluate = total_jobs,
        "Starting review"
    );
    emit(
        &progress,
        ReviewProgress::Started {
            total_plies: history.len() as u32,
            positions_to_evaluate: total_jobs as u32,
        },
    );

    let mut slots: Vec<Slot> = vec![None; positions.len()];
    let mut evaluated = 0usize;
    let mut cancelled = false;

    if total_jobs > 0 {
        let pool_size = config.workers.max(1).min(oracles.len());
        if pool_size == 0 {
            return Err(ReviewError::NoOracles);
        }

        let (job_tx, job_rx) = mpsc::channel::<PositionJob>(total_jobs);
        for job in jobs {
            // Capacity equals the job count; this never waits.
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        drop(job_tx);
        let shared_rx = Arc::new(Mutex::new(job_rx));

        let (result_tx, mut result_rx) = mpsc::channel::<PositionOutcome>(pool_size * 2);
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut oracles = oracles;
        let mut handles = Vec::with_capacity(pool_size);
        for (worker_id, oracle) in oracles.drain(..pool_size).enumerate() {
            handles.push(tokio::spawn(worker::run_eval_worker(
                worker_id,
                oracle,
                shared_rx.clone(),
                result_tx.clone(),
                config.go.clone(),
                config.eval_timeout,
                stop_rx.clone(),
            )));
        }
        drop(result_tx);
        for mut spare in oracles {
            spare.shutdown().await;
        }

        tracing::debug!(pool_size, "Eval workers spawned");

        let mut fatal = None;
        cancelled = *cancel.borrow();
        while !cancelled && evaluated < total_jobs {
            tokio::select! {
                biased;
                _ = worker::stopped(&mut cancel) => {
                    tracing::info!(evaluated, total = total_jobs, "Review cancelled");
                    cancelled = true;
                }
                outcome = result_rx.recv() => {
                    let Some(outcome) = outcome else {
                        tracing::warn!(
                            evaluated,
                            total = total_jobs,
                            "Every eval worker lost its oracle"
                        );
                        mark_unreachable(&positions, &mut slots);
                        break;
                    };
                    if let Err(OracleError::InvalidPosition(reason)) = &outcome.result {
                        tracing::error!(
                            index = outcome.index,
                            fen = %positions[outcome.index].fen,
                            "Oracle rejected position: {}",
                            reason
                        );
                        fatal = Some(ReviewError::InvalidPosition(reason.clone()));
                        break;
                    }
                    evaluated += 1;
                    emit(
                        &progress,
                        ReviewProgress::PositionEvaluated {
                            position_index: outcome.index as u32,
                            evaluated: evaluated as u32,
                            total: total_jobs as u32,
                        },
                    );
                    slots[outcome.index] = Some(outcome.result);
                }
            }
        }

        stop_tx.send_replace(true);
        drop(result_rx);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Eval worker panicked: {}", e);
            }
        }

        if let Some(err) = fatal {
            return Err(err);
        }
    } else {
        for mut oracle in oracles {
            oracle.shutdown().await;
        }
    }

    let status = if cancelled {
        ReviewStatus::Cancelled {
            evaluated_positions: evaluated as u32,
            total_positions: total_jobs as u32,
        }
    } else {
        ReviewStatus::Complete
    };

    let review = reduce(game, &history, &records, &positions, slots, config, status);
    tracing::info!(
        white_accuracy = review.white.accuracy_pct,
        black_accuracy = review.black.accuracy_pct,
        unknown = review.unknown_moves(),
        "Review finished"
    );
    emit(
        &progress,
        ReviewProgress::Finished {
            status: review.status.clone(),
        },
    );
    Ok(review)
}

/// Start position plus the position after every ply. The position after
/// ply `i` is the one before ply `i + 1`, so each is evaluated once.
fn collect_positions(history: &[HistoryEntry]) -> Vec<Position> {
    let Some(first) = history.first() else {
        return Vec::new();
    };

    let mut positions = Vec::with_capacity(history.len() + 1);
    positions.push(Position {
        fen: first.fen_before.clone(),
        terminal: None,
    });
    for entry in history {
        let terminal = match entry.status_after {
            GameStatusKind::Ongoing => None,
            GameStatusKind::Checkmate => Some(PositionEvaluation::checkmate(entry.piece_color)),
            GameStatusKind::Drawn => Some(PositionEvaluation::drawn()),
        };
        positions.push(Position {
            fen: entry.fen_after.clone(),
            terminal,
        });
    }
    positions
}

/// Classify every ply in order and fold the results into the summaries.
fn reduce(
    game: &PgnGame,
    history: &[HistoryEntry],
    records: &[MoveRecord],
    positions: &[Position],
    slots: Vec<Slot>,
    config: &ReviewConfig,
    status: ReviewStatus,
) -> GameReview {
    let classifier = Classifier::new(config.classifier_config());
    let k = classifier.config().accuracy_decay;
    let evaluation = |index: usize| -> Slot {
        let position = &positions[index];
        match &position.terminal {
            Some(eval) => Some(Ok(eval.clone())),
            None => slots[index].clone(),
        }
    };

    let mut aggregator = AccuracyAggregator::new();
    let mut moves = Vec::with_capacity(history.len());

    for (i, (entry, record)) in history.iter().zip(records).enumerate() {
        let before = evaluation(i);
        let after = evaluation(i + 1);

        let eval_before = before.as_ref().and_then(|r| r.as_ref().ok()).cloned();
        let eval_after = after.as_ref().and_then(|r| r.as_ref().ok()).cloned();
        let best_move = eval_before.as_ref().and_then(|e| e.best_move.clone());

        let (verdict, normalized_before, normalized_after) = match (&eval_before, &eval_after) {
            (Some(b), Some(a)) => {
                let (result, nb, na) = classifier.classify_move(record, b, a);
                aggregator.fold(record.side_to_move, &result);
                (MoveVerdict::Classified(result), Some(nb), Some(na))
            }
            _ => {
                let reason = unknown_reason(&before, &after);
                tracing::debug!(ply = entry.ply_index, reason = %reason, "Move left unclassified");
                (MoveVerdict::Unknown { reason }, None, None)
            }
        };

        moves.push(MoveReview {
            ply_index: entry.ply_index,
            move_number: move_number(entry),
            side: entry.piece_color,
            san: entry.san.clone(),
            uci: entry.uci.clone(),
            fen_before: entry.fen_before.clone(),
            fen_after: entry.fen_after.clone(),
            eval_before,
            eval_after,
            normalized_before,
            normalized_after,
            arrow: arrow_for(best_move.as_deref()),
            best_move,
            move_accuracy: verdict.classification().map(|r| r.move_accuracy(k)),
            verdict,
        });
    }

    if matches!(status, ReviewStatus::Cancelled { .. }) {
        aggregator.mark_partial();
    }
    let (white, black) = aggregator.finalize(k);

    GameReview {
        tags: game.tags.clone(),
        result: game.result,
        start_fen: game.start_fen.clone(),
        status,
        moves,
        white,
        black,
        total_plies: history.len() as u32,
        go: config.go.clone(),
    }
}

/// Fail every position still waiting once no worker is left to take it.
fn mark_unreachable(positions: &[Position], slots: &mut [Slot]) {
    for (position, slot) in positions.iter().zip(slots.iter_mut()) {
        if position.terminal.is_none() && slot.is_none() {
            *slot = Some(Err(OracleError::Unavailable(
                "no evaluator left in the pool".to_string(),
            )));
        }
    }
}

fn unknown_reason(before: &Slot, after: &Slot) -> String {
    match (before, after) {
        (Some(Err(e)), _) => format!("evaluation before the move failed: {e}"),
        (_, Some(Err(e))) => format!("evaluation after the move failed: {e}"),
        _ => "not evaluated before the review was cancelled".to_string(),
    }
}

/// Full-move number from the FEN before the move.
fn move_number(entry: &HistoryEntry) -> u32 {
    entry
        .fen_before
        .split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(entry.ply_index / 2 + 1)
}

fn emit(progress: &Option<mpsc::Sender<ReviewProgress>>, event: ReviewProgress) {
    if let Some(tx) = progress {
        if let Err(e) = tx.try_send(event) {
            tracing::trace!("Dropped progress event: {}", e);
        }
    }
}
