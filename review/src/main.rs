//! `chess-review`: classify every move of a PGN game and score both players.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use engine::{EngineConfig, EvaluationOracle, GoParams, StockfishEngine};
use review::{config, report, ReviewConfig, ReviewProgress, ReviewStatus};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "chess-review",
    version,
    about = "Move-by-move quality review and accuracy scoring of a chess game"
)]
struct Cli {
    /// PGN file to review, or `-` for stdin.
    input: PathBuf,

    /// Search depth per position.
    #[arg(long, conflicts_with = "movetime")]
    depth: Option<u8>,

    /// Search time per position in milliseconds.
    #[arg(long)]
    movetime: Option<u64>,

    /// Number of engine processes [env: CHESS_REVIEW_WORKERS].
    #[arg(long, value_parser = parse_workers_arg)]
    workers: Option<usize>,

    /// Per-position timeout in seconds.
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Path to the Stockfish binary [env: CHESS_REVIEW_STOCKFISH].
    #[arg(long)]
    stockfish: Option<PathBuf>,

    /// Engine `Threads` option, per process.
    #[arg(long)]
    threads: Option<u32>,

    /// Engine `Hash` option in MB, per process.
    #[arg(long)]
    hash_mb: Option<u32>,

    /// Plies at the start of the game that may be labelled theory.
    #[arg(long)]
    opening_plies: Option<u32>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also write logs to a daily rolling file here [env: CHESS_REVIEW_LOG_DIR].
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to start engine {worker_id}: {source}")]
    EngineStart {
        worker_id: usize,
        #[source]
        source: engine::OracleError,
    },
}

fn parse_workers_arg(value: &str) -> Result<usize, String> {
    config::parse_workers(value).ok_or_else(|| format!("invalid worker count: {value}"))
}

/// Install the tracing subscriber. Returns the appender guard, which must be
/// held until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir).ok();
            let file_appender = tracing_appender::rolling::daily(dir, "chess-review");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    guard
}

fn go_params(cli: &Cli) -> GoParams {
    match (cli.depth, cli.movetime) {
        (Some(depth), _) => GoParams::depth(depth),
        (None, Some(ms)) => GoParams::movetime(ms),
        (None, None) => GoParams::depth(config::DEFAULT_DEPTH),
    }
}

async fn spawn_engines(
    cli: &Cli,
    workers: usize,
    search_timeout: Duration,
) -> Result<Vec<Box<dyn EvaluationOracle>>, CliError> {
    let mut oracles: Vec<Box<dyn EvaluationOracle>> = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let engine_config = EngineConfig {
            path: cli.stockfish.clone(),
            threads: cli.threads,
            hash_mb: cli.hash_mb,
            search_timeout: Some(search_timeout),
        };
        match StockfishEngine::spawn_with_config(engine_config).await {
            Ok(engine) => oracles.push(Box::new(engine)),
            Err(source) => {
                for mut oracle in oracles {
                    oracle.shutdown().await;
                }
                return Err(CliError::EngineStart { worker_id, source });
            }
        }
    }
    Ok(oracles)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let guard = init_tracing(cli.log_dir.clone().or_else(config::get_log_dir));

    let pgn = review::read_pgn_input(&cli.input)?;

    let mut review_config = ReviewConfig {
        workers: cli.workers.unwrap_or_else(config::get_workers),
        go: go_params(&cli),
        eval_timeout: Duration::from_secs(cli.timeout_secs),
        ..ReviewConfig::default()
    };
    if let Some(plies) = cli.opening_plies {
        review_config.opening_plies = plies;
    }

    tracing::info!(
        input = %cli.input.display(),
        workers = review_config.workers,
        go = %review_config.go.to_uci(),
        "chess-review starting"
    );

    let oracles = spawn_engines(&cli, review_config.workers, review_config.eval_timeout).await?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing with the positions evaluated so far");
            cancel_tx.send_replace(true);
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::channel(64);
    let progress_task = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event {
                ReviewProgress::Started {
                    total_plies,
                    positions_to_evaluate,
                } => tracing::info!(total_plies, positions_to_evaluate, "Evaluating positions"),
                ReviewProgress::PositionEvaluated {
                    evaluated, total, ..
                } => tracing::debug!(evaluated, total, "Progress"),
                ReviewProgress::Finished { status } => tracing::info!(?status, "Done"),
            }
        }
    });

    let game_review = review::review_pgn(
        &pgn,
        oracles,
        &review_config,
        cancel_rx,
        Some(progress_tx),
    )
    .await
    .context("review failed")?;
    progress_task.await.ok();

    let output = match cli.format {
        OutputFormat::Text => report::render_text(&game_review),
        OutputFormat::Json => report::render_json(&game_review)?,
    };
    println!("{output}");

    if let ReviewStatus::Cancelled { .. } = game_review.status {
        drop(guard);
        std::process::exit(130);
    }
    Ok(())
}
