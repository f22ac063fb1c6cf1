use crate::oracle::{EvaluationOracle, OracleError};
use crate::uci::{parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineEvent, GoParams, Score};
use async_trait::async_trait;
use chess::{PieceColor, PositionEvaluation};
use cozy_chess::{GameStatus, Move};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// Environment variable naming the Stockfish binary to use.
pub const STOCKFISH_ENV: &str = "CHESS_REVIEW_STOCKFISH";

const INIT_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_GRACE: Duration = Duration::from_secs(2);
const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    search_timeout: Duration,
    /// A `go` was sent and its `bestmove` has not been consumed yet.
    searching: bool,
    closed: bool,
}

/// Configuration for the engine process.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit binary path; discovered when `None`.
    pub path: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Upper bound for a single search; `stop` is sent when it expires.
    pub search_timeout: Option<Duration>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance with default configuration.
    pub async fn spawn() -> Result<Self, OracleError> {
        Self::spawn_with_config(EngineConfig::default()).await
    }

    /// Spawn a new Stockfish instance with full configuration.
    #[tracing::instrument(level = "info")]
    pub async fn spawn_with_config(config: EngineConfig) -> Result<Self, OracleError> {
        let path = find_stockfish_path(config.path.as_deref())
            .ok_or_else(|| OracleError::Unavailable("Stockfish not found".to_string()))?;
        tracing::info!("Found Stockfish at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                OracleError::Unavailable(format!("Failed to spawn Stockfish: {}", e))
            })?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| OracleError::Unavailable("Failed to get stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| OracleError::Unavailable("Failed to get stdout".to_string()))?;

        // Initialize UCI
        write_line(&mut stdin, "uci").await?;

        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(64);

        // Output reader task. It owns the only event sender, so the receiver
        // sees `None` once the process closes its stdout.
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Stockfish stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => {
                                tracing::debug!("Received bestmove: {:?}", mv);
                                EngineEvent::BestMove(mv)
                            }
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Ok(msg) => {
                                tracing::trace!("Ignoring UCI message: {:?}", msg);
                                continue;
                            }
                            Err(_) => {
                                tracing::trace!("Failed to parse UCI message: {}", trimmed);
                                continue;
                            }
                        };

                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        wait_for_ready(&mut event_rx).await?;

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            tracing::info!("Setting Threads to {}", threads);
            write_line(&mut stdin, &format!("setoption name Threads value {}", threads)).await?;
        }

        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            write_line(&mut stdin, &format!("setoption name Hash value {}", hash_mb)).await?;
        }

        write_line(&mut stdin, "isready").await?;
        wait_for_ready(&mut event_rx).await?;

        // Command processor task: formats commands and owns stdin.
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                let line = match cmd {
                    EngineCommand::SetPosition { ref fen } => format!("position fen {}", fen),
                    EngineCommand::Go(ref params) => params.to_uci(),
                    EngineCommand::Stop => "stop".to_string(),
                    EngineCommand::Quit => {
                        let _ = write_line(&mut stdin, "quit").await;
                        break;
                    }
                };
                if let Err(e) = write_line(&mut stdin, &line).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                    break;
                }
            }
            tracing::debug!("Command processor task exiting");
        });

        tracing::info!("Stockfish engine spawned and initialized successfully");
        Ok(Self {
            process,
            command_tx,
            event_rx,
            search_timeout: config.search_timeout.unwrap_or(DEFAULT_SEARCH_TIMEOUT),
            searching: false,
            closed: false,
        })
    }

    /// Send a command to the engine
    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), OracleError> {
        self.command_tx.send(cmd).await.map_err(|e| {
            tracing::error!("Failed to send command to queue: {}", e);
            OracleError::Unavailable(format!("Failed to send command: {}", e))
        })
    }

    /// Stop a search left running by an expired timeout (or a dropped
    /// future) and discard everything it produced.
    async fn finish_abandoned_search(&mut self) -> Result<(), OracleError> {
        if self.searching {
            tracing::debug!("Stopping abandoned search");
            self.send_command(EngineCommand::Stop).await?;
            match tokio::time::timeout(STOP_GRACE, wait_for_bestmove(&mut self.event_rx)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(OracleError::Unavailable(
                        "Engine did not answer stop".to_string(),
                    ))
                }
            }
            self.searching = false;
        }
        while self.event_rx.try_recv().is_ok() {}
        Ok(())
    }
}

#[async_trait]
impl EvaluationOracle for StockfishEngine {
    #[tracing::instrument(level = "debug", skip(self, go))]
    async fn evaluate(
        &mut self,
        fen: &str,
        go: &GoParams,
    ) -> Result<PositionEvaluation, OracleError> {
        if self.closed {
            return Err(OracleError::Unavailable("Engine was shut down".to_string()));
        }

        let board = chess::fen::parse_fen(fen)
            .map_err(|e| OracleError::InvalidPosition(e.to_string()))?;
        if board.status() != GameStatus::Ongoing {
            return Err(OracleError::InvalidPosition(format!(
                "No legal moves in {}",
                fen
            )));
        }
        let side = PieceColor::from(board.side_to_move());

        self.finish_abandoned_search().await?;
        self.send_command(EngineCommand::SetPosition {
            fen: fen.to_string(),
        })
        .await?;
        self.send_command(EngineCommand::Go(go.clone())).await?;
        self.searching = true;

        let outcome =
            tokio::time::timeout(self.search_timeout, wait_for_bestmove(&mut self.event_rx)).await;
        let (best, score) = match outcome {
            Ok(Ok(found)) => {
                self.searching = false;
                found
            }
            Ok(Err(e)) => {
                self.searching = false;
                self.closed = true;
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.search_timeout, "Search timed out, sending stop");
                self.send_command(EngineCommand::Stop).await?;
                return Err(OracleError::Timeout);
            }
        };

        let score = match score {
            // The side to move is already mated.
            Some(Score::Mate(0)) => return Ok(PositionEvaluation::checkmate(side.opposite())),
            Some(s) => s.to_white(side),
            None => {
                return Err(OracleError::Unavailable(
                    "Engine returned bestmove without a score".to_string(),
                ))
            }
        };

        Ok(PositionEvaluation {
            best_move: best.map(chess_common::format_uci_move),
            score,
        })
    }

    async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

async fn write_line(
    stdin: &mut tokio::process::ChildStdin,
    line: &str,
) -> Result<(), OracleError> {
    tracing::trace!("UCI >> {}", line);
    stdin
        .write_all(format!("{}\n", line).as_bytes())
        .await
        .map_err(|e| OracleError::Unavailable(format!("Failed to write to stdin: {}", e)))?;
    stdin
        .flush()
        .await
        .map_err(|e| OracleError::Unavailable(format!("Failed to flush: {}", e)))
}

async fn wait_for_ready(event_rx: &mut mpsc::Receiver<EngineEvent>) -> Result<(), OracleError> {
    let waited = tokio::time::timeout(INIT_TIMEOUT, async {
        while let Some(event) = event_rx.recv().await {
            if matches!(event, EngineEvent::Ready) {
                return Ok(());
            }
        }
        Err(OracleError::Unavailable(
            "Engine closed during initialization".to_string(),
        ))
    })
    .await;

    match waited {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Timeout waiting for engine to respond");
            Err(OracleError::Unavailable(
                "Timeout waiting for engine to respond".to_string(),
            ))
        }
    }
}

/// Collect `info` lines until `bestmove`, keeping the last principal score.
async fn wait_for_bestmove(
    event_rx: &mut mpsc::Receiver<EngineEvent>,
) -> Result<(Option<Move>, Option<Score>), OracleError> {
    let mut last_score = None;
    while let Some(event) = event_rx.recv().await {
        match event {
            EngineEvent::Info(info) => {
                if info.multipv.unwrap_or(1) == 1 {
                    if let Some(score) = info.score {
                        last_score = Some(score);
                    }
                }
            }
            EngineEvent::BestMove(mv) => return Ok((mv, last_score)),
            EngineEvent::Ready => {}
        }
    }
    Err(OracleError::Unavailable("Engine process exited".to_string()))
}

/// Find the Stockfish executable: explicit path, then the
/// `CHESS_REVIEW_STOCKFISH` environment variable, then common locations.
pub fn find_stockfish_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(STOCKFISH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path.trim()));
        }
    }

    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if path.exists() || path_str == "stockfish" {
            // Try to verify it's actually runnable
            if std::process::Command::new(path_str)
                .arg("quit")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .output()
                .is_ok()
            {
                return Some(PathBuf::from(path_str));
            }
        }
    }

    None
}
