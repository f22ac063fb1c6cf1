pub mod oracle;
pub mod stockfish;
pub mod uci;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use oracle::{EvaluationOracle, OracleError};
pub use stockfish::{EngineConfig, StockfishEngine};
pub use uci::{UciError, UciMessage};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockOracle};

use chess::{AnalysisScore, PieceColor};
use cozy_chess::Move;
use serde::{Deserialize, Serialize};

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    SetPosition { fen: String },
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command. When both are set, depth wins; when
/// neither is set the engine searches for one second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime: Option<u64>, // milliseconds
}

impl GoParams {
    pub fn depth(depth: u8) -> Self {
        Self {
            depth: Some(depth),
            movetime: None,
        }
    }

    pub fn movetime(ms: u64) -> Self {
        Self {
            depth: None,
            movetime: Some(ms),
        }
    }

    /// Render as a UCI `go` command line (without newline).
    pub fn to_uci(&self) -> String {
        match (self.depth, self.movetime) {
            (Some(depth), _) => format!("go depth {}", depth),
            (None, Some(ms)) => format!("go movetime {}", ms),
            (None, None) => "go movetime 1000".to_string(),
        }
    }
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    /// `None` when the engine reports `bestmove (none)`.
    BestMove(Option<Move>),
    Info(EngineInfo),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u8>,
    pub nps: Option<u64>,
}

/// Score as reported by a UCI engine: relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

impl Score {
    /// Re-express from White's point of view.
    pub fn to_white(self, side_to_move: PieceColor) -> AnalysisScore {
        let relative = match self {
            Self::Centipawns(cp) => AnalysisScore::Centipawns(cp),
            Self::Mate(m) => AnalysisScore::Mate(m),
        };
        relative.from_side_to_move(side_to_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_params_to_uci() {
        assert_eq!(GoParams::depth(18).to_uci(), "go depth 18");
        assert_eq!(GoParams::movetime(250).to_uci(), "go movetime 250");
        assert_eq!(GoParams::default().to_uci(), "go movetime 1000");
        let both = GoParams {
            depth: Some(10),
            movetime: Some(500),
        };
        assert_eq!(both.to_uci(), "go depth 10");
    }

    #[test]
    fn test_score_to_white() {
        assert_eq!(
            Score::Centipawns(40).to_white(PieceColor::Black),
            AnalysisScore::Centipawns(-40)
        );
        assert_eq!(
            Score::Mate(-2).to_white(PieceColor::Black),
            AnalysisScore::Mate(2)
        );
        assert_eq!(
            Score::Mate(3).to_white(PieceColor::White),
            AnalysisScore::Mate(3)
        );
    }
}
