use std::collections::BTreeMap;

use analysis::{Arrow, ClassificationResult, NormalizedEvaluation, PlayerAccuracySummary};
use chess::{GameResult, PieceColor, PositionEvaluation};
use engine::GoParams;
use serde::{Deserialize, Serialize};

/// Outcome for one ply: a classification, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveVerdict {
    Classified(ClassificationResult),
    /// Evaluation failed or was cancelled. Not counted in accuracy.
    Unknown { reason: String },
}

impl MoveVerdict {
    pub fn classification(&self) -> Option<&ClassificationResult> {
        match self {
            Self::Classified(result) => Some(result),
            Self::Unknown { .. } => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Classified(result) => result.label.as_str(),
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Review of a single ply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReview {
    pub ply_index: u32,
    /// Full-move number as printed in PGN.
    pub move_number: u32,
    pub side: PieceColor,
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
    /// Raw White-perspective evaluations.
    pub eval_before: Option<PositionEvaluation>,
    pub eval_after: Option<PositionEvaluation>,
    /// Mover-perspective evaluations, present when classified.
    pub normalized_before: Option<NormalizedEvaluation>,
    pub normalized_after: Option<NormalizedEvaluation>,
    /// Engine's preferred move in the position before this ply.
    pub best_move: Option<String>,
    pub arrow: Option<Arrow>,
    pub verdict: MoveVerdict,
    pub move_accuracy: Option<f64>,
}

/// Status of a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewStatus {
    Complete,
    Cancelled {
        evaluated_positions: u32,
        total_positions: u32,
    },
}

/// Full review result for a game, moves in ply order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReview {
    pub tags: BTreeMap<String, String>,
    pub result: GameResult,
    pub start_fen: String,
    pub status: ReviewStatus,
    pub moves: Vec<MoveReview>,
    pub white: PlayerAccuracySummary,
    pub black: PlayerAccuracySummary,
    pub total_plies: u32,
    pub go: GoParams,
}

impl GameReview {
    pub fn summary(&self, side: PieceColor) -> &PlayerAccuracySummary {
        match side {
            PieceColor::White => &self.white,
            PieceColor::Black => &self.black,
        }
    }

    pub fn unknown_moves(&self) -> usize {
        self.moves
            .iter()
            .filter(|m| matches!(m.verdict, MoveVerdict::Unknown { .. }))
            .count()
    }
}

/// Progress notifications; purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewProgress {
    Started {
        total_plies: u32,
        positions_to_evaluate: u32,
    },
    PositionEvaluated {
        position_index: u32,
        evaluated: u32,
        total: u32,
    },
    Finished {
        status: ReviewStatus,
    },
}
