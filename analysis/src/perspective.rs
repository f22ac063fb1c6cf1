//! White-perspective engine scores to "advantage for the mover".

use chess::{AnalysisScore, PieceColor, PositionEvaluation, MATE_SCORE};
use serde::{Deserialize, Serialize};

/// Mate distances beyond this are treated as this far away.
pub const MAX_MATE_DISTANCE: i32 = 99;

/// An evaluation re-expressed so that larger is better for `mover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvaluation {
    /// Centipawns, mate scores mapped into `(MATE_SCORE - 100, MATE_SCORE)`.
    pub advantage_to_mover_cp: i32,
    /// Forced mate distance, positive when the mover is the one mating.
    pub mate_in: Option<i32>,
}

impl NormalizedEvaluation {
    /// The mover has a forced mate in this position.
    pub fn has_forced_mate(&self) -> bool {
        self.mate_in.is_some_and(|m| m > 0)
    }
}

/// Sentinel centipawn value for a forced mate: `sign(m) * (MATE_SCORE - min(|m|, 99))`.
///
/// Mate in 1 outranks mate in 5, and every mate stays strictly below a
/// delivered checkmate (`MATE_SCORE`).
pub fn mate_to_cp(mate_in: i32) -> i32 {
    if mate_in == 0 {
        tracing::warn!("Mate distance 0 has no side; treating as level");
        return 0;
    }
    let distance = mate_in.saturating_abs().min(MAX_MATE_DISTANCE);
    mate_in.signum() * (MATE_SCORE - distance)
}

/// Convert a White-perspective evaluation into the mover's perspective.
///
/// Centipawn scores outside `[-MATE_SCORE, MATE_SCORE]` cannot come from a
/// healthy engine; they are clamped and logged.
pub fn normalize(raw: &PositionEvaluation, mover: PieceColor) -> NormalizedEvaluation {
    let (white_cp, white_mate) = match raw.score {
        AnalysisScore::Centipawns(cp) => {
            let clamped = cp.clamp(-MATE_SCORE, MATE_SCORE);
            if clamped != cp {
                tracing::warn!(cp, clamped, "Centipawn score outside mate envelope");
            }
            (clamped, None)
        }
        AnalysisScore::Mate(m) => (mate_to_cp(m), Some(m)),
    };

    match mover {
        PieceColor::White => NormalizedEvaluation {
            advantage_to_mover_cp: white_cp,
            mate_in: white_mate,
        },
        PieceColor::Black => NormalizedEvaluation {
            advantage_to_mover_cp: -white_cp,
            mate_in: white_mate.map(|m| -m),
        },
    }
}
