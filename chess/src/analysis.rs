//! Engine evaluation types shared by the engine adapter and the analysis core.

use serde::{Deserialize, Serialize};

use crate::types::PieceColor;

/// Centipawn magnitude used for "the side to move is already checkmated".
/// Any forced-mate score is mapped strictly inside this envelope.
pub const MATE_SCORE: i32 = 10_000;

/// Engine evaluation score, always from White's point of view.
///
/// Centipawns: positive = White is better.
/// Mate: positive N = White mates in N moves,
/// negative N = Black mates in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisScore {
    Centipawns(i32),
    Mate(i32),
}

impl AnalysisScore {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    /// Re-express a side-to-move relative score (as UCI engines report it)
    /// from White's point of view.
    pub fn from_side_to_move(self, side_to_move: PieceColor) -> Self {
        match side_to_move {
            PieceColor::White => self,
            PieceColor::Black => self.negate(),
        }
    }
}

impl std::fmt::Display for AnalysisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// The oracle's verdict on one position: a recommended move and a score.
///
/// `best_move` is `None` only for terminal positions, which have no legal
/// continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEvaluation {
    pub best_move: Option<String>,
    pub score: AnalysisScore,
}

impl PositionEvaluation {
    pub fn centipawns(best_move: impl Into<String>, cp: i32) -> Self {
        Self {
            best_move: Some(best_move.into()),
            score: AnalysisScore::Centipawns(cp),
        }
    }

    pub fn mate(best_move: impl Into<String>, mate_in: i32) -> Self {
        Self {
            best_move: Some(best_move.into()),
            score: AnalysisScore::Mate(mate_in),
        }
    }

    /// Evaluation of a position where `winner` has just delivered checkmate.
    pub fn checkmate(winner: PieceColor) -> Self {
        let cp = match winner {
            PieceColor::White => MATE_SCORE,
            PieceColor::Black => -MATE_SCORE,
        };
        Self {
            best_move: None,
            score: AnalysisScore::Centipawns(cp),
        }
    }

    /// Evaluation of a position drawn by rule (stalemate, fifty moves).
    pub fn drawn() -> Self {
        Self {
            best_move: None,
            score: AnalysisScore::Centipawns(0),
        }
    }

    pub fn score_cp(&self) -> Option<i32> {
        match self.score {
            AnalysisScore::Centipawns(cp) => Some(cp),
            AnalysisScore::Mate(_) => None,
        }
    }

    pub fn mate_in(&self) -> Option<i32> {
        match self.score {
            AnalysisScore::Centipawns(_) => None,
            AnalysisScore::Mate(m) => Some(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_negate() {
        assert_eq!(
            AnalysisScore::Centipawns(50).negate(),
            AnalysisScore::Centipawns(-50)
        );
        assert_eq!(AnalysisScore::Mate(3).negate(), AnalysisScore::Mate(-3));
    }

    #[test]
    fn test_from_side_to_move() {
        let score = AnalysisScore::Centipawns(35);
        assert_eq!(score.from_side_to_move(PieceColor::White), score);
        assert_eq!(
            score.from_side_to_move(PieceColor::Black),
            AnalysisScore::Centipawns(-35)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(AnalysisScore::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(AnalysisScore::Mate(2).to_string(), "+M2");
        assert_eq!(AnalysisScore::Mate(-4).to_string(), "-M4");
    }

    #[test]
    fn test_exactly_one_score_field() {
        let cp = PositionEvaluation::centipawns("e2e4", 20);
        assert_eq!(cp.score_cp(), Some(20));
        assert_eq!(cp.mate_in(), None);

        let mate = PositionEvaluation::mate("d1h5", -2);
        assert_eq!(mate.score_cp(), None);
        assert_eq!(mate.mate_in(), Some(-2));
    }

    #[test]
    fn test_checkmate_sits_on_envelope() {
        let white_won = PositionEvaluation::checkmate(PieceColor::White);
        assert_eq!(white_won.score_cp(), Some(MATE_SCORE));
        assert!(white_won.best_move.is_none());
        let black_won = PositionEvaluation::checkmate(PieceColor::Black);
        assert_eq!(black_won.score_cp(), Some(-MATE_SCORE));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn score() -> impl Strategy<Value = AnalysisScore> {
            prop_oneof![
                any::<i16>().prop_map(|cp| AnalysisScore::Centipawns(i32::from(cp))),
                (-99i32..=99).prop_map(AnalysisScore::Mate),
            ]
        }

        proptest! {
            #[test]
            fn negate_is_an_involution(s in score()) {
                prop_assert_eq!(s.negate().negate(), s);
            }

            #[test]
            fn perspective_flip_round_trips(s in score()) {
                let white = s.from_side_to_move(PieceColor::Black);
                prop_assert_eq!(white.from_side_to_move(PieceColor::Black), s);
                prop_assert_eq!(s.from_side_to_move(PieceColor::White), s);
            }
        }
    }
}
