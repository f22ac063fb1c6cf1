use std::collections::BTreeMap;

use chess::PieceColor;
use serde::{Deserialize, Serialize};

use crate::classify::{ClassificationResult, MoveClassification};

/// Running tally for one player. `accuracy_pct` is only meaningful after
/// [`PlayerAccuracySummary::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAccuracySummary {
    pub side: PieceColor,
    pub counts: BTreeMap<MoveClassification, u32>,
    pub total_win_loss_sum: f64,
    pub total_cp_loss: u64,
    pub move_count: u32,
    pub accuracy_pct: f64,
    /// The review stopped before every move of this player was folded in.
    pub partial: bool,
}

impl PlayerAccuracySummary {
    pub fn new(side: PieceColor) -> Self {
        Self {
            side,
            counts: BTreeMap::new(),
            total_win_loss_sum: 0.0,
            total_cp_loss: 0,
            move_count: 0,
            accuracy_pct: 100.0,
            partial: false,
        }
    }

    pub fn fold(&mut self, result: &ClassificationResult) {
        *self.counts.entry(result.label).or_insert(0) += 1;
        self.total_win_loss_sum += result.win_loss_pct;
        self.total_cp_loss += u64::from(result.cp_loss);
        self.move_count += 1;
    }

    /// Compute and store `accuracy_pct`.
    pub fn finalize(&mut self, k: f64) -> f64 {
        self.accuracy_pct = accuracy_pct(self.total_cp_loss, self.move_count, k);
        self.accuracy_pct
    }

    pub fn count(&self, label: MoveClassification) -> u32 {
        self.counts.get(&label).copied().unwrap_or(0)
    }
}

/// `100 * exp(-total_cp_loss / move_count / k)`; 100 when no move was folded.
pub fn accuracy_pct(total_cp_loss: u64, move_count: u32, k: f64) -> f64 {
    if move_count == 0 {
        return 100.0;
    }
    if !(k.is_finite() && k > 0.0) {
        tracing::warn!(k, "Invalid accuracy decay constant");
        return if total_cp_loss == 0 { 100.0 } else { 0.0 };
    }
    let avg = total_cp_loss as f64 / f64::from(move_count);
    (100.0 * (-avg / k).exp()).clamp(0.0, 100.0)
}

/// Both players' summaries; the single writer of accuracy state for a game.
#[derive(Debug, Clone)]
pub struct AccuracyAggregator {
    white: PlayerAccuracySummary,
    black: PlayerAccuracySummary,
}

impl Default for AccuracyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl AccuracyAggregator {
    pub fn new() -> Self {
        Self {
            white: PlayerAccuracySummary::new(PieceColor::White),
            black: PlayerAccuracySummary::new(PieceColor::Black),
        }
    }

    pub fn fold(&mut self, side: PieceColor, result: &ClassificationResult) {
        match side {
            PieceColor::White => self.white.fold(result),
            PieceColor::Black => self.black.fold(result),
        }
    }

    pub fn mark_partial(&mut self) {
        self.white.partial = true;
        self.black.partial = true;
    }

    /// Finalize both summaries, returning `(white, black)`.
    pub fn finalize(mut self, k: f64) -> (PlayerAccuracySummary, PlayerAccuracySummary) {
        self.white.finalize(k);
        self.black.finalize(k);
        (self.white, self.black)
    }
}
