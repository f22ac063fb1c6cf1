use serde::{Deserialize, Serialize};

/// Thresholds used by the classifier and the accuracy aggregator.
///
/// Win-probability values are percentage points (0..=100), advantages are
/// centipawns from the mover's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Above this absolute advantage before the move, only `best` and
    /// `excellent` are reachable.
    pub garbage_time_cp: i32,
    /// In garbage time, a loss up to this still counts as `best`.
    pub garbage_time_best_max_loss_pct: f64,
    /// Plies with `ply_index < opening_plies` may be labelled `theory`.
    pub opening_plies: u32,
    pub theory_max_loss_pct: f64,
    pub best_max_loss_pct: f64,
    pub excellent_max_loss_pct: f64,
    pub great_max_loss_pct: f64,
    pub good_max_loss_pct: f64,
    pub inaccuracy_max_loss_pct: f64,
    pub mistake_max_loss_pct: f64,
    /// Advantage after a brilliant move must be at least this large.
    pub brilliant_min_advantage_cp: i32,
    /// And it must have improved by at least this much.
    pub brilliant_min_swing_cp: i32,
    /// A capture is a sacrifice when the mover gives up more than the
    /// captured value plus this margin (pawn units).
    pub sacrifice_margin: u8,
    /// Decay constant K of `100 * exp(-avg_cp_loss / K)`.
    pub accuracy_decay: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            garbage_time_cp: 700,
            garbage_time_best_max_loss_pct: 2.0,
            opening_plies: 30,
            theory_max_loss_pct: 2.0,
            best_max_loss_pct: 1.0,
            excellent_max_loss_pct: 2.0,
            great_max_loss_pct: 5.0,
            good_max_loss_pct: 10.0,
            inaccuracy_max_loss_pct: 20.0,
            mistake_max_loss_pct: 30.0,
            brilliant_min_advantage_cp: 200,
            brilliant_min_swing_cp: 100,
            sacrifice_margin: 1,
            accuracy_decay: 120.0,
        }
    }
}

impl ClassifierConfig {
    /// Whether `ply_index` falls inside the opening window.
    pub fn is_opening(&self, ply_index: u32) -> bool {
        ply_index < self.opening_plies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ClassifierConfig =
            serde_json::from_str(r#"{ "opening_plies": 12, "accuracy_decay": 100.0 }"#).unwrap();
        assert_eq!(config.opening_plies, 12);
        assert_eq!(config.accuracy_decay, 100.0);
        assert_eq!(config.garbage_time_cp, 700);
        assert_eq!(config.mistake_max_loss_pct, 30.0);
    }

    #[test]
    fn test_opening_window() {
        let config = ClassifierConfig::default();
        assert!(config.is_opening(0));
        assert!(config.is_opening(29));
        assert!(!config.is_opening(30));
    }
}
