use chess::PositionEvaluation;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::perspective::{normalize, NormalizedEvaluation};
use crate::record::MoveRecord;
use crate::sacrifice::is_brilliant_candidate;
use crate::win_probability::win_percent;

/// Quality label of a played move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClassification {
    /// Early move that keeps the evaluation (coarse opening heuristic).
    Theory,
    /// Sound sacrifice that was also the engine's choice.
    Brilliant,
    Best,
    Excellent,
    Great,
    Good,
    Inaccuracy,
    Mistake,
    /// A mistake or blunder that let a forced mate slip.
    Miss,
    Blunder,
}

impl MoveClassification {
    pub const ALL: [Self; 10] = [
        Self::Theory,
        Self::Brilliant,
        Self::Best,
        Self::Excellent,
        Self::Great,
        Self::Good,
        Self::Inaccuracy,
        Self::Mistake,
        Self::Miss,
        Self::Blunder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Brilliant => "brilliant",
            Self::Best => "best",
            Self::Excellent => "excellent",
            Self::Great => "great",
            Self::Good => "good",
            Self::Inaccuracy => "inaccuracy",
            Self::Mistake => "mistake",
            Self::Miss => "miss",
            Self::Blunder => "blunder",
        }
    }

    /// NAG (Numeric Annotation Glyph) for PGN export.
    pub fn to_nag(self) -> Option<u8> {
        match self {
            Self::Brilliant => Some(3), // !!
            Self::Great => Some(1), // !
            Self::Inaccuracy => Some(6), // ?!
            Self::Mistake => Some(2), // ?
            Self::Miss | Self::Blunder => Some(4), // ??
            Self::Theory | Self::Best | Self::Excellent | Self::Good => None,
        }
    }
}

impl std::fmt::Display for MoveClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rules of the classifier, in the order they are tried. The first rule
/// that yields a label decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Checkmate,
    GarbageTime,
    Brilliancy,
    Theory,
    WinProbabilityBucket,
}

pub const RULE_ORDER: [Rule; 5] = [
    Rule::Checkmate,
    Rule::GarbageTime,
    Rule::Brilliancy,
    Rule::Theory,
    Rule::WinProbabilityBucket,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: MoveClassification,
    /// Drop in the mover's win probability, percentage points in `[0, 100]`.
    pub win_loss_pct: f64,
    pub cp_loss: u32,
    /// Which rule produced the label.
    pub decided_by: Rule,
}

impl ClassificationResult {
    /// Per-move accuracy `100 * exp(-cp_loss / k)`.
    pub fn move_accuracy(&self, k: f64) -> f64 {
        100.0 * (-(self.cp_loss as f64) / k).exp()
    }
}

/// Centipawns the mover gave away; improvements count as zero.
pub fn cp_loss(before: &NormalizedEvaluation, after: &NormalizedEvaluation) -> u32 {
    let diff = i64::from(before.advantage_to_mover_cp) - i64::from(after.advantage_to_mover_cp);
    u32::try_from(diff.max(0)).unwrap_or(u32::MAX)
}

/// Win-probability drop in percentage points, clamped into `[0, 100]`.
pub fn win_loss_pct(before: &NormalizedEvaluation, after: &NormalizedEvaluation) -> f64 {
    let raw = win_percent(before.advantage_to_mover_cp) - win_percent(after.advantage_to_mover_cp);
    if !raw.is_finite() {
        tracing::warn!(
            before = before.advantage_to_mover_cp,
            after = after.advantage_to_mover_cp,
            "Non-finite win-probability loss, treating as zero"
        );
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

/// Inputs of one classification, shared by every rule.
struct MoveContext<'a> {
    record: &'a MoveRecord,
    best_move: Option<&'a str>,
    before: NormalizedEvaluation,
    after: NormalizedEvaluation,
    is_opening: bool,
    win_loss_pct: f64,
}

/// Ordered move classifier. Pure: the same inputs always give the same label.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify from raw White-perspective evaluations of the positions
    /// before and after the move. The opening flag comes from the config.
    pub fn classify_move(
        &self,
        record: &MoveRecord,
        raw_before: &PositionEvaluation,
        raw_after: &PositionEvaluation,
    ) -> (ClassificationResult, NormalizedEvaluation, NormalizedEvaluation) {
        let before = normalize(raw_before, record.side_to_move);
        let after = normalize(raw_after, record.side_to_move);
        let result = self.classify(
            record,
            raw_before.best_move.as_deref(),
            before,
            after,
            self.config.is_opening(record.ply_index),
        );
        (result, before, after)
    }

    /// Classify with already normalized evaluations (mover's perspective).
    pub fn classify(
        &self,
        record: &MoveRecord,
        best_move: Option<&str>,
        before: NormalizedEvaluation,
        after: NormalizedEvaluation,
        is_opening: bool,
    ) -> ClassificationResult {
        let ctx = MoveContext {
            record,
            best_move,
            before,
            after,
            is_opening,
            win_loss_pct: win_loss_pct(&before, &after),
        };

        let (decided_by, label) = RULE_ORDER
            .iter()
            .find_map(|&rule| self.apply(rule, &ctx).map(|label| (rule, label)))
            .unwrap_or_else(|| (Rule::WinProbabilityBucket, self.bucket(&ctx)));

        tracing::trace!(
            ply = record.ply_index,
            uci = %record.uci,
            label = %label,
            rule = ?decided_by,
            win_loss_pct = ctx.win_loss_pct,
            "Classified move"
        );

        ClassificationResult {
            label,
            win_loss_pct: ctx.win_loss_pct,
            cp_loss: cp_loss(&before, &after),
            decided_by,
        }
    }

    fn apply(&self, rule: Rule, ctx: &MoveContext<'_>) -> Option<MoveClassification> {
        let config = &self.config;
        match rule {
            Rule::Checkmate => ctx
                .record
                .delivers_checkmate
                .then_some(MoveClassification::Best),
            Rule::GarbageTime => {
                if ctx.before.advantage_to_mover_cp.saturating_abs() <= config.garbage_time_cp {
                    return None;
                }
                if ctx.win_loss_pct <= config.garbage_time_best_max_loss_pct {
                    Some(MoveClassification::Best)
                } else {
                    Some(MoveClassification::Excellent)
                }
            }
            Rule::Brilliancy => is_brilliant_candidate(
                ctx.record,
                ctx.best_move,
                &ctx.before,
                &ctx.after,
                config,
            )
            .then_some(MoveClassification::Brilliant),
            Rule::Theory => (ctx.is_opening && ctx.win_loss_pct <= config.theory_max_loss_pct)
                .then_some(MoveClassification::Theory),
            Rule::WinProbabilityBucket => Some(self.bucket(ctx)),
        }
    }

    fn bucket(&self, ctx: &MoveContext<'_>) -> MoveClassification {
        let config = &self.config;
        let loss = ctx.win_loss_pct;
        let label = if loss <= config.best_max_loss_pct {
            MoveClassification::Best
        } else if loss <= config.excellent_max_loss_pct {
            MoveClassification::Excellent
        } else if loss <= config.great_max_loss_pct {
            MoveClassification::Great
        } else if loss <= config.good_max_loss_pct {
            MoveClassification::Good
        } else if loss <= config.inaccuracy_max_loss_pct {
            MoveClassification::Inaccuracy
        } else if loss <= config.mistake_max_loss_pct {
            MoveClassification::Mistake
        } else {
            MoveClassification::Blunder
        };

        let missed_mate = ctx.before.has_forced_mate() && !ctx.after.has_forced_mate();
        match label {
            MoveClassification::Mistake | MoveClassification::Blunder if missed_mate => {
                MoveClassification::Miss
            }
            other => other,
        }
    }
}
