//! Move-quality classification and accuracy scoring.
//!
//! Every score entering this crate is White-perspective; [`normalize`]
//! turns it into "advantage for the mover" before anything else looks at it.

pub mod accuracy;
pub mod arrow;
pub mod classify;
pub mod config;
pub mod helpers;
pub mod perspective;
pub mod record;
pub mod sacrifice;
pub mod win_probability;

pub use accuracy::{accuracy_pct, AccuracyAggregator, PlayerAccuracySummary};
pub use arrow::{arrow_for, Arrow};
pub use classify::{
    cp_loss, win_loss_pct, ClassificationResult, Classifier, MoveClassification, Rule, RULE_ORDER,
};
pub use config::ClassifierConfig;
pub use perspective::{mate_to_cp, normalize, NormalizedEvaluation};
pub use record::{MoveRecord, RecordError};
pub use sacrifice::{is_brilliant_candidate, is_sacrifice};
pub use win_probability::{win_percent, win_probability};
