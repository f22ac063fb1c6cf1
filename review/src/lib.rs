//! Whole-game review: evaluates every position of a finished game with a
//! pool of engine oracles, then classifies each move and scores both players.

pub mod config;
pub mod input;
pub mod pipeline;
pub mod report;
pub mod types;

pub use input::{read_pgn_input, InputError};
pub use pipeline::{review_game, review_pgn, ReviewConfig, ReviewError};
pub use types::{GameReview, MoveReview, MoveVerdict, ReviewProgress, ReviewStatus};
