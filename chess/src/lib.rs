pub mod analysis;
pub mod fen;
pub mod game;
pub mod pgn;
pub mod types;

pub use analysis::{AnalysisScore, PositionEvaluation, MATE_SCORE};
pub use chess_common::{format_standard_uci, format_uci_move};
pub use fen::{FenError, START_FEN};
pub use game::{Game, GameError, GameStatusKind, HistoryEntry};
pub use pgn::{
    parse_pgn, validate_pgn_length, GameResult, PgnError, PgnGame, PgnMove, MAX_PGN_LENGTH,
};
pub use types::{PieceColor, PieceKind};
