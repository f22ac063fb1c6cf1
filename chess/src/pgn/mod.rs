pub mod parser;
pub mod san;

pub use parser::{
    parse_pgn, validate_pgn_length, GameResult, PgnError, PgnGame, PgnMove, MAX_PGN_LENGTH,
};
pub use san::{format_san, is_capture, parse_san, SanError};
