use cozy_chess::{Board, GameStatus, Move, Piece};

use chess_common::{file_to_char, is_castling, rank_to_char};

use crate::types::PieceKind;

/// Parse Standard Algebraic Notation (SAN) move against `board`.
///
/// Matching is done by formatting every legal move and comparing, so any
/// SAN this module can emit is accepted. Check/mate markers and annotation
/// suffixes (`!`, `?`) are ignored, as is `0-0` castling spelled with zeros.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize_san(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut found = None;
    let mut legal = Vec::new();
    board.generate_moves(|mvs| {
        legal.extend(mvs);
        false
    });

    for mv in legal {
        let candidate = normalize_san(&format_san(board, mv));
        if candidate == wanted || lenient_pawn_match(&candidate, &wanted) {
            if found.is_some() {
                return Err(SanError::AmbiguousMove(san.to_string()));
            }
            found = Some(mv);
        }
    }

    found.ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// Format a move as SAN, including `+`/`#` suffixes.
///
/// `board` is the position before the move; the move must be legal there.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = String::new();

    if is_castling(mv, board) {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let Some(piece) = board.piece_on(mv.from) else {
            return chess_common::format_uci_move(mv);
        };
        let is_capture = is_capture(board, mv);

        if piece == Piece::Pawn {
            if is_capture {
                san.push(file_to_char(mv.from.file()));
            }
        } else {
            san.push(PieceKind::from(piece).to_char_upper());
            san.push_str(&disambiguation(board, mv, piece));
        }

        if is_capture {
            san.push('x');
        }

        san.push(file_to_char(mv.to.file()));
        san.push(rank_to_char(mv.to.rank()));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(PieceKind::from(promo).to_char_upper());
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    san
}

/// True if `mv` removes an enemy piece, including en passant.
pub fn is_capture(board: &Board, mv: Move) -> bool {
    let enemy = !board.side_to_move();
    if board.colors(enemy).has(mv.to) {
        return true;
    }
    board.piece_on(mv.from) == Some(Piece::Pawn)
        && mv.from.file() != mv.to.file()
        && board.piece_on(mv.to).is_none()
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals = Vec::new();
    board.generate_moves(|mvs| {
        if mvs.piece == piece && mvs.from != mv.from {
            for other in mvs.into_iter() {
                if other.to == mv.to {
                    rivals.push(other.from);
                }
            }
        }
        false
    });

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    match (same_file, same_rank) {
        (false, _) => file_to_char(mv.from.file()).to_string(),
        (true, false) => rank_to_char(mv.from.rank()).to_string(),
        (true, true) => format!(
            "{}{}",
            file_to_char(mv.from.file()),
            rank_to_char(mv.from.rank())
        ),
    }
}

fn normalize_san(san: &str) -> String {
    san.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
        .replace("e.p.", "")
        .trim()
        .to_string()
}

/// Accept promotions written without `=` ("e8Q") as some exporters do.
fn lenient_pawn_match(candidate: &str, wanted: &str) -> bool {
    candidate.contains('=') && candidate.replace('=', "") == wanted
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Square;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn test_format_pawn_push() {
        let b = Board::default();
        let mv = Move {
            from: Square::E2,
            to: Square::E4,
            promotion: None,
        };
        assert_eq!(format_san(&b, mv), "e4");
    }

    #[test]
    fn test_format_knight() {
        let b = Board::default();
        let mv = Move {
            from: Square::G1,
            to: Square::F3,
            promotion: None,
        };
        assert_eq!(format_san(&b, mv), "Nf3");
    }

    #[test]
    fn test_format_pawn_capture() {
        let b = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        let mv = Move {
            from: Square::E4,
            to: Square::D5,
            promotion: None,
        };
        assert_eq!(format_san(&b, mv), "exd5");
    }

    #[test]
    fn test_format_castling() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let short = Move {
            from: Square::E1,
            to: Square::H1,
            promotion: None,
        };
        let long = Move {
            from: Square::E1,
            to: Square::A1,
            promotion: None,
        };
        assert_eq!(format_san(&b, short), "O-O");
        assert_eq!(format_san(&b, long), "O-O-O");
    }

    #[test]
    fn test_format_promotion_with_check() {
        let b = board("8/P7/8/8/8/8/8/k3K3 w - - 0 1");
        let mv = Move {
            from: Square::A7,
            to: Square::A8,
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_san(&b, mv), "a8=Q+");
    }

    #[test]
    fn test_format_checkmate_suffix() {
        // Scholar's mate: Qxf7#
        let b = board("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        let mv = Move {
            from: Square::H5,
            to: Square::F7,
            promotion: None,
        };
        assert_eq!(format_san(&b, mv), "Qxf7#");
    }

    #[test]
    fn test_file_disambiguation() {
        let b = board("4k3/8/8/8/8/8/8/R4RK1 w - - 0 1");
        let mv = Move {
            from: Square::A1,
            to: Square::D1,
            promotion: None,
        };
        assert_eq!(format_san(&b, mv), "Rad1");
    }

    #[test]
    fn test_parse_round_trip_start_position() {
        let b = Board::default();
        let mut legal = Vec::new();
        b.generate_moves(|mvs| {
            legal.extend(mvs);
            false
        });
        for mv in legal {
            let san = format_san(&b, mv);
            assert_eq!(parse_san(&b, &san).unwrap(), mv, "san {}", san);
        }
    }

    #[test]
    fn test_parse_tolerates_annotations() {
        let b = Board::default();
        let mv = parse_san(&b, "e4!?").unwrap();
        assert_eq!(mv.to, Square::E4);
    }

    #[test]
    fn test_parse_zero_castling() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let mv = parse_san(&b, "0-0").unwrap();
        assert_eq!(mv.to, Square::H1);
    }

    #[test]
    fn test_parse_illegal() {
        let b = Board::default();
        assert!(matches!(parse_san(&b, "e5"), Err(SanError::NoLegalMove(_))));
        assert!(matches!(parse_san(&b, ""), Err(SanError::InvalidFormat(_))));
    }
}
