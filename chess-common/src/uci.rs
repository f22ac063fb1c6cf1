//! UCI (Universal Chess Interface) utilities

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::converters::{format_piece, format_square};

/// Convert a cozy_chess castling move (king takes own rook) into the standard
/// UCI king-two-squares form. Non-castling moves are returned unchanged.
///
/// `board` must be the position *before* the move.
pub fn convert_cozy_castling_to_uci(mv: Move, board: &Board) -> Move {
    if !is_castling(mv, board) {
        return mv;
    }
    let to_file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(to_file, mv.from.rank()),
        promotion: None,
    }
}

/// True when `mv` is a castling move in cozy_chess notation.
pub fn is_castling(mv: Move, board: &Board) -> bool {
    let mover = board.side_to_move();
    board.piece_on(mv.from) == Some(Piece::King)
        && board.piece_on(mv.to) == Some(Piece::Rook)
        && board.colors(mover).has(mv.to)
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Format a move played on `board` in standard UCI notation, rewriting
/// castling into the king-two-squares form engines emit.
pub fn format_standard_uci(mv: Move, board: &Board) -> String {
    format_uci_move(convert_cozy_castling_to_uci(mv, board))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Rank;

    #[test]
    fn test_format_uci_move() {
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_castling_to_standard_uci() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let kingside = Move {
            from: Square::E1,
            to: Square::H1,
            promotion: None,
        };
        assert!(is_castling(kingside, &board));
        assert_eq!(format_standard_uci(kingside, &board), "e1g1");

        let queenside = Move {
            from: Square::E1,
            to: Square::A1,
            promotion: None,
        };
        assert_eq!(format_standard_uci(queenside, &board), "e1c1");
    }

    #[test]
    fn test_non_castling_king_move_untouched() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mv = Move {
            from: Square::E1,
            to: Square::F1,
            promotion: None,
        };
        assert_eq!(format_standard_uci(mv, &board), "e1f1");
    }
}
