use cozy_chess::{BitBoard, Board, Color, Piece, Square};

/// Returns all pieces of `color` that attack the given square.
pub fn attackers_of(board: &Board, sq: Square, color: Color) -> BitBoard {
    let occupied = board.occupied();
    let color_pieces = board.colors(color);

    let mut attackers = BitBoard::EMPTY;

    // A pawn of `color` attacks `sq` if `sq` is in its attack set; look from
    // `sq` as if it were the opposite color's pawn.
    let pawn_attacks = cozy_chess::get_pawn_attacks(sq, !color);
    attackers |= pawn_attacks & board.pieces(Piece::Pawn) & color_pieces;

    let knight_attacks = cozy_chess::get_knight_moves(sq);
    attackers |= knight_attacks & board.pieces(Piece::Knight) & color_pieces;

    // Bishop/Queen (diagonal)
    let bishop_attacks = cozy_chess::get_bishop_moves(sq, occupied);
    attackers |=
        bishop_attacks & (board.pieces(Piece::Bishop) | board.pieces(Piece::Queen)) & color_pieces;

    // Rook/Queen (orthogonal)
    let rook_attacks = cozy_chess::get_rook_moves(sq, occupied);
    attackers |=
        rook_attacks & (board.pieces(Piece::Rook) | board.pieces(Piece::Queen)) & color_pieces;

    let king_attacks = cozy_chess::get_king_moves(sq);
    attackers |= king_attacks & board.pieces(Piece::King) & color_pieces;

    attackers
}

/// True if the piece on `sq` is attacked by the enemy and has no defender.
/// Empty squares and kings are never hanging.
pub fn is_hanging(board: &Board, sq: Square) -> bool {
    let Some(owner) = board.color_on(sq) else {
        return false;
    };
    if board.piece_on(sq) == Some(Piece::King) {
        return false;
    }
    !attackers_of(board, sq, !owner).is_empty() && attackers_of(board, sq, owner).is_empty()
}
