use cozy_chess::{Board, GameStatus, Move, Piece};
use serde::{Deserialize, Serialize};

use crate::pgn::san::{format_san, is_capture};
use crate::types::{PieceColor, PieceKind};

/// Game state wrapper around cozy-chess Board, used to replay a finished
/// game ply by ply.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
}

/// Everything the analysis needs to know about one played ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 0-based index of this ply in the game.
    pub ply_index: u32,
    /// Move in standard UCI form (castling as the king's two-square move).
    pub uci: String,
    /// Standard Algebraic Notation, with `+`/`#` suffix.
    pub san: String,
    pub piece: PieceKind,
    pub piece_color: PieceColor,
    /// Captured piece, including the pawn taken en passant.
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub fen_before: String,
    pub fen_after: String,
    /// Status of the position after the move, from the rules' point of view.
    pub status_after: GameStatusKind,
}

/// Terminal status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatusKind {
    Ongoing,
    /// The side to move is checkmated.
    Checkmate,
    Drawn,
}

impl From<GameStatus> for GameStatusKind {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::Ongoing => Self::Ongoing,
            GameStatus::Won => Self::Checkmate,
            GameStatus::Drawn => Self::Drawn,
        }
    }
}

impl Game {
    fn from_board(position: Board) -> Self {
        Self {
            position,
            history: Vec::new(),
        }
    }

    /// Replay `moves` from `start_fen` (standard position when `None`) and
    /// return one history entry per ply.
    pub fn replay(
        start_fen: Option<&str>,
        moves: &[Move],
    ) -> Result<Vec<HistoryEntry>, GameError> {
        let mut game = match start_fen {
            Some(fen) => Self::from_board(crate::fen::parse_fen(fen)?),
            None => Self::from_board(Board::default()),
        };
        for (i, mv) in moves.iter().enumerate() {
            game.make_move(*mv).map_err(|e| match e {
                GameError::IllegalMove { .. } => GameError::IllegalMove { ply: i },
                other => other,
            })?;
        }
        tracing::debug!(plies = game.history.len(), "Replayed game");
        Ok(game.history)
    }

    /// Make a move on the board. Castling uses cozy-chess king-takes-rook
    /// notation.
    fn make_move(&mut self, mv: Move) -> Result<(), GameError> {
        let ply = self.history.len();
        if !self.position.is_legal(mv) {
            return Err(GameError::IllegalMove { ply });
        }

        let before = self.position.clone();
        let piece = before
            .piece_on(mv.from)
            .ok_or(GameError::IllegalMove { ply })?;
        let piece_color = before
            .color_on(mv.from)
            .ok_or(GameError::IllegalMove { ply })?;

        let captured = if chess_common::is_castling(mv, &before) || !is_capture(&before, mv) {
            None
        } else {
            // En passant leaves the target square empty.
            Some(before.piece_on(mv.to).unwrap_or(Piece::Pawn))
        };

        let san = format_san(&before, mv);
        let uci = chess_common::format_standard_uci(mv, &before);

        self.position.play_unchecked(mv);

        let entry = HistoryEntry {
            ply_index: ply as u32,
            uci,
            san,
            piece: piece.into(),
            piece_color: piece_color.into(),
            captured: captured.map(PieceKind::from),
            promotion: mv.promotion.map(PieceKind::from),
            fen_before: crate::fen::format_fen(&before),
            fen_after: self.to_fen(),
            status_after: self.position.status().into(),
        };

        self.history.push(entry);
        Ok(())
    }

    fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move at ply {ply}")]
    IllegalMove { ply: usize },
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}
