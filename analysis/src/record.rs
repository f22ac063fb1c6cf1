use chess::{GameStatusKind, HistoryEntry, PieceColor, PieceKind};
use serde::{Deserialize, Serialize};

use crate::helpers::is_hanging;

/// One played move, as the classifier sees it. Built once from the rules
/// collaborator's history and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub ply_index: u32,
    pub side_to_move: PieceColor,
    /// SAN of the move.
    pub move_notation: String,
    /// Standard UCI, comparable with an engine's best move.
    pub uci: String,
    pub is_capture: bool,
    /// Value of the moving piece (a promoting pawn counts as a pawn).
    pub moving_piece_value: i32,
    pub captured_piece_value: Option<i32>,
    pub delivers_checkmate: bool,
    /// The moved piece stands attacked and undefended after the move.
    pub moved_piece_hanging: bool,
    pub fen_before: String,
    pub fen_after: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid position after ply {ply}: {source}")]
    InvalidPosition {
        ply: u32,
        #[source]
        source: chess::FenError,
    },
    #[error("Malformed move {uci} at ply {ply}")]
    MalformedMove { ply: u32, uci: String },
}

impl MoveRecord {
    pub fn from_history(entry: &HistoryEntry) -> Result<Self, RecordError> {
        let after = chess::fen::parse_fen(&entry.fen_after).map_err(|source| {
            RecordError::InvalidPosition {
                ply: entry.ply_index,
                source,
            }
        })?;
        let destination = entry
            .uci
            .get(2..4)
            .and_then(chess_common::parse_square)
            .ok_or_else(|| RecordError::MalformedMove {
                ply: entry.ply_index,
                uci: entry.uci.clone(),
            })?;

        Ok(Self {
            ply_index: entry.ply_index,
            side_to_move: entry.piece_color,
            move_notation: entry.san.clone(),
            uci: entry.uci.clone(),
            is_capture: entry.captured.is_some(),
            moving_piece_value: entry.piece.value(),
            captured_piece_value: entry.captured.map(PieceKind::value),
            delivers_checkmate: entry.status_after == GameStatusKind::Checkmate,
            moved_piece_hanging: is_hanging(&after, destination),
            fen_before: entry.fen_before.clone(),
            fen_after: entry.fen_after.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{parse_pgn, Game};

    fn records(pgn: &str) -> Vec<MoveRecord> {
        let game = parse_pgn(pgn).unwrap();
        let moves: Vec<_> = game.moves.iter().map(|m| m.mv).collect();
        Game::replay(Some(&game.start_fen), &moves)
            .unwrap()
            .iter()
            .map(|entry| MoveRecord::from_history(entry).unwrap())
            .collect()
    }

    #[test]
    fn test_scholars_mate_records() {
        let recs = records("1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7#");
        assert_eq!(recs.len(), 7);

        let first = &recs[0];
        assert_eq!(first.side_to_move, PieceColor::White);
        assert_eq!(first.uci, "e2e4");
        assert!(!first.is_capture);
        assert_eq!(first.moving_piece_value, 1);

        let mate = &recs[6];
        assert!(mate.delivers_checkmate);
        assert!(mate.is_capture);
        assert_eq!(mate.moving_piece_value, 9);
        assert_eq!(mate.captured_piece_value, Some(1));
        assert_eq!(mate.move_notation, "Qxf7#");
    }

    #[test]
    fn test_queen_move_into_attack_is_hanging() {
        // 2. Qg4 steps onto the c8 bishop's open diagonal with no defender.
        let recs = records("1. e4 d5 2. Qg4");
        let queen = &recs[2];
        assert_eq!(queen.side_to_move, PieceColor::White);
        assert!(queen.moved_piece_hanging);
        assert!(!recs[0].moved_piece_hanging);
    }

    #[test]
    fn test_black_move_side() {
        let recs = records("1. d4 Nf6");
        assert_eq!(recs[1].side_to_move, PieceColor::Black);
        assert_eq!(recs[1].ply_index, 1);
    }
}
