use crate::config::ClassifierConfig;
use crate::perspective::NormalizedEvaluation;
use crate::record::MoveRecord;

/// Whether the move gives up material: a capture of something worth less
/// than the capturing piece (beyond `margin`), or a quiet move that leaves
/// the moved piece en prise.
pub fn is_sacrifice(record: &MoveRecord, margin: u8) -> bool {
    match record.captured_piece_value {
        Some(captured) if record.is_capture => {
            record.moving_piece_value > captured + i32::from(margin)
        }
        _ => record.moved_piece_hanging,
    }
}

/// Gate for the `brilliant` label. Both evaluations are from the mover's
/// point of view; `best_move` is the engine's choice in the position before
/// the move.
pub fn is_brilliant_candidate(
    record: &MoveRecord,
    best_move: Option<&str>,
    before: &NormalizedEvaluation,
    after: &NormalizedEvaluation,
    config: &ClassifierConfig,
) -> bool {
    if best_move != Some(record.uci.as_str()) {
        return false;
    }
    if !is_sacrifice(record, config.sacrifice_margin) {
        return false;
    }

    let swing = i64::from(after.advantage_to_mover_cp) - i64::from(before.advantage_to_mover_cp);
    let candidate = after.advantage_to_mover_cp >= config.brilliant_min_advantage_cp
        && swing >= i64::from(config.brilliant_min_swing_cp);

    if candidate {
        tracing::debug!(
            ply = record.ply_index,
            uci = %record.uci,
            swing,
            "Brilliancy candidate"
        );
    }
    candidate
}
