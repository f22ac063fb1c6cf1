//! Rendering a finished review for the terminal or as JSON.

use std::fmt::Write;

use analysis::{MoveClassification, PlayerAccuracySummary};
use chess::{PieceColor, PositionEvaluation};

use crate::types::{GameReview, MoveReview, MoveVerdict, ReviewStatus};

/// Glyph for a PGN NAG, as printed after a move.
fn nag_glyph(nag: u8) -> &'static str {
    match nag {
        1 => "!",
        2 => "?",
        3 => "!!",
        4 => "??",
        5 => "!?",
        6 => "?!",
        _ => "",
    }
}

fn format_eval(eval: Option<&PositionEvaluation>) -> String {
    eval.map_or_else(|| "-".to_string(), |e| e.score.display())
}

fn format_move(mv: &MoveReview) -> String {
    let glyph = mv
        .verdict
        .classification()
        .and_then(|r| r.label.to_nag())
        .map_or("", nag_glyph);
    let prefix = match mv.side {
        PieceColor::White => format!("{}.", mv.move_number),
        PieceColor::Black => format!("{}...", mv.move_number),
    };
    format!("{} {}{}", prefix, mv.san, glyph)
}

fn write_summary(out: &mut String, name: &str, summary: &PlayerAccuracySummary) {
    let _ = writeln!(
        out,
        "{:<6} {:>6.1}%  ({} moves{})",
        name,
        summary.accuracy_pct,
        summary.move_count,
        if summary.partial { ", partial" } else { "" }
    );
    let counts: Vec<String> = MoveClassification::ALL
        .iter()
        .filter_map(|&label| {
            let n = summary.count(label);
            (n > 0).then(|| format!("{label} {n}"))
        })
        .collect();
    if !counts.is_empty() {
        let _ = writeln!(out, "       {}", counts.join(", "));
    }
}

/// Human-readable report: one line per ply, then both players' accuracy.
pub fn render_text(review: &GameReview) -> String {
    let mut out = String::new();

    for key in ["White", "Black", "Event", "Date"] {
        if let Some(value) = review.tags.get(key) {
            let _ = writeln!(out, "{key}: {value}");
        }
    }
    let _ = writeln!(out, "Result: {}", review.result.as_str());
    let _ = writeln!(out);

    for mv in &review.moves {
        let (label, detail) = match &mv.verdict {
            MoveVerdict::Classified(result) => (
                result.label.as_str(),
                format!("loss {:>5.1}%  {:>4}cp", result.win_loss_pct, result.cp_loss),
            ),
            MoveVerdict::Unknown { reason } => ("unknown", reason.clone()),
        };
        let best = match (&mv.best_move, &mv.verdict) {
            (Some(best), MoveVerdict::Classified(_)) if *best != mv.uci => {
                format!("  best {best}")
            }
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<14} {:<11} {:>7} -> {:<7} {}{}",
            format_move(mv),
            label,
            format_eval(mv.eval_before.as_ref()),
            format_eval(mv.eval_after.as_ref()),
            detail,
            best
        );
    }

    let _ = writeln!(out);
    write_summary(&mut out, "White", &review.white);
    write_summary(&mut out, "Black", &review.black);

    if let ReviewStatus::Cancelled {
        evaluated_positions,
        total_positions,
    } = review.status
    {
        let _ = writeln!(
            out,
            "\nReview cancelled after {evaluated_positions} of {total_positions} positions"
        );
    }
    out
}

/// Pretty-printed JSON of the whole review.
pub fn render_json(review: &GameReview) -> serde_json::Result<String> {
    serde_json::to_string_pretty(review)
}
