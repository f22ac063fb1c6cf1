use serde::{Deserialize, Serialize};

/// Recommended-move arrow drawn from the engine's best move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub from_square: String,
    pub to_square: String,
}

/// Arrow for a UCI best move. `None` when there is no best move (terminal
/// position) or the string is not a UCI move.
pub fn arrow_for(best_move: Option<&str>) -> Option<Arrow> {
    let uci = best_move?;
    if !(4..=5).contains(&uci.len()) {
        return None;
    }
    let from = chess_common::parse_square(uci.get(0..2)?)?;
    let to = chess_common::parse_square(uci.get(2..4)?)?;
    Some(Arrow {
        from_square: chess_common::format_square(from),
        to_square: chess_common::format_square(to),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_from_best_move() {
        let arrow = arrow_for(Some("g1f3")).unwrap();
        assert_eq!(arrow.from_square, "g1");
        assert_eq!(arrow.to_square, "f3");
    }

    #[test]
    fn test_promotion_and_castling() {
        assert_eq!(arrow_for(Some("e7e8q")).unwrap().to_square, "e8");
        // Castling is reported as the king's move.
        assert_eq!(arrow_for(Some("e1g1")).unwrap().to_square, "g1");
    }

    #[test]
    fn test_no_arrow() {
        assert_eq!(arrow_for(None), None);
        assert_eq!(arrow_for(Some("(none)")), None);
        assert_eq!(arrow_for(Some("z9a1")), None);
        assert_eq!(arrow_for(Some("e2")), None);
    }
}
