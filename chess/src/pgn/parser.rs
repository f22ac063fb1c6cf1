use cozy_chess::{Board, Move};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::san::{parse_san, SanError};
use crate::fen::{parse_fen, FenError, START_FEN};

/// Upper bound on accepted PGN text, in bytes.
pub const MAX_PGN_LENGTH: usize = 20_000;

/// A parsed PGN game (main line only).
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub tags: BTreeMap<String, String>,
    pub start_fen: String,
    pub moves: Vec<PgnMove>,
    pub result: GameResult,
}

/// A single move in PGN with metadata
#[derive(Debug, Clone)]
pub struct PgnMove {
    pub mv: Move,
    pub san: String,
    pub comment: Option<String>,
    pub nags: Vec<u8>, // Numeric Annotation Glyphs (!!, ?, etc.)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl GameResult {
    /// PGN result token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }
}

/// Reject input larger than `max_length` bytes before doing any parsing work.
pub fn validate_pgn_length(input: &str, max_length: usize) -> Result<(), PgnError> {
    if input.len() > max_length {
        return Err(PgnError::TooLong {
            length: input.len(),
            max: max_length,
        });
    }
    Ok(())
}

/// Parse a PGN string into a game.
///
/// Only the first game in the input is read. Variations are skipped, and a
/// `FEN` tag (with or without `SetUp "1"`) sets the starting position.
pub fn parse_pgn(input: &str) -> Result<PgnGame, PgnError> {
    let (tags, movetext) = split_tags(input)?;

    let start_fen = tags
        .get("FEN")
        .cloned()
        .unwrap_or_else(|| START_FEN.to_string());
    let mut board: Board = parse_fen(&start_fen)?;

    let tokens = tokenize_movetext(movetext)?;
    let mut moves: Vec<PgnMove> = Vec::new();
    let mut result = tags
        .get("Result")
        .and_then(|r| GameResult::from_token(r))
        .unwrap_or(GameResult::Ongoing);

    for token in tokens {
        match token {
            Token::Comment(text) => {
                if let Some(last) = moves.last_mut() {
                    last.comment = Some(match last.comment.take() {
                        Some(existing) => format!("{} {}", existing, text),
                        None => text,
                    });
                }
            }
            Token::Nag(nag) => {
                if let Some(last) = moves.last_mut() {
                    last.nags.push(nag);
                }
            }
            Token::Result(r) => {
                result = r;
                break;
            }
            Token::San(san) => {
                let (bare, suffix_nag) = split_annotation_suffix(&san);
                let mv = parse_san(&board, bare).map_err(|source| PgnError::IllegalMove {
                    ply: moves.len(),
                    san: san.clone(),
                    source,
                })?;
                board.play_unchecked(mv);
                moves.push(PgnMove {
                    mv,
                    san: bare.to_string(),
                    comment: None,
                    nags: suffix_nag.into_iter().collect(),
                });
            }
        }
    }

    if moves.is_empty() {
        return Err(PgnError::NoMoves);
    }

    tracing::debug!(
        plies = moves.len(),
        white = tags.get("White").map(String::as_str).unwrap_or("?"),
        black = tags.get("Black").map(String::as_str).unwrap_or("?"),
        "Parsed PGN"
    );

    Ok(PgnGame {
        tags,
        start_fen,
        moves,
        result,
    })
}

#[derive(Debug, PartialEq)]
enum Token {
    San(String),
    Comment(String),
    Nag(u8),
    Result(GameResult),
}

fn split_tags(input: &str) -> Result<(BTreeMap<String, String>, &str), PgnError> {
    let mut tags = BTreeMap::new();
    let mut rest = input.trim_start_matches('\u{feff}');

    loop {
        rest = rest.trim_start();
        if !rest.starts_with('[') {
            break;
        }
        let end = rest
            .find(']')
            .ok_or_else(|| PgnError::InvalidTag(rest.lines().next().unwrap_or("").to_string()))?;
        let inner = &rest[1..end];
        let (name, value) = parse_tag_pair(inner)?;
        tags.insert(name, value);
        rest = &rest[end + 1..];
    }

    Ok((tags, rest))
}

fn parse_tag_pair(inner: &str) -> Result<(String, String), PgnError> {
    let inner = inner.trim();
    let (name, value) = inner
        .split_once(char::is_whitespace)
        .ok_or_else(|| PgnError::InvalidTag(inner.to_string()))?;
    let value = value.trim();
    if !(value.len() >= 2 && value.starts_with('"') && value.ends_with('"')) {
        return Err(PgnError::InvalidTag(inner.to_string()));
    }
    let value = value[1..value.len() - 1].replace("\\\"", "\"");
    Ok((name.to_string(), value))
}

fn tokenize_movetext(text: &str) -> Result<Vec<Token>, PgnError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut variation_depth = 0usize;

    while let Some(&(start, c)) = chars.peek() {
        match c {
            '{' => {
                chars.next();
                let mut comment = String::new();
                let mut closed = false;
                for (_, ch) in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    comment.push(ch);
                }
                if !closed {
                    return Err(PgnError::InvalidFormat("unterminated comment".into()));
                }
                if variation_depth == 0 {
                    tokens.push(Token::Comment(comment.trim().to_string()));
                }
            }
            '}' => {
                return Err(PgnError::InvalidFormat("unbalanced '}'".into()));
            }
            ';' => {
                for (_, ch) in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                chars.next();
                variation_depth += 1;
            }
            ')' => {
                chars.next();
                variation_depth = variation_depth
                    .checked_sub(1)
                    .ok_or_else(|| PgnError::InvalidFormat("unbalanced ')'".into()))?;
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut end = start;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '{' | '}' | '(' | ')' | ';') {
                        break;
                    }
                    end = i + ch.len_utf8();
                    chars.next();
                }
                let word = &text[start..end];
                if variation_depth == 0 {
                    push_word(word, &mut tokens)?;
                }
            }
        }
    }

    if variation_depth != 0 {
        return Err(PgnError::InvalidFormat("unbalanced '('".into()));
    }

    Ok(tokens)
}

fn push_word(word: &str, tokens: &mut Vec<Token>) -> Result<(), PgnError> {
    if let Some(result) = GameResult::from_token(word) {
        tokens.push(Token::Result(result));
        return Ok(());
    }

    if let Some(nag) = word.strip_prefix('$') {
        let value = nag
            .parse()
            .map_err(|_| PgnError::InvalidFormat(format!("bad NAG {}", word)))?;
        tokens.push(Token::Nag(value));
        return Ok(());
    }

    // Move numbers: "12." or "12..." possibly glued to the move ("12.e4").
    // "0-0" castling also starts with a digit, so a number needs its dot.
    let after_digits = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let stripped = if after_digits.is_empty() {
        ""
    } else if after_digits.len() != word.len() && after_digits.starts_with('.') {
        after_digits.trim_start_matches('.')
    } else {
        word
    };
    if !stripped.is_empty() {
        tokens.push(Token::San(stripped.to_string()));
    }
    Ok(())
}

/// Split "Nf3!?" into ("Nf3", Some(NAG 5)).
fn split_annotation_suffix(san: &str) -> (&str, Option<u8>) {
    let bare = san.trim_end_matches(['!', '?']);
    let nag = match &san[bare.len()..] {
        "!" => Some(1),
        "?" => Some(2),
        "!!" => Some(3),
        "??" => Some(4),
        "!?" => Some(5),
        "?!" => Some(6),
        _ => None,
    };
    (bare, nag)
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Invalid PGN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid tag: {0}")]
    InvalidTag(String),
    #[error("PGN too long: {length} bytes (max {max})")]
    TooLong { length: usize, max: usize },
    #[error("PGN contains no moves")]
    NoMoves,
    #[error("Illegal move {san} at ply {ply}: {source}")]
    IllegalMove {
        ply: usize,
        san: String,
        #[source]
        source: SanError,
    },
    #[error(transparent)]
    Fen(#[from] FenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHOLARS_MATE: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6?? 4. Qxf7# 1-0
"#;

    #[test]
    fn test_parse_tags_and_moves() {
        let game = parse_pgn(SCHOLARS_MATE).unwrap();
        assert_eq!(game.tags.get("White").map(String::as_str), Some("Alice"));
        assert_eq!(game.moves.len(), 7);
        assert_eq!(game.moves[6].san, "Qxf7#");
        assert_eq!(game.result, GameResult::WhiteWins);
        assert_eq!(game.start_fen, START_FEN);
    }

    #[test]
    fn test_suffix_annotation_becomes_nag() {
        let game = parse_pgn(SCHOLARS_MATE).unwrap();
        assert_eq!(game.moves[5].san, "Nf6");
        assert_eq!(game.moves[5].nags, vec![4]);
    }

    #[test]
    fn test_comments_variations_and_nags() {
        let pgn = "1. e4 {king pawn} e5 (1... c5 2. Nf3) 2. Nf3 $1 ; rest of line\n Nc6 *";
        let game = parse_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(game.moves[0].comment.as_deref(), Some("king pawn"));
        assert_eq!(game.moves[2].nags, vec![1]);
        assert_eq!(game.result, GameResult::Ongoing);
    }

    #[test]
    fn test_glued_move_numbers() {
        let game = parse_pgn("1.d4 d5 2.c4 dxc4 3.e3").unwrap();
        assert_eq!(game.moves.len(), 5);
        assert_eq!(game.moves[3].san, "dxc4");
    }

    #[test]
    fn test_fen_tag_sets_start_position() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4Q3/4K3 b - - 0 1"]

1... Kd7 2. Qe5 *"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.start_fen, "4k3/8/8/8/8/8/4Q3/4K3 b - - 0 1");
        assert_eq!(game.moves.len(), 2);
    }

    #[test]
    fn test_illegal_move_reports_ply() {
        let err = parse_pgn("1. e4 e5 2. Ke3").unwrap_err();
        match err {
            PgnError::IllegalMove { ply, san, .. } => {
                assert_eq!(ply, 2);
                assert_eq!(san, "Ke3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_castling_not_mistaken_for_move_number() {
        let game = parse_pgn("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. 0-0 *").unwrap();
        assert_eq!(game.moves.len(), 7);
        assert_eq!(game.moves[6].san, "0-0");
    }

    #[test]
    fn test_no_moves() {
        assert!(matches!(
            parse_pgn("[Event \"Empty\"]\n\n*"),
            Err(PgnError::NoMoves)
        ));
    }

    #[test]
    fn test_unbalanced_variation() {
        assert!(matches!(
            parse_pgn("1. e4 (1. d4"),
            Err(PgnError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_length_guard() {
        let long = "a".repeat(MAX_PGN_LENGTH + 1);
        assert!(matches!(
            validate_pgn_length(&long, MAX_PGN_LENGTH),
            Err(PgnError::TooLong { .. })
        ));
        assert!(validate_pgn_length(SCHOLARS_MATE, MAX_PGN_LENGTH).is_ok());
    }
}
