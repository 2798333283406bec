//! Reference extractor: converts a chat message into an ordered list of
//! validated piece references against a given position.

use async_trait::async_trait;
use regex::Regex;
use shakmaty::{Color, Role, Square};
use std::sync::LazyLock;

use crate::board::BoardState;
use crate::proposer::ProposerError;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([a-h][1-8])([PNBRQK])").unwrap());

/// A tag whose claimed type matches the piece actually on the square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceReference {
    pub square: Square,
    pub piece_type: Role,
}

/// A tag whose claimed type does not match the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidReference {
    pub square: Square,
    pub expected_type: Role,
}

#[derive(Debug, Default)]
pub struct ExtractedReferences {
    pub references: Vec<PieceReference>,
    pub invalid: Vec<InvalidReference>,
}

/// Scan `@<square><PieceLetter>` tags in left-to-right order of appearance.
/// Pure text scan, no board validation; duplicates are kept.
pub fn scan_tags(text: &str) -> Vec<(Square, Role)> {
    TAG_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let square = cap[1].parse::<Square>().ok()?;
            let role = cap[2].chars().next().and_then(Role::from_char)?;
            Some((square, role))
        })
        .collect()
}

/// Validate scanned tags against the board. Order and duplicates are
/// preserved; each duplicate is processed as a separate reference. If
/// `invalid` comes back non-empty the caller must reject the whole message
/// before attempting any move.
pub fn parse_piece_references(message: &str, board: &BoardState) -> ExtractedReferences {
    let mut out = ExtractedReferences::default();
    for (square, role) in scan_tags(message) {
        match board.piece_at(square) {
            Some(piece) if piece.role == role => out.references.push(PieceReference {
                square,
                piece_type: role,
            }),
            _ => out.invalid.push(InvalidReference {
                square,
                expected_type: role,
            }),
        }
    }
    out
}

/// Boundary contract for implicit-reference resolution ("both knights",
/// "my queenside pawns"). Implementations typically call a free-text
/// classifier; their output must go through [`filter_classified`].
#[async_trait]
pub trait ReferenceClassifier: Send + Sync {
    async fn classify(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<Vec<(Square, Role)>, ProposerError>;
}

/// Filter classifier output down to references that actually exist on the
/// board with the mover's color. The classifier is free text underneath and
/// can hallucinate squares; nothing it claims is trusted.
pub fn filter_classified(
    candidates: Vec<(Square, Role)>,
    board: &BoardState,
    mover: Color,
) -> Vec<PieceReference> {
    candidates
        .into_iter()
        .filter(|&(square, role)| {
            board
                .piece_at(square)
                .is_some_and(|piece| piece.color == mover && piece.role == role)
        })
        .map(|(square, role)| PieceReference {
            square,
            piece_type: role,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_extracted_in_order_with_duplicates() {
        let board = BoardState::startpos();
        let out = parse_piece_references("@e2P advance, then @b1N jumps, @e2P again", &board);

        assert!(out.invalid.is_empty());
        let squares: Vec<String> = out.references.iter().map(|r| r.square.to_string()).collect();
        assert_eq!(squares, vec!["e2", "b1", "e2"]);
        assert_eq!(out.references[1].piece_type, Role::Knight);
    }

    #[test]
    fn test_type_mismatch_is_invalid() {
        let board = BoardState::startpos();
        // b1 holds a knight, not a queen.
        let out = parse_piece_references("@b1Q charge!", &board);

        assert!(out.references.is_empty());
        assert_eq!(out.invalid.len(), 1);
        assert_eq!(out.invalid[0].square, Square::B1);
        assert_eq!(out.invalid[0].expected_type, Role::Queen);
    }

    #[test]
    fn test_empty_square_is_invalid() {
        let board = BoardState::startpos();
        let out = parse_piece_references("@e4P", &board);
        assert_eq!(out.invalid.len(), 1);
    }

    #[test]
    fn test_non_tag_text_is_ignored() {
        let board = BoardState::startpos();
        let out = parse_piece_references("hello there, no tags here. @x9Z @e2p", &board);
        assert!(out.references.is_empty());
        assert!(out.invalid.is_empty());
    }

    #[test]
    fn test_filter_classified_rejects_hallucinations() {
        let board = BoardState::startpos();
        let candidates = vec![
            (Square::B1, Role::Knight),  // real white knight
            (Square::E4, Role::Queen),   // empty square
            (Square::B8, Role::Knight),  // right type, wrong color
            (Square::E2, Role::Rook),    // wrong type
        ];

        let refs = filter_classified(candidates, &board, Color::White);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].square, Square::B1);
    }
}
