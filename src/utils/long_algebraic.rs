//! Long algebraic move text (`e2e4`, `e7e8q`) to generated moves.
//!
//! Text is resolved against the legal moves of the position, so the
//! returned `Move` carries the same capture and special-move context the
//! generator would produce.

use crate::errors::{EngineResult, NotationError};
use crate::game_state::chess_types::*;
use crate::move_generation::move_generator::legal_moves;
use crate::utils::algebraic::parse_square;

/// Coordinates and promotion as written, not yet checked against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveText {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

pub fn parse_move_text(text: &str) -> Result<MoveText, NotationError> {
    let invalid = || NotationError::InvalidMoveText(text.to_owned());
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(invalid());
    }

    let from = parse_square(&text[0..2]).map_err(|_| invalid())?;
    let to = parse_square(&text[2..4]).map_err(|_| invalid())?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(ch) => match PieceKind::from_char(ch) {
            Some(kind) if PieceKind::PROMOTIONS.contains(&kind) && ch.is_ascii_lowercase() => {
                Some(kind)
            }
            _ => return Err(invalid()),
        },
    };

    Ok(MoveText {
        from,
        to,
        promotion,
    })
}

/// Resolves `text` to the matching legal move in `position`.
pub fn parse_move(text: &str, position: &mut Position) -> EngineResult<Move> {
    let wanted = parse_move_text(text)?;

    legal_moves(position)?
        .into_iter()
        .find(|mv| mv.from == wanted.from && mv.to == wanted.to && mv.promotion == wanted.promotion)
        .ok_or_else(|| {
            NotationError::IllegalMove {
                mv: text.to_owned(),
                fen: position.to_fen(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::{parse_move, parse_move_text};
    use crate::errors::{EngineError, NotationError};
    use crate::game_state::chess_types::*;

    #[test]
    fn simple_and_double_pushes_resolve() {
        let mut position =
            Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");
        let mv = parse_move("e2e4", &mut position).expect("move should parse");
        assert_eq!(mv.kind, MoveKind::DoublePawnPush);
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn promotion_suffix_selects_piece() {
        let mut position =
            Position::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").expect("FEN should parse");
        let mv = parse_move("a7a8n", &mut position).expect("move should parse");
        assert_eq!(mv.promotion, Some(PieceKind::Knight));

        let err = parse_move("a7a8", &mut position).expect_err("promotion piece is required");
        assert!(matches!(
            err,
            EngineError::Notation(NotationError::IllegalMove { .. })
        ));
    }

    #[test]
    fn castling_and_en_passant_keep_their_tags() {
        let mut castle =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        let mv = parse_move("e1g1", &mut castle).expect("castle should parse");
        assert_eq!(mv.kind, MoveKind::CastleKingSide);

        let mut en_passant =
            Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").expect("FEN should parse");
        let mv = parse_move("e5d6", &mut en_passant).expect("en-passant should parse");
        assert_eq!(mv.kind, MoveKind::EnPassant);
        assert_eq!(mv.captured, Some(PieceKind::Pawn));
    }

    #[test]
    fn malformed_text_is_rejected_before_board_lookup() {
        for text in ["", "e2", "e2e9", "e7e8k", "e7e8Q", "e2e4e5", "é2e4"] {
            assert_eq!(
                parse_move_text(text),
                Err(NotationError::InvalidMoveText(text.to_owned())),
                "{text}"
            );
        }
    }
}
