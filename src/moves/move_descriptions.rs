//! The `Move` value produced by generation and consumed by `Position::apply`.
//!
//! Moves are plain `Copy` values created fresh by the generator. They carry
//! enough context (moving piece, captured piece, special tag) for apply and
//! for capture ordering without another board lookup.

use std::fmt;

use crate::game_state::chess_types::{PieceKind, Square};
use crate::utils::algebraic::square_name;

/// Special-move tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal,
    DoublePawnPush,
    EnPassant,
    CastleKingSide,
    CastleQueenSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub kind: MoveKind,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            captured: None,
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    #[inline]
    pub const fn capture(from: Square, to: Square, piece: PieceKind, victim: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            captured: Some(victim),
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    #[inline]
    pub const fn with_kind(mut self, kind: MoveKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub const fn with_promotion(mut self, promotion: PieceKind) -> Self {
        self.promotion = Some(promotion);
        self
    }

    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline]
    pub const fn is_castle(&self) -> bool {
        matches!(
            self.kind,
            MoveKind::CastleKingSide | MoveKind::CastleQueenSide
        )
    }

    /// Same origin, destination and promotion; used to match protocol text
    /// against generated moves.
    #[inline]
    pub fn same_coordinates(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

/// Long algebraic form, e.g. `e2e4`, `e7e8q`, `e1g1`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", square_name(self.from), square_name(self.to))?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Move, MoveKind};
    use crate::game_state::chess_types::PieceKind;

    #[test]
    fn display_uses_long_algebraic() {
        let push = Move::new(12, 28, PieceKind::Pawn).with_kind(MoveKind::DoublePawnPush);
        assert_eq!(push.to_string(), "e2e4");

        let promo = Move::capture(52, 61, PieceKind::Pawn, PieceKind::Bishop)
            .with_promotion(PieceKind::Queen);
        assert_eq!(promo.to_string(), "e7f8q");
        assert!(promo.is_capture());
    }

    #[test]
    fn coordinate_match_ignores_capture_context() {
        let generated = Move::capture(4, 5, PieceKind::King, PieceKind::Rook);
        let parsed = Move::new(4, 5, PieceKind::King);
        assert!(generated.same_coordinates(&parsed));
        assert_ne!(generated, parsed);
    }
}
