//! Pluggable board evaluation interfaces and baseline implementations.
//!
//! Search stays independent of the heuristic by delegating static scoring to
//! `BoardScorer`; any implementation that is `Send + Sync` can be shared with
//! the search thread behind an `Arc`.

use crate::game_state::chess_types::*;

/// Score for delivering mate at the root; mate at ply `p` scores
/// `MATE_SCORE - p`.
pub const MATE_SCORE: i32 = 30000;

/// Scores beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1000;

/// Outside every reachable score; used as the initial search window.
pub const INFINITE_SCORE: i32 = 31000;

pub const DRAW_SCORE: i32 = 0;

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, position: &Position) -> i32;
}

#[inline]
pub const fn piece_value(piece: PieceKind) -> i32 {
    match piece {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 325,
        PieceKind::Bishop => 325,
        PieceKind::Rook => 500,
        PieceKind::Queen => 975,
        PieceKind::King => 20000,
    }
}

#[inline]
fn from_side_to_move(position: &Position, white_minus_black: i32) -> i32 {
    match position.side_to_move {
        Color::White => white_minus_black,
        Color::Black => -white_minus_black,
    }
}

fn material_white_minus_black(position: &Position) -> i32 {
    PieceKind::ALL
        .iter()
        .filter(|&&kind| kind != PieceKind::King)
        .map(|&kind| {
            let white = position.pieces[Color::White.index()][kind.index()].count_ones() as i32;
            let black = position.pieces[Color::Black.index()][kind.index()].count_ones() as i32;
            (white - black) * piece_value(kind)
        })
        .sum()
}

/// Material only.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl BoardScorer for MaterialScorer {
    fn score(&self, position: &Position) -> i32 {
        from_side_to_move(position, material_white_minus_black(position))
    }
}

/// Material, centralization of minor pieces and queens, pawn advancement,
/// and a small bonus for having the move.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScorer;

impl StandardScorer {
    const TEMPO: i32 = 10;

    // Distance-from-center rings: 0 for the four center squares, 3 for the rim.
    #[inline]
    fn center_ring(square: Square) -> i32 {
        let file = i32::from(square_file(square));
        let rank = i32::from(square_rank(square));
        let file_dist = (2 * file - 7).abs() / 2;
        let rank_dist = (2 * rank - 7).abs() / 2;
        file_dist.max(rank_dist)
    }

    fn placement_bonus(piece: Piece, square: Square) -> i32 {
        let centralization = 3 - Self::center_ring(square);
        match piece.kind {
            PieceKind::Knight => 8 * centralization,
            PieceKind::Bishop | PieceKind::Queen => 4 * centralization,
            PieceKind::Pawn => {
                let advanced = match piece.color {
                    Color::White => i32::from(square_rank(square)) - 1,
                    Color::Black => 6 - i32::from(square_rank(square)),
                };
                5 * advanced
            }
            PieceKind::Rook | PieceKind::King => 0,
        }
    }
}

impl BoardScorer for StandardScorer {
    fn score(&self, position: &Position) -> i32 {
        let mut white_minus_black = material_white_minus_black(position);

        for square in 0..64u8 {
            if let Some(piece) = position.piece_at(square) {
                let bonus = Self::placement_bonus(piece, square);
                match piece.color {
                    Color::White => white_minus_black += bonus,
                    Color::Black => white_minus_black -= bonus,
                }
            }
        }

        from_side_to_move(position, white_minus_black) + Self::TEMPO
    }
}

#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Full moves until mate for a mate score, signed from the side to move:
/// positive when it mates, negative when it gets mated.
pub fn mate_in_moves(score: i32) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    let plies = MATE_SCORE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}
