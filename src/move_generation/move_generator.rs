//! Full legal move generation pipeline.
//!
//! Piece-wise pseudo-legal generation followed by a legality filter that
//! plays each candidate on the position and rejects self-checks. The filter
//! needs `&mut Position` because it applies moves in place; the position is
//! back to its original state when the call returns, on success or error.

use crate::errors::EngineResult;
use crate::game_state::chess_types::*;
use crate::move_generation::legal_moves_king::generate_king_moves;
use crate::move_generation::legal_moves_pawn::generate_pawn_moves;
use crate::move_generation::legal_moves_pieces::generate_piece_moves;

/// Which subset of legal moves to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFilter {
    All,
    CapturesOnly,
}

pub fn pseudo_legal_moves(position: &Position) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(64);
    generate_pawn_moves(position, &mut pseudo);
    generate_piece_moves(position, &mut pseudo);
    generate_king_moves(position, &mut pseudo);
    pseudo
}

#[inline]
pub fn legal_moves(position: &mut Position) -> EngineResult<Vec<Move>> {
    generate_legal_moves(position, MoveFilter::All)
}

#[inline]
pub fn legal_captures(position: &mut Position) -> EngineResult<Vec<Move>> {
    generate_legal_moves(position, MoveFilter::CapturesOnly)
}

pub fn generate_legal_moves(position: &mut Position, filter: MoveFilter) -> EngineResult<Vec<Move>> {
    let us = position.side_to_move;
    let mut legal = pseudo_legal_moves(position);
    if filter == MoveFilter::CapturesOnly {
        legal.retain(Move::is_capture);
    }

    let mut kept = 0;
    for i in 0..legal.len() {
        let mv = legal[i];
        let leaves_king_safe = !position.play(mv)?.is_in_check(us);
        if leaves_king_safe {
            legal[kept] = mv;
            kept += 1;
        }
    }
    legal.truncate(kept);

    Ok(legal)
}
