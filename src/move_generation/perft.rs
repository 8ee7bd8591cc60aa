//! Move-path enumeration for validating the generator.

use crate::errors::EngineResult;
use crate::game_state::chess_types::*;
use crate::move_generation::move_generator::legal_moves;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.checkmates += rhs.checkmates;
    }
}

pub fn perft(position: &mut Position, depth: u8) -> EngineResult<PerftCounts> {
    if depth == 0 {
        return Ok(PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        });
    }

    let mut total = PerftCounts::default();
    for mv in legal_moves(position)? {
        total.merge(perft_move(position, mv, depth)?);
    }
    Ok(total)
}

/// Leaf count below each root move, in generation order.
pub fn perft_divide(position: &mut Position, depth: u8) -> EngineResult<Vec<(Move, u64)>> {
    if depth == 0 {
        return Ok(Vec::new());
    }

    legal_moves(position)?
        .into_iter()
        .map(|mv| Ok((mv, perft_move(position, mv, depth)?.nodes)))
        .collect()
}

fn perft_move(position: &mut Position, mv: Move, depth: u8) -> EngineResult<PerftCounts> {
    let mut child = position.play(mv)?;

    if depth > 1 {
        return perft(&mut child, depth - 1);
    }

    let gives_check = child.is_in_check(child.side_to_move);
    let is_checkmate = gives_check && legal_moves(&mut child)?.is_empty();

    Ok(PerftCounts {
        nodes: 1,
        captures: u64::from(mv.is_capture()),
        en_passant: u64::from(mv.kind == MoveKind::EnPassant),
        castles: u64::from(mv.is_castle()),
        promotions: u64::from(mv.promotion.is_some()),
        checks: u64::from(gives_check),
        checkmates: u64::from(is_checkmate),
    })
}
