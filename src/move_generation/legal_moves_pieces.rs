//! Knight and slider generation. All four share the same shape: an attack
//! set from the origin, minus friendly pieces.

use crate::game_state::chess_types::*;
use crate::moves::attack_tables::{bishop_attacks, knight_attacks, queen_attacks, rook_attacks};

const PIECE_KINDS: [PieceKind; 4] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
];

pub fn generate_piece_moves(position: &Position, out: &mut Vec<Move>) {
    let side = position.side_to_move;
    let own_occ = position.occupancy_by_color[side.index()];
    let occupancy = position.occupancy_all;

    for kind in PIECE_KINDS {
        let mut pieces = position.pieces[side.index()][kind.index()];
        while pieces != 0 {
            let from = pieces.trailing_zeros() as Square;
            pieces &= pieces - 1;

            let attacks = match kind {
                PieceKind::Knight => knight_attacks(from),
                PieceKind::Bishop => bishop_attacks(from, occupancy),
                PieceKind::Rook => rook_attacks(from, occupancy),
                _ => queen_attacks(from, occupancy),
            };
            push_targets(position, kind, from, attacks & !own_occ, out);
        }
    }
}

/// Pushes one move per target square, tagging captures with the victim.
pub(crate) fn push_targets(
    position: &Position,
    piece: PieceKind,
    from: Square,
    mut targets: u64,
    out: &mut Vec<Move>,
) {
    while targets != 0 {
        let to = targets.trailing_zeros() as Square;
        targets &= targets - 1;
        out.push(match position.piece_at(to) {
            Some(victim) => Move::capture(from, to, piece, victim.kind),
            None => Move::new(from, to, piece),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::generate_piece_moves;
    use crate::game_state::chess_types::*;

    #[test]
    fn starting_position_has_four_knight_moves_and_no_slider_moves() {
        let position = Position::new_game();
        let mut out = Vec::new();
        generate_piece_moves(&position, &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|mv| mv.piece == PieceKind::Knight));
    }

    #[test]
    fn slider_captures_carry_the_victim() {
        let position =
            Position::from_fen("4k3/8/8/8/8/8/8/R3K2n w - - 0 1").expect("FEN should parse");
        let mut out = Vec::new();
        generate_piece_moves(&position, &mut out);
        assert_eq!(out.iter().filter(|mv| mv.is_capture()).count(), 0, "e1 king blocks the h1 knight");

        let position =
            Position::from_fen("4k3/8/8/8/8/8/8/R2n2K1 w - - 0 1").expect("FEN should parse");
        let mut out = Vec::new();
        generate_piece_moves(&position, &mut out);
        let capture = out
            .iter()
            .find(|mv| mv.is_capture())
            .expect("rook should capture on d1");
        assert_eq!(capture.captured, Some(PieceKind::Knight));
        assert_eq!(capture.to, D1);
    }
}
