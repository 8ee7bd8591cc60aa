use crate::game_state::chess_types::*;
use crate::moves::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};

/// Whether any piece of `attacker_color` attacks `square` on the current
/// occupancy.
pub fn is_square_attacked(position: &Position, square: Square, attacker_color: Color) -> bool {
    let theirs = &position.pieces[attacker_color.index()];

    // A pawn of ours on `square` would attack exactly the squares an enemy
    // pawn must stand on to attack it.
    if pawn_attacks(attacker_color.opposite(), square) & theirs[PieceKind::Pawn.index()] != 0 {
        return true;
    }
    if knight_attacks(square) & theirs[PieceKind::Knight.index()] != 0 {
        return true;
    }
    if king_attacks(square) & theirs[PieceKind::King.index()] != 0 {
        return true;
    }

    let queens = theirs[PieceKind::Queen.index()];
    let diagonal = theirs[PieceKind::Bishop.index()] | queens;
    if diagonal != 0 && bishop_attacks(square, position.occupancy_all) & diagonal != 0 {
        return true;
    }
    let straight = theirs[PieceKind::Rook.index()] | queens;
    straight != 0 && rook_attacks(square, position.occupancy_all) & straight != 0
}

#[cfg(test)]
mod tests {
    use super::is_square_attacked;
    use crate::game_state::chess_types::*;

    #[test]
    fn pawn_attacks_are_directional() {
        let position =
            Position::from_fen("4k3/8/8/8/3p4/8/8/4K3 w - - 0 1").expect("FEN should parse");
        // Black pawn on d4 hits c3 and e3, not c5.
        assert!(is_square_attacked(&position, 18, Color::Black));
        assert!(is_square_attacked(&position, 20, Color::Black));
        assert!(!is_square_attacked(&position, 34, Color::Black));
    }

    #[test]
    fn sliders_are_blocked_by_pieces() {
        let position =
            Position::from_fen("4k3/8/8/8/8/8/8/R1N4K b - - 0 1").expect("FEN should parse");
        assert!(is_square_attacked(&position, B1, Color::White));
        assert!(!is_square_attacked(&position, D1, Color::White), "c1 knight blocks the rook");
        assert!(is_square_attacked(&position, A8, Color::White));
    }
}
