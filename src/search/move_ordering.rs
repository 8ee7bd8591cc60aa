use crate::game_state::chess_types::*;
use crate::search::board_scoring::piece_value;

/// Victim value minus attacker value; higher is searched first.
#[inline]
pub fn mvv_lva_score(mv: &Move) -> i32 {
    match mv.captured {
        Some(victim) => piece_value(victim) - piece_value(mv.piece),
        None => 0,
    }
}

/// Captures by MVV-LVA, then the principal-variation move for this ply,
/// then the remaining moves in generation order. The sort is stable, so
/// equal keys keep generator order.
pub fn order_moves(moves: &mut [Move], pv_move: Option<Move>) {
    moves.sort_by_key(|mv| {
        if mv.is_capture() {
            (0, -mvv_lva_score(mv))
        } else if Some(*mv) == pv_move {
            (1, 0)
        } else {
            (2, 0)
        }
    });
}

#[cfg(test)]
mod tests {
    use super::{mvv_lva_score, order_moves};
    use crate::game_state::chess_types::*;

    #[test]
    fn captures_then_pv_then_quiet_moves() {
        let quiet_a = Move::new(1, 18, PieceKind::Knight);
        let quiet_b = Move::new(6, 21, PieceKind::Knight);
        let pawn_takes_rook = Move::capture(12, 19, PieceKind::Pawn, PieceKind::Rook);
        let queen_takes_rook = Move::capture(3, 19, PieceKind::Queen, PieceKind::Rook);
        let pawn_takes_queen = Move::capture(12, 21, PieceKind::Pawn, PieceKind::Queen);

        let mut moves = vec![
            quiet_a,
            queen_takes_rook,
            quiet_b,
            pawn_takes_rook,
            pawn_takes_queen,
        ];
        order_moves(&mut moves, Some(quiet_b));

        assert_eq!(
            moves,
            vec![pawn_takes_queen, pawn_takes_rook, queen_takes_rook, quiet_b, quiet_a]
        );
    }

    #[test]
    fn cheap_attacker_on_minor_piece_beats_queen_for_rook() {
        let queen_takes_rook = Move::capture(3, 59, PieceKind::Queen, PieceKind::Rook);
        let pawn_takes_knight = Move::capture(12, 21, PieceKind::Pawn, PieceKind::Knight);

        assert_eq!(mvv_lva_score(&pawn_takes_knight), 225);
        assert_eq!(mvv_lva_score(&queen_takes_rook), -475);

        let mut moves = vec![queen_takes_rook, pawn_takes_knight];
        order_moves(&mut moves, None);
        assert_eq!(moves, vec![pawn_takes_knight, queen_takes_rook]);
    }

    #[test]
    fn quiet_moves_keep_generation_order_without_pv() {
        let mut position = Position::new_game();
        let generated = crate::move_generation::move_generator::legal_moves(&mut position)
            .expect("movegen should succeed");
        let mut ordered = generated.clone();
        order_moves(&mut ordered, None);
        assert_eq!(ordered, generated);
    }
}
