use crate::game_state::chess_types::*;
use crate::moves::attack_tables::pawn_attacks;

pub fn generate_pawn_moves(position: &Position, out: &mut Vec<Move>) {
    let side = position.side_to_move;
    let enemy_occ = position.occupancy_by_color[side.opposite().index()];
    let empty = !position.occupancy_all;

    let (start_rank, promotion_rank) = match side {
        Color::White => (1, 7),
        Color::Black => (6, 0),
    };
    let forward = |sq: Square| match side {
        Color::White => sq + 8,
        Color::Black => sq - 8,
    };

    let mut pawns = position.pieces[side.index()][PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;

        // Pawns never stand on the last rank, so one step forward is on-board.
        let to = forward(from);
        if square_bit(to) & empty != 0 {
            push_with_promotions(out, Move::new(from, to, PieceKind::Pawn), promotion_rank);

            if square_rank(from) == start_rank {
                let two_step = forward(to);
                if square_bit(two_step) & empty != 0 {
                    out.push(
                        Move::new(from, two_step, PieceKind::Pawn)
                            .with_kind(MoveKind::DoublePawnPush),
                    );
                }
            }
        }

        let targets = pawn_attacks(side, from);
        let mut captures = targets & enemy_occ;
        while captures != 0 {
            let to = captures.trailing_zeros() as Square;
            captures &= captures - 1;
            if let Some(victim) = position.piece_at(to) {
                push_with_promotions(
                    out,
                    Move::capture(from, to, PieceKind::Pawn, victim.kind),
                    promotion_rank,
                );
            }
        }

        if let Some(ep) = position.en_passant_square {
            if targets & square_bit(ep) != 0 {
                out.push(
                    Move::capture(from, ep, PieceKind::Pawn, PieceKind::Pawn)
                        .with_kind(MoveKind::EnPassant),
                );
            }
        }
    }
}

fn push_with_promotions(out: &mut Vec<Move>, mv: Move, promotion_rank: u8) {
    if square_rank(mv.to) == promotion_rank {
        out.extend(PieceKind::PROMOTIONS.iter().map(|&p| mv.with_promotion(p)));
    } else {
        out.push(mv);
    }
}
