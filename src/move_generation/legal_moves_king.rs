use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::move_generation::legal_moves_pieces::push_targets;
use crate::moves::attack_tables::king_attacks;

struct CastlingPath {
    right: CastlingRights,
    king_from: Square,
    king_to: Square,
    rook_from: Square,
    must_be_empty: u64,
    must_be_safe: [Square; 2],
    kind: MoveKind,
}

const CASTLING_PATHS: [CastlingPath; 4] = [
    CastlingPath {
        right: CASTLE_WHITE_KINGSIDE,
        king_from: E1,
        king_to: G1,
        rook_from: H1,
        must_be_empty: square_bit(F1) | square_bit(G1),
        must_be_safe: [F1, G1],
        kind: MoveKind::CastleKingSide,
    },
    CastlingPath {
        right: CASTLE_WHITE_QUEENSIDE,
        king_from: E1,
        king_to: C1,
        rook_from: A1,
        must_be_empty: square_bit(B1) | square_bit(C1) | square_bit(D1),
        must_be_safe: [D1, C1],
        kind: MoveKind::CastleQueenSide,
    },
    CastlingPath {
        right: CASTLE_BLACK_KINGSIDE,
        king_from: E8,
        king_to: G8,
        rook_from: H8,
        must_be_empty: square_bit(F8) | square_bit(G8),
        must_be_safe: [F8, G8],
        kind: MoveKind::CastleKingSide,
    },
    CastlingPath {
        right: CASTLE_BLACK_QUEENSIDE,
        king_from: E8,
        king_to: C8,
        rook_from: A8,
        must_be_empty: square_bit(B8) | square_bit(C8) | square_bit(D8),
        must_be_safe: [D8, C8],
        kind: MoveKind::CastleQueenSide,
    },
];

pub fn generate_king_moves(position: &Position, out: &mut Vec<Move>) {
    let side = position.side_to_move;
    let Some(from) = position.king_square(side) else {
        return;
    };

    let targets = king_attacks(from) & !position.occupancy_by_color[side.index()];
    push_targets(position, PieceKind::King, from, targets, out);

    generate_castling_moves(position, from, out);
}

fn generate_castling_moves(position: &Position, king_from: Square, out: &mut Vec<Move>) {
    let side = position.side_to_move;
    let enemy = side.opposite();
    let own_rook = Some(Piece::new(PieceKind::Rook, side));

    let mut checked_origin = false;
    for path in &CASTLING_PATHS {
        if position.castling_rights & path.right == 0
            || path.king_from != king_from
            || position.occupancy_all & path.must_be_empty != 0
            || position.piece_at(path.rook_from) != own_rook
        {
            continue;
        }

        // Cannot castle out of check.
        if !checked_origin {
            if is_square_attacked(position, king_from, enemy) {
                return;
            }
            checked_origin = true;
        }

        if path
            .must_be_safe
            .iter()
            .all(|&sq| !is_square_attacked(position, sq, enemy))
        {
            out.push(Move::new(king_from, path.king_to, PieceKind::King).with_kind(path.kind));
        }
    }
}
