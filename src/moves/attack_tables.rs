//! Attack bitboards for every piece kind.
//!
//! Leapers (knight, king, pawn captures) come from tables built at compile
//! time. Sliders walk their rays against the occupancy at call time; the
//! search is bounded by legality filtering, not by slider cost.

use crate::game_state::chess_types::{Color, Square};

const KNIGHT_DELTAS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_DELTAS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const WHITE_PAWN_CAPTURE_DELTAS: [(i32, i32); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_CAPTURE_DELTAS: [(i32, i32); 2] = [(-1, -1), (1, -1)];

const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const ROOK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

pub const KNIGHT_ATTACKS: [u64; 64] = leaper_table(&KNIGHT_DELTAS);
pub const KING_ATTACKS: [u64; 64] = leaper_table(&KING_DELTAS);
pub const PAWN_ATTACKS: [[u64; 64]; 2] = [
    leaper_table(&WHITE_PAWN_CAPTURE_DELTAS),
    leaper_table(&BLACK_PAWN_CAPTURE_DELTAS),
];

const fn leaper_table(deltas: &[(i32, i32)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut i = 0usize;

        while i < deltas.len() {
            let (df, dr) = deltas[i];
            let f = file + df;
            let r = rank + dr;
            if f >= 0 && f < 8 && r >= 0 && r < 8 {
                table[sq] |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }

        sq += 1;
    }

    table
}

#[inline]
pub const fn knight_attacks(square: Square) -> u64 {
    KNIGHT_ATTACKS[square as usize]
}

#[inline]
pub const fn king_attacks(square: Square) -> u64 {
    KING_ATTACKS[square as usize]
}

/// Squares a pawn of `color` standing on `square` attacks.
#[inline]
pub const fn pawn_attacks(color: Color, square: Square) -> u64 {
    PAWN_ATTACKS[color.index()][square as usize]
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    ray_attacks(square, occupancy, &BISHOP_DIRECTIONS)
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    ray_attacks(square, occupancy, &ROOK_DIRECTIONS)
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

/// Each ray includes the first blocker it meets.
fn ray_attacks(square: Square, occupancy: u64, directions: &[(i32, i32); 4]) -> u64 {
    let file = i32::from(square % 8);
    let rank = i32::from(square / 8);
    let mut attacks = 0u64;

    for &(df, dr) in directions {
        let mut f = file + df;
        let mut r = rank + dr;
        while (0..8).contains(&f) && (0..8).contains(&r) {
            let bit = 1u64 << (r * 8 + f);
            attacks |= bit;
            if occupancy & bit != 0 {
                break;
            }
            f += df;
            r += dr;
        }
    }

    attacks
}

#[cfg(test)]
mod tests {
    use super::*;

    const A1: Square = 0;
    const E2: Square = 12;
    const D4: Square = 27;
    const E7: Square = 52;

    #[test]
    fn knight_attacks_from_d4_and_corner() {
        assert_eq!(knight_attacks(D4).count_ones(), 8);
        assert_eq!(knight_attacks(A1).count_ones(), 2);
    }

    #[test]
    fn king_attacks_from_a1_has_three_targets() {
        assert_eq!(king_attacks(A1).count_ones(), 3);
        assert_eq!(king_attacks(D4).count_ones(), 8);
    }

    #[test]
    fn pawn_attacks_point_forward_for_each_color() {
        assert_eq!(pawn_attacks(Color::White, E2), (1u64 << 19) | (1u64 << 21));
        assert_eq!(pawn_attacks(Color::Black, E7), (1u64 << 43) | (1u64 << 45));
        // a-file pawns only attack one square.
        assert_eq!(pawn_attacks(Color::White, 8).count_ones(), 1);
    }

    #[test]
    fn rook_blocker_stops_ray() {
        let blocker_on_a4 = 1u64 << 24;
        let attacks = rook_attacks(A1, blocker_on_a4);

        assert_ne!(attacks & (1u64 << 24), 0);
        assert_eq!(attacks & (1u64 << 32), 0);
        assert_eq!(rook_attacks(D4, 0).count_ones(), 14);
    }

    #[test]
    fn bishop_and_queen_open_board_counts() {
        assert_eq!(bishop_attacks(D4, 0).count_ones(), 13);
        assert_eq!(queen_attacks(D4, 0).count_ones(), 27);
    }
}
