//! Zobrist keys for position identity and repetition detection.
//!
//! Keys come from a fixed splitmix64 seed so hashes are reproducible across
//! runs, which keeps repetition-related tests deterministic.

use std::sync::OnceLock;

use crate::game_state::chess_types::*;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut seed: u64 = 0x5DEE_CE66_D1CE_4E5B;
    let mut next = || splitmix64(&mut seed);

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for by_kind in &mut piece_square {
        for by_square in by_kind {
            for key in by_square {
                *key = next();
            }
        }
    }

    let side_to_move = next();
    let castling = std::array::from_fn(|_| next());
    let en_passant_file = std::array::from_fn(|_| next());

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
pub fn piece_key(piece: Piece, square: Square) -> u64 {
    tables().piece_square[piece.color.index()][piece.kind.index()][square as usize]
}

#[inline]
pub fn castling_key(rights: CastlingRights) -> u64 {
    tables().castling[(rights & CASTLE_ALL) as usize]
}

#[inline]
pub fn en_passant_key(square: Option<Square>) -> u64 {
    square.map_or(0, |sq| tables().en_passant_file[square_file(sq) as usize])
}

/// Xored in when black is to move.
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Full key computed from scratch; apply/revert maintain it incrementally.
pub fn compute_key(position: &Position) -> u64 {
    let mut key = 0u64;

    for square in 0..64u8 {
        if let Some(piece) = position.piece_at(square) {
            key ^= piece_key(piece, square);
        }
    }
    if position.side_to_move == Color::Black {
        key ^= side_to_move_key();
    }
    key ^= castling_key(position.castling_rights);
    key ^= en_passant_key(position.en_passant_square);

    key
}
