use crate::game_state::chess_types::*;

/// Single undo record for `Position::apply` / `Position::revert`.
///
/// Deliberately not `Clone`: each record is consumed by exactly one revert.
#[derive(Debug)]
pub struct UndoRecord {
    pub mv: Move,
    pub captured: Option<Piece>,

    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_fullmove_number: u16,

    pub prev_zobrist_key: u64,
}
