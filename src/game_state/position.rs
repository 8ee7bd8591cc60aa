//! Mutable board state with in-place apply/revert.
//!
//! `Position` keeps a 64-entry mailbox as the authoritative square map and
//! mirrors it into per-color, per-kind bitboards for attack detection. Both
//! views, the Zobrist key and the key history are updated together by
//! `apply` and restored by `revert`.
//!
//! Reverts must happen in exact reverse order of applies. The search never
//! calls `revert` by hand; it goes through `Position::play`, whose guard
//! reverts on every exit path.

use std::ops::{Deref, DerefMut};

use crate::errors::{EngineError, EngineResult, NotationError};
use crate::game_state::chess_rules::{FIFTY_MOVE_RULE_HALFMOVES, STARTING_POSITION_FEN};
use crate::game_state::chess_types::*;
use crate::game_state::zobrist;
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

/// Key history capacity reserved up front so `apply` does not reallocate in
/// the search tree.
const KEY_HISTORY_CAPACITY: usize = 1024;

/// Castling rights that survive a move touching each square.
const CASTLING_KEEP_MASK: [CastlingRights; 64] = build_castling_keep_mask();

const fn build_castling_keep_mask() -> [CastlingRights; 64] {
    let mut table = [CASTLE_ALL; 64];
    table[A1 as usize] = CASTLE_ALL & !CASTLE_WHITE_QUEENSIDE;
    table[E1 as usize] = CASTLE_ALL & !(CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE);
    table[H1 as usize] = CASTLE_ALL & !CASTLE_WHITE_KINGSIDE;
    table[A8 as usize] = CASTLE_ALL & !CASTLE_BLACK_QUEENSIDE;
    table[E8 as usize] = CASTLE_ALL & !(CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE);
    table[H8 as usize] = CASTLE_ALL & !CASTLE_BLACK_KINGSIDE;
    table
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; 64],

    // [color][piece_kind]
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,

    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,

    pub halfmove_clock: u16,
    pub fullmove_number: u16,

    pub zobrist_key: u64,
    key_history: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: [None; 64],
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,

            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,

            halfmove_clock: 0,
            fullmove_number: 1,

            zobrist_key: 0,
            key_history: Vec::with_capacity(KEY_HISTORY_CAPACITY),
        }
    }
}

impl Position {
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn new_game() -> Self {
        parse_fen(STARTING_POSITION_FEN).expect("starting FEN should always parse")
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<Self, NotationError> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square as usize]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let kings = self.pieces[color.index()][PieceKind::King.index()];
        (kings != 0).then(|| kings.trailing_zeros() as Square)
    }

    /// Whether `color`'s king is attacked. A missing king is never in check.
    #[inline]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|sq| is_square_attacked(self, sq, color.opposite()))
    }

    /// Places a piece on an empty square. Used while building positions.
    pub(crate) fn put_piece(&mut self, piece: Piece, square: Square) {
        let bit = square_bit(square);
        self.board[square as usize] = Some(piece);
        self.pieces[piece.color.index()][piece.kind.index()] |= bit;
        self.occupancy_by_color[piece.color.index()] |= bit;
        self.occupancy_all |= bit;
        self.zobrist_key ^= zobrist::piece_key(piece, square);
    }

    fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[square as usize].take()?;
        let bit = square_bit(square);
        self.pieces[piece.color.index()][piece.kind.index()] &= !bit;
        self.occupancy_by_color[piece.color.index()] &= !bit;
        self.occupancy_all &= !bit;
        self.zobrist_key ^= zobrist::piece_key(piece, square);
        Some(piece)
    }

    /// Recomputes the key from scratch and forgets the history; called once
    /// after a snapshot has been loaded.
    pub(crate) fn reset_key(&mut self) {
        self.zobrist_key = zobrist::compute_key(self);
        self.key_history.clear();
    }

    /// Square of the pawn removed by an en-passant capture landing on `to`.
    #[inline]
    fn en_passant_victim_square(mover: Color, to: Square) -> Square {
        match mover {
            Color::White => to - 8,
            Color::Black => to + 8,
        }
    }

    #[inline]
    fn castling_rook_squares(kind: MoveKind, king_from: Square) -> Option<(Square, Square)> {
        match kind {
            MoveKind::CastleKingSide => Some((king_from + 3, king_from + 1)),
            MoveKind::CastleQueenSide => Some((king_from - 4, king_from - 1)),
            _ => None,
        }
    }

    fn validate(&self, mv: &Move) -> EngineResult<()> {
        let invalid = |reason: &'static str| EngineError::InvalidMove {
            mv: mv.to_string(),
            reason,
        };
        let us = self.side_to_move;

        match self.piece_at(mv.from) {
            Some(p) if p.color == us && p.kind == mv.piece => {}
            Some(_) => return Err(invalid("origin piece does not match the side to move")),
            None => return Err(invalid("origin square is empty")),
        }

        let victim_square = if mv.kind == MoveKind::EnPassant {
            if self.en_passant_square != Some(mv.to) {
                return Err(invalid("en-passant target is not available"));
            }
            Self::en_passant_victim_square(us, mv.to)
        } else {
            mv.to
        };

        let victim = self.piece_at(victim_square);
        if victim.is_some_and(|p| p.color == us) {
            return Err(invalid("destination holds a friendly piece"));
        }
        if victim.map(|p| p.kind) != mv.captured {
            return Err(invalid("captured piece does not match the board"));
        }

        if let Some((rook_from, _)) = Self::castling_rook_squares(mv.kind, mv.from) {
            if self.piece_at(rook_from) != Some(Piece::new(PieceKind::Rook, us)) {
                return Err(invalid("castling rook is missing"));
            }
        }

        Ok(())
    }

    /// Plays `mv` for the side to move and flips the side to move.
    pub fn apply(&mut self, mv: Move) -> EngineResult<UndoRecord> {
        self.validate(&mv)?;

        let us = self.side_to_move;
        let undo_base = (
            self.castling_rights,
            self.en_passant_square,
            self.halfmove_clock,
            self.fullmove_number,
            self.zobrist_key,
        );
        self.key_history.push(self.zobrist_key);

        let captured = match mv.kind {
            MoveKind::EnPassant => self.remove_piece(Self::en_passant_victim_square(us, mv.to)),
            _ => self.remove_piece(mv.to),
        };

        self.remove_piece(mv.from);
        let landing = Piece::new(mv.promotion.unwrap_or(mv.piece), us);
        self.put_piece(landing, mv.to);

        if let Some((rook_from, rook_to)) = Self::castling_rook_squares(mv.kind, mv.from) {
            if let Some(rook) = self.remove_piece(rook_from) {
                self.put_piece(rook, rook_to);
            }
        }

        self.zobrist_key ^= zobrist::castling_key(self.castling_rights);
        self.castling_rights &=
            CASTLING_KEEP_MASK[mv.from as usize] & CASTLING_KEEP_MASK[mv.to as usize];
        self.zobrist_key ^= zobrist::castling_key(self.castling_rights);

        self.zobrist_key ^= zobrist::en_passant_key(self.en_passant_square);
        self.en_passant_square = match mv.kind {
            MoveKind::DoublePawnPush => Some((mv.from + mv.to) / 2),
            _ => None,
        };
        self.zobrist_key ^= zobrist::en_passant_key(self.en_passant_square);

        if mv.piece == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = us.opposite();
        self.zobrist_key ^= zobrist::side_to_move_key();

        let (
            prev_castling_rights,
            prev_en_passant_square,
            prev_halfmove_clock,
            prev_fullmove_number,
            prev_zobrist_key,
        ) = undo_base;
        Ok(UndoRecord {
            mv,
            captured,
            prev_castling_rights,
            prev_en_passant_square,
            prev_halfmove_clock,
            prev_fullmove_number,
            prev_zobrist_key,
        })
    }

    /// Restores the state from before the matching `apply`.
    pub fn revert(&mut self, undo: UndoRecord) {
        let mv = undo.mv;
        let us = self.side_to_move.opposite();
        self.side_to_move = us;

        if let Some((rook_from, rook_to)) = Self::castling_rook_squares(mv.kind, mv.from) {
            if let Some(rook) = self.remove_piece(rook_to) {
                self.put_piece(rook, rook_from);
            }
        }

        self.remove_piece(mv.to);
        self.put_piece(Piece::new(mv.piece, us), mv.from);

        if let Some(victim) = undo.captured {
            let victim_square = match mv.kind {
                MoveKind::EnPassant => Self::en_passant_victim_square(us, mv.to),
                _ => mv.to,
            };
            self.put_piece(victim, victim_square);
        }

        self.fullmove_number = undo.prev_fullmove_number;
        self.castling_rights = undo.prev_castling_rights;
        self.en_passant_square = undo.prev_en_passant_square;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.zobrist_key = undo.prev_zobrist_key;
        self.key_history.pop();
    }

    /// Scoped application: the returned guard dereferences to the position
    /// and reverts the move when dropped.
    #[inline]
    pub fn play(&mut self, mv: Move) -> EngineResult<AppliedMove<'_>> {
        let undo = self.apply(mv)?;
        Ok(AppliedMove {
            position: self,
            undo: Some(undo),
        })
    }

    /// True if the current position already occurred since the last
    /// irreversible move with the same side to move.
    pub fn is_repetition(&self) -> bool {
        let len = self.key_history.len();
        let window = usize::from(self.halfmove_clock).min(len);
        self.key_history[len - window..]
            .iter()
            .rev()
            .skip(1)
            .step_by(2)
            .any(|&key| key == self.zobrist_key)
    }

    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_RULE_HALFMOVES
    }

    /// Bare kings, or a single minor piece on the board.
    pub fn has_insufficient_material(&self) -> bool {
        let heavy_or_pawns = [PieceKind::Pawn, PieceKind::Rook, PieceKind::Queen]
            .iter()
            .any(|kind| {
                self.pieces[Color::White.index()][kind.index()]
                    | self.pieces[Color::Black.index()][kind.index()]
                    != 0
            });
        if heavy_or_pawns {
            return false;
        }

        let minors: u32 = Color::ALL
            .iter()
            .map(|c| {
                (self.pieces[c.index()][PieceKind::Knight.index()]
                    | self.pieces[c.index()][PieceKind::Bishop.index()])
                .count_ones()
            })
            .sum();
        minors <= 1
    }

    /// Checks the structural invariants that must hold between moves.
    pub fn check_consistency(&self) -> EngineResult<()> {
        for square in 0..64u8 {
            let bit = square_bit(square);
            match self.board[square as usize] {
                Some(piece) => {
                    if self.pieces[piece.color.index()][piece.kind.index()] & bit == 0 {
                        return Err(EngineError::Internal(format!(
                            "mailbox and bitboards disagree on square {square}"
                        )));
                    }
                }
                None => {
                    if self.occupancy_all & bit != 0 {
                        return Err(EngineError::Internal(format!(
                            "empty square {square} is marked occupied"
                        )));
                    }
                }
            }
        }
        for color in Color::ALL {
            if self.pieces[color.index()][PieceKind::King.index()].count_ones() != 1 {
                return Err(EngineError::Internal(format!(
                    "{color:?} does not have exactly one king"
                )));
            }
        }
        if self.zobrist_key != zobrist::compute_key(self) {
            return Err(EngineError::Internal("zobrist key drifted".to_owned()));
        }
        Ok(())
    }
}

/// A move applied to a position for the lifetime of the guard.
pub struct AppliedMove<'a> {
    position: &'a mut Position,
    undo: Option<UndoRecord>,
}

impl AppliedMove<'_> {
    #[inline]
    pub fn mv(&self) -> Option<Move> {
        self.undo.as_ref().map(|u| u.mv)
    }
}

impl Deref for AppliedMove<'_> {
    type Target = Position;

    #[inline]
    fn deref(&self) -> &Position {
        self.position
    }
}

impl DerefMut for AppliedMove<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Position {
        self.position
    }
}

impl Drop for AppliedMove<'_> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            self.position.revert(undo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::errors::EngineError;
    use crate::game_state::chess_types::*;
    use crate::move_generation::move_generator::legal_moves;
    use crate::utils::long_algebraic::parse_move;

    fn play_line(position: &mut Position, line: &[&str]) {
        for text in line {
            let mv = parse_move(text, position).expect("move should parse");
            position.apply(mv).expect("move should apply");
        }
    }

    #[test]
    fn apply_then_revert_restores_every_field() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");
        let before = position.clone();

        for mv in legal_moves(&mut position).expect("movegen should succeed") {
            let undo = position.apply(mv).expect("legal move should apply");
            position.check_consistency().expect("position should stay consistent");
            position.revert(undo);
            assert_eq!(position, before, "round trip failed for {mv}");
        }
    }

    #[test]
    fn castling_moves_rook_and_clears_rights() {
        let mut position =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        play_line(&mut position, &["e1g1"]);

        assert_eq!(position.piece_at(G1), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(position.piece_at(F1), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert_eq!(position.piece_at(H1), None);
        assert_eq!(
            position.castling_rights,
            CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE
        );
    }

    #[test]
    fn en_passant_capture_removes_the_passed_pawn() {
        let mut position = Position::new_game();
        play_line(&mut position, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(position.en_passant_square, Some(43));

        let before = position.clone();
        let mv = parse_move("e5d6", &mut position).expect("en-passant should parse");
        assert_eq!(mv.kind, MoveKind::EnPassant);

        let undo = position.apply(mv).expect("en-passant should apply");
        assert_eq!(position.piece_at(35), None, "d5 pawn should be captured");
        position.revert(undo);
        assert_eq!(position, before);
    }

    #[test]
    fn apply_rejects_mismatched_origin_piece() {
        let mut position = Position::new_game();
        let bogus = Move::new(12, 20, PieceKind::Knight);
        let err = position.apply(bogus).expect_err("wrong piece should be rejected");
        assert!(matches!(err, EngineError::InvalidMove { .. }));
        assert_eq!(position, Position::new_game());
    }

    #[test]
    fn scoped_play_reverts_on_drop() {
        let mut position = Position::new_game();
        let mv = parse_move("g1f3", &mut position).expect("move should parse");
        {
            let child = position.play(mv).expect("move should apply");
            assert_eq!(child.side_to_move, Color::Black);
            assert_eq!(child.mv(), Some(mv));
        }
        assert_eq!(position, Position::new_game());
    }

    #[test]
    fn revert_restores_a_saturated_fullmove_counter() {
        let mut position =
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 65535").expect("FEN should parse");
        let before = position.clone();
        let mv = parse_move("e8d8", &mut position).expect("move should parse");

        let undo = position.apply(mv).expect("move should apply");
        assert_eq!(position.fullmove_number, u16::MAX);
        position.revert(undo);
        assert_eq!(position, before);
    }

    #[test]
    fn knight_shuffle_is_detected_as_repetition() {
        let mut position = Position::new_game();
        play_line(&mut position, &["g1f3", "g8f6", "f3g1"]);
        assert!(!position.is_repetition());
        play_line(&mut position, &["f6g8"]);
        assert!(position.is_repetition());
    }

    #[test]
    fn insufficient_material_detection() {
        let bare = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        assert!(bare.has_insufficient_material());
        let minor = Position::from_fen("4k3/8/8/8/8/8/8/4KN2 w - - 0 1").expect("FEN should parse");
        assert!(minor.has_insufficient_material());
        let rook = Position::from_fen("4k3/8/8/8/8/8/8/4KR2 w - - 0 1").expect("FEN should parse");
        assert!(!rook.has_insufficient_material());
    }

    #[test]
    fn check_detection_for_both_colors() {
        let position =
            Position::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").expect("FEN should parse");
        assert!(position.is_in_check(Color::White));
        assert!(!position.is_in_check(Color::Black));
    }
}
