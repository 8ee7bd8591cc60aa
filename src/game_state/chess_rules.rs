//! Rule constants shared by the position model and the protocol layer.

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmoves without a capture or pawn move after which the game is drawn.
pub const FIFTY_MOVE_RULE_HALFMOVES: u16 = 100;
