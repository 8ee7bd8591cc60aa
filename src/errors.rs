//! Error types shared across the engine.
//!
//! `NotationError` covers everything that can go wrong while reading external
//! text (FEN snapshots, coordinates, long algebraic moves, protocol lines).
//! `EngineError` is the crate-wide error and wraps notation failures together
//! with protocol-state rejections and internal invariant violations.
//!
//! A position with no legal moves is not an error; it is reported through the
//! regular best-move event with an absent move.

use thiserror::Error;

/// Failure to interpret externally supplied text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("missing FEN field: {0}")]
    MissingFenField(&'static str),

    #[error("FEN has extra trailing fields")]
    TrailingFenFields,

    #[error("invalid board layout: {0}")]
    InvalidBoard(String),

    #[error("invalid side to move: {0}")]
    InvalidSideToMove(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastling(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid move counter: {0}")]
    InvalidCounter(String),

    /// The snapshot parses but cannot arise from a legal game.
    #[error("illegal position: {0}")]
    IllegalPosition(String),

    #[error("invalid move text: {0}")]
    InvalidMoveText(String),

    /// Well-formed move text that is not legal in the given position.
    #[error("illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error("a search is already running")]
    AlreadyRunning,

    #[error("no pondering search is active")]
    NotPondering,

    /// `Position::apply` was handed a move that does not fit the board.
    #[error("move {mv} does not match the position: {reason}")]
    InvalidMove { mv: String, reason: &'static str },

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid value {value:?} for option {name}")]
    InvalidOptionValue { name: String, value: String },

    /// Position corruption or a broken apply/revert pairing. Fatal to the
    /// current search run only.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
