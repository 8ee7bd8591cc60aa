//! Crate root module declarations for the Plum Search engine.
//!
//! Exposes the board model, move generation, search core, engine control
//! layer and UCI front-end so the binary, tests and benches can import
//! stable module paths.

pub mod errors;

pub mod game_state {
    pub mod chess_rules;
    pub mod chess_types;
    pub mod position;
    pub mod undo_state;
    pub mod zobrist;
}

pub mod moves {
    pub mod attack_tables;
    pub mod move_descriptions;
}

pub mod move_generation {
    pub mod legal_move_checks;
    pub mod legal_moves_king;
    pub mod legal_moves_pawn;
    pub mod legal_moves_pieces;
    pub mod move_generator;
    pub mod perft;
}

pub mod search {
    pub mod board_scoring;
    pub mod iterative_deepening;
    pub mod move_ordering;
    pub mod threading;
}

pub mod engines {
    pub mod engine_driver;
    pub mod engine_messages;
    pub mod engine_options;
    pub mod search_controller;
    pub mod time_management;
}

pub mod uci {
    pub mod uci_top;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod long_algebraic;
}
