//! FEN-to-Position parser.
//!
//! Builds a fully populated position (mailbox, bitboards, rights, clocks and
//! key) and rejects snapshots that cannot come from a legal game.

use crate::errors::NotationError;
use crate::game_state::chess_types::*;
use crate::utils::algebraic::parse_square;

pub fn parse_fen(fen: &str) -> Result<Position, NotationError> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or(NotationError::MissingFenField("board"))?;
    let side_part = parts.next().ok_or(NotationError::MissingFenField("side to move"))?;
    let castling_part = parts.next().ok_or(NotationError::MissingFenField("castling"))?;
    let en_passant_part = parts.next().ok_or(NotationError::MissingFenField("en passant"))?;

    // Counters are optional; plenty of tools emit four-field FEN.
    let halfmove_part = parts.next().unwrap_or("0");
    let fullmove_part = parts.next().unwrap_or("1");

    if parts.next().is_some() {
        return Err(NotationError::TrailingFenFields);
    }

    let mut position = Position::new_empty();

    parse_board(board_part, &mut position)?;
    position.side_to_move = parse_side_to_move(side_part)?;
    position.castling_rights = parse_castling_rights(castling_part)?;
    position.en_passant_square = parse_en_passant_square(en_passant_part)?;
    position.halfmove_clock = halfmove_part
        .parse::<u16>()
        .map_err(|_| NotationError::InvalidCounter(halfmove_part.to_owned()))?;
    position.fullmove_number = fullmove_part
        .parse::<u16>()
        .map_err(|_| NotationError::InvalidCounter(fullmove_part.to_owned()))?
        .max(1);

    position.reset_key();
    validate(&mut position)?;

    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), NotationError> {
    let invalid = |why: &str| NotationError::InvalidBoard(format!("{why}: {board_part}"));

    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid("board layout must contain 8 ranks"));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(invalid("invalid empty-square count"));
                }
                file += empty_count as u8;
                if file > 8 {
                    return Err(invalid("rank has too many files"));
                }
                continue;
            }

            let piece = Piece::from_fen_char(ch).ok_or_else(|| invalid("invalid piece character"))?;
            if file >= 8 {
                return Err(invalid("rank has too many files"));
            }

            position.put_piece(piece, make_square(file, board_rank));
            file += 1;
        }

        if file != 8 {
            return Err(invalid("rank does not sum to 8 files"));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, NotationError> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(NotationError::InvalidSideToMove(side_part.to_owned())),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, NotationError> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        rights |= match ch {
            'K' => CASTLE_WHITE_KINGSIDE,
            'Q' => CASTLE_WHITE_QUEENSIDE,
            'k' => CASTLE_BLACK_KINGSIDE,
            'q' => CASTLE_BLACK_QUEENSIDE,
            _ => return Err(NotationError::InvalidCastling(castling_part.to_owned())),
        };
    }

    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> Result<Option<Square>, NotationError> {
    if en_passant_part == "-" {
        return Ok(None);
    }
    parse_square(en_passant_part).map(Some)
}

/// Rejects layouts no legal game can reach and drops stale rights.
fn validate(position: &mut Position) -> Result<(), NotationError> {
    let illegal = |why: &str| NotationError::IllegalPosition(why.to_owned());

    for color in Color::ALL {
        if position.pieces[color.index()][PieceKind::King.index()].count_ones() != 1 {
            return Err(illegal("each side needs exactly one king"));
        }
    }

    const BACK_RANKS: u64 = 0xFF00_0000_0000_00FF;
    let pawns = position.pieces[Color::White.index()][PieceKind::Pawn.index()]
        | position.pieces[Color::Black.index()][PieceKind::Pawn.index()];
    if pawns & BACK_RANKS != 0 {
        return Err(illegal("pawn on a back rank"));
    }

    if position.is_in_check(position.side_to_move.opposite()) {
        return Err(illegal("side not to move is in check"));
    }

    if let Some(ep) = position.en_passant_square {
        let us = position.side_to_move;
        let pushed_pawn = Piece::new(PieceKind::Pawn, us.opposite());
        let pushed_pawn_square = match (us, square_rank(ep)) {
            (Color::White, 5) => Some(ep - 8),
            (Color::Black, 2) => Some(ep + 8),
            _ => None,
        };
        let follows_double_push = pushed_pawn_square.is_some_and(|sq| {
            position.piece_at(ep).is_none() && position.piece_at(sq) == Some(pushed_pawn)
        });
        if !follows_double_push {
            return Err(illegal("en-passant square does not follow a double push"));
        }
    }

    // Rights whose king or rook has left its home square cannot be used.
    let rook = |color| Some(Piece::new(PieceKind::Rook, color));
    let king = |color| Some(Piece::new(PieceKind::King, color));
    let homes = [
        (CASTLE_WHITE_KINGSIDE, E1, H1, Color::White),
        (CASTLE_WHITE_QUEENSIDE, E1, A1, Color::White),
        (CASTLE_BLACK_KINGSIDE, E8, H8, Color::Black),
        (CASTLE_BLACK_QUEENSIDE, E8, A8, Color::Black),
    ];
    let mut rights = position.castling_rights;
    for (flag, king_home, rook_home, color) in homes {
        if position.piece_at(king_home) != king(color) || position.piece_at(rook_home) != rook(color)
        {
            rights &= !flag;
        }
    }
    if rights != position.castling_rights {
        position.castling_rights = rights;
        position.reset_key();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_fen;
    use crate::errors::NotationError;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::*;

    #[test]
    fn parse_starting_fen() {
        let position = parse_fen(STARTING_POSITION_FEN).expect("starting FEN should parse");

        assert_eq!(position.side_to_move, Color::White);
        assert_eq!(position.castling_rights, CASTLE_ALL);
        assert_eq!(position.fullmove_number, 1);
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.occupancy_all.count_ones(), 32);
        assert_eq!(position.piece_at(E1), Some(Piece::new(PieceKind::King, Color::White)));
        position.check_consistency().expect("parsed position should be consistent");
    }

    #[test]
    fn counters_default_when_omitted() {
        let position = parse_fen("4k3/8/8/8/8/8/8/4K3 b - -").expect("four-field FEN should parse");
        assert_eq!(position.side_to_move, Color::Black);
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.fullmove_number, 1);
    }

    #[test]
    fn malformed_fields_are_reported() {
        assert_eq!(parse_fen(""), Err(NotationError::MissingFenField("board")));
        assert!(matches!(
            parse_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(NotationError::InvalidBoard(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(NotationError::InvalidSideToMove(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w X - 0 1"),
            Err(NotationError::InvalidCastling(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - - zero 1"),
            Err(NotationError::InvalidCounter(_))
        ));
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra"),
            Err(NotationError::TrailingFenFields)
        );
    }

    #[test]
    fn unreachable_positions_are_rejected() {
        let cases = [
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KK2 w - - 0 1",
            "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K2r b - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e6 0 1",
        ];
        for fen in cases {
            assert!(
                matches!(parse_fen(fen), Err(NotationError::IllegalPosition(_))),
                "{fen} should be rejected"
            );
        }
    }

    #[test]
    fn stale_castling_rights_are_dropped() {
        let position =
            parse_fen("4k3/8/8/8/8/8/8/4K2R w KQ - 0 1").expect("FEN should parse");
        assert_eq!(position.castling_rights, CASTLE_WHITE_KINGSIDE);
    }
}
