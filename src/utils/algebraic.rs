//! Square conversions for coordinate notation (`e4` <-> square index).

use crate::errors::NotationError;
use crate::game_state::chess_types::{make_square, square_file, square_rank, Square};

/// Parse a coordinate such as `e4` into a square index.
#[inline]
pub fn parse_square(text: &str) -> Result<Square, NotationError> {
    let invalid = || NotationError::InvalidSquare(text.to_owned());
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return Err(invalid());
    }

    let (file, rank) = (bytes[0], bytes[1]);
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(invalid());
    }

    Ok(make_square(file - b'a', rank - b'1'))
}

/// Coordinate name of a square index (`0..=63`).
#[inline]
pub fn square_name(square: Square) -> String {
    let file = char::from(b'a' + square_file(square));
    let rank = char::from(b'1' + square_rank(square));
    format!("{file}{rank}")
}

#[cfg(test)]
mod tests {
    use super::{parse_square, square_name};
    use crate::errors::NotationError;

    #[test]
    fn corner_squares_convert_both_ways() {
        assert_eq!(parse_square("a1").expect("a1 should parse"), 0);
        assert_eq!(parse_square("h8").expect("h8 should parse"), 63);
        assert_eq!(square_name(0), "a1");
        assert_eq!(square_name(28), "e4");
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        for text in ["", "e", "i1", "a9", "e44", "E4"] {
            assert_eq!(
                parse_square(text),
                Err(NotationError::InvalidSquare(text.to_owned()))
            );
        }
    }
}
