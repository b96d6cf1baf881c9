use crate::engine::{Board, BoardError};
use derive_more::{Display, Error};

/// Error returned by [`board_from_str_array`] and [`board_from_text`].
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum BoardParseError {
    /// A cell is neither `.` nor an unsigned integer.
    #[display("unrecognized cell {token:?} in row {row} col {col}")]
    InvalidCell {
        row: usize,
        col: usize,
        token: String,
    },
    /// The cells parsed, but they do not form a valid board.
    #[display("invalid board: {source}")]
    InvalidBoard { source: BoardError },
}

/// Parses an array of string slices into a `Board`.
///
/// Each string slice is one row, top to bottom. Cells are separated by
/// whitespace and are either `.` (empty), `0` (empty), or a tile value.
/// The number of rows determines the board size, so every row must have
/// exactly that many cells.
///
/// # Errors
/// * [`BoardParseError::InvalidCell`] if a cell is not `.` or an unsigned integer.
/// * [`BoardParseError::InvalidBoard`] if the board is too small, not square,
///   or holds a value that is not a power of two of at least 2.
///
/// # Examples
/// ```
/// use twenty48::utils::board_from_str_array;
///
/// let board = board_from_str_array(&[
///     "2 . . 4",
///     ". 8 . .",
///     ". . . .",
///     "2048 . . .",
/// ])
/// .unwrap();
/// assert_eq!(board.size(), 4);
/// assert_eq!(board.get_tile(0, 3), 4);
/// assert_eq!(board.get_tile(3, 0), 2048);
///
/// assert!(board_from_str_array(&["2 x", ". ."]).is_err());
/// assert!(board_from_str_array(&["2 3", ". ."]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, BoardParseError> {
    let mut rows = Vec::with_capacity(s.len());
    for (r, row_str) in s.iter().enumerate() {
        let mut row = Vec::new();
        for (c, token) in row_str.split_whitespace().enumerate() {
            let value = match token {
                "." => 0,
                _ => token
                    .parse::<u32>()
                    .map_err(|_| BoardParseError::InvalidCell {
                        row: r,
                        col: c,
                        token: token.to_string(),
                    })?,
            };
            row.push(value);
        }
        rows.push(row);
    }
    Board::from_rows(rows.as_slice()).map_err(|source| BoardParseError::InvalidBoard { source })
}

/// Parses a board from multi-line text, ignoring blank lines and lines
/// starting with `#`.
///
/// # Errors
/// Same as [`board_from_str_array`].
pub fn board_from_text(text: &str) -> Result<Board, BoardParseError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    board_from_str_array(&lines)
}
