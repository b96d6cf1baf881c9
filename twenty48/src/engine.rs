//! Core game engine for 2048.
//!
//! This module defines the game's fundamental components:
//! - `Direction`: The four moves a player can make.
//! - `Board`: The N x N grid of tile values, with the slide/merge mechanics,
//!   random tile spawning, and terminal-state detection.
//! - `Game`: Manages a game session, including the board, score, the `won` and
//!   `game_over` flags, and the random source used to spawn tiles.
use derive_more::{Display, Error};
use log::{debug, info, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

/// Board size used by the standard game.
pub const DEFAULT_BOARD_SIZE: usize = 4;

/// Smallest board size the engine supports.
pub const MIN_BOARD_SIZE: usize = 2;

/// Tile value that wins the game.
pub const WIN_TILE: u32 = 2048;

/// Largest tile a `u32` cell can hold. Two of these never merge.
pub const MAX_TILE: u32 = 1 << 31;

/// Probability that a spawned tile is a 4 instead of a 2.
pub const FOUR_TILE_PROBABILITY: f64 = 0.1;

/// A direction in which all tiles are pushed.
///
/// The discriminants follow the numeric codes used by front ends
/// (0 = up, 1 = right, 2 = down, 3 = left).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Push tiles toward row 0.
    Up = 0,
    /// Push tiles toward the last column.
    Right = 1,
    /// Push tiles toward the last row.
    Down = 2,
    /// Push tiles toward column 0.
    Left = 3,
}

impl Direction {
    /// All four directions, in code order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    fn toward_low_index(self) -> bool {
        matches!(self, Direction::Up | Direction::Left)
    }

    /// Returns a lowercase name, e.g. `"left"`.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a direction code or name cannot be converted to a [`Direction`].
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum InvalidDirection {
    /// A numeric code outside `0..=3`.
    #[display("direction code {code} is out of range (expected 0..=3)")]
    Code { code: u8 },
    /// A name that is neither a direction word nor one of `w`, `a`, `s`, `d`.
    #[display("unknown direction {name:?}")]
    Name { name: String },
}

impl TryFrom<u8> for Direction {
    type Error = InvalidDirection;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            _ => Err(InvalidDirection::Code { code }),
        }
    }
}

impl FromStr for Direction {
    type Err = InvalidDirection;

    /// Parses `up`/`right`/`down`/`left` (any case) or the keys `w`/`d`/`s`/`a`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" | "w" => Ok(Direction::Up),
            "right" | "r" | "d" => Ok(Direction::Right),
            "down" | "s" => Ok(Direction::Down),
            "left" | "l" | "a" => Ok(Direction::Left),
            _ => Err(InvalidDirection::Name {
                name: s.to_string(),
            }),
        }
    }
}

/// Error returned when a grid of values does not form a valid [`Board`].
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// The board has fewer than [`MIN_BOARD_SIZE`] rows.
    #[display("board size {size} is too small")]
    TooSmall { size: usize },
    /// A row's length differs from the number of rows.
    #[display("row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    /// A non-zero cell holds a value that is not a power of two of at least 2.
    #[display("cell ({row}, {col}) holds {value}, which is not a tile value")]
    InvalidTile { row: usize, col: usize, value: u32 },
}

/// Returns `true` for 0 (empty) and for powers of two from 2 up to [`MAX_TILE`].
pub fn is_valid_tile(value: u32) -> bool {
    value == 0 || (value >= 2 && value.is_power_of_two())
}

fn generate_random_tile_value(rng: &mut (impl Rng + ?Sized)) -> u32 {
    if rng.gen_bool(1.0 - FOUR_TILE_PROBABILITY) {
        2
    } else {
        4
    }
}

/// Slides and merges one line toward index 0.
///
/// Zeros are removed, then equal neighbours are merged in a single pass from
/// the front (a merged tile never merges again in the same pass), and the
/// result is compacted again and padded with zeros at the back. Tiles at
/// [`MAX_TILE`] are left as they are.
///
/// # Returns
/// The sum of the values of all tiles created by merges.
///
/// # Examples
/// ```
/// use twenty48::engine::slide_line;
/// let mut line = [2u32, 2, 2, 2];
/// assert_eq!(slide_line(&mut line), 8);
/// assert_eq!(line, [4, 4, 0, 0]);
/// ```
pub fn slide_line(line: &mut [u32]) -> u64 {
    let mut tiles: Vec<u32> = line.iter().copied().filter(|&v| v != 0).collect();
    let mut gained = 0;

    let mut p = 0;
    while p + 1 < tiles.len() {
        if tiles[p] == tiles[p + 1] && tiles[p] < MAX_TILE {
            tiles[p] *= 2;
            gained += u64::from(tiles[p]);
            tiles[p + 1] = 0;
            p += 2;
        } else {
            p += 1;
        }
    }

    tiles.retain(|&v| v != 0);
    tiles.resize(line.len(), 0);
    line.copy_from_slice(&tiles);
    gained
}

/// The game board: a square grid of tile values stored in row-major order.
///
/// A cell holds 0 when empty, otherwise a power of two of at least 2.
/// The size is fixed when the board is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<u32>,
}

impl Board {
    /// Creates an empty `size` x `size` board.
    ///
    /// # Panics
    /// Panics if `size` is smaller than [`MIN_BOARD_SIZE`].
    ///
    /// # Examples
    /// ```
    /// use twenty48::engine::Board;
    /// let board = Board::new_empty(4);
    /// assert_eq!(board.get_tile(0, 0), 0);
    /// assert_eq!(board.empty_cells().len(), 16);
    /// ```
    pub fn new_empty(size: usize) -> Self {
        assert!(
            size >= MIN_BOARD_SIZE,
            "board size {size} is below the minimum of {MIN_BOARD_SIZE}"
        );
        Board {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Creates a board from rows of tile values.
    ///
    /// # Errors
    /// Returns a [`BoardError`] if there are fewer than [`MIN_BOARD_SIZE`] rows,
    /// if any row length differs from the row count, or if a cell is neither 0
    /// nor a power of two of at least 2.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, BoardError> {
        let size = rows.len();
        if size < MIN_BOARD_SIZE {
            return Err(BoardError::TooSmall { size });
        }

        let mut cells = Vec::with_capacity(size * size);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            for (col, &value) in values.iter().enumerate() {
                if !is_valid_tile(value) {
                    return Err(BoardError::InvalidTile { row, col, value });
                }
                cells.push(value);
            }
        }
        Ok(Board { size, cells })
    }

    /// Returns the number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the tile value at row `r`, column `c` (0 when empty).
    ///
    /// # Panics
    /// Panics if `r` or `c` is outside the board.
    pub fn get_tile(&self, r: usize, c: usize) -> u32 {
        assert!(r < self.size && c < self.size, "({r}, {c}) is outside the board");
        self.cells[r * self.size + c]
    }

    /// Sets the tile value at row `r`, column `c`.
    ///
    /// # Panics
    /// Panics if `r` or `c` is outside the board, or if `value` is not a valid
    /// tile value (see [`is_valid_tile`]).
    pub fn set_tile(&mut self, r: usize, c: usize, value: u32) {
        assert!(r < self.size && c < self.size, "({r}, {c}) is outside the board");
        assert!(is_valid_tile(value), "{value} is not a tile value");
        self.cells[r * self.size + c] = value;
    }

    /// Iterates over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.cells.chunks(self.size)
    }

    /// Returns the coordinates of all empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| (i / self.size, i % self.size))
            .collect()
    }

    /// Returns `true` if at least one cell is empty.
    pub fn has_empty_cell(&self) -> bool {
        self.cells.contains(&0)
    }

    /// Returns the largest tile on the board (0 for an empty board).
    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Returns `true` if some cell holds exactly `value`.
    pub fn contains_tile(&self, value: u32) -> bool {
        self.cells.contains(&value)
    }

    /// Returns `true` if two horizontally or vertically adjacent cells are equal
    /// and could merge, i.e. hold less than [`MAX_TILE`].
    ///
    /// Empty cells count too; callers interested only in tiles should check
    /// [`Board::has_empty_cell`] first.
    pub fn has_adjacent_pair(&self) -> bool {
        let n = self.size;
        for r in 0..n {
            for c in 0..n {
                let v = self.cells[r * n + c];
                if v == MAX_TILE {
                    continue;
                }
                if c + 1 < n && self.cells[r * n + c + 1] == v {
                    return true;
                }
                if r + 1 < n && self.cells[(r + 1) * n + c] == v {
                    return true;
                }
            }
        }
        false
    }

    /// Returns `true` if no move in any direction can change the board:
    /// every cell is filled and no two adjacent cells are equal.
    pub fn is_terminal(&self) -> bool {
        !self.has_empty_cell() && !self.has_adjacent_pair()
    }

    // Cell indices of line `i` for `direction`, ordered from the edge tiles move toward.
    fn line_indices(&self, direction: Direction, i: usize) -> Vec<usize> {
        let n = self.size;
        (0..n)
            .map(|k| {
                let k = if direction.toward_low_index() {
                    k
                } else {
                    n - 1 - k
                };
                if direction.is_vertical() {
                    k * n + i
                } else {
                    i * n + k
                }
            })
            .collect()
    }

    /// Slides every row (`Left`/`Right`) or column (`Up`/`Down`) toward `direction`,
    /// merging equal neighbours as described in [`slide_line`].
    ///
    /// No tile is spawned.
    ///
    /// # Returns
    /// The score gained from merges.
    pub fn slide(&mut self, direction: Direction) -> u64 {
        let mut gained = 0;
        let mut line = vec![0u32; self.size];
        for i in 0..self.size {
            let indices = self.line_indices(direction, i);
            for (slot, &idx) in line.iter_mut().zip(&indices) {
                *slot = self.cells[idx];
            }
            gained += slide_line(&mut line);
            for (&value, &idx) in line.iter().zip(&indices) {
                self.cells[idx] = value;
            }
        }
        gained
    }

    /// Returns the board after sliding toward `direction`, with the score gained,
    /// leaving `self` untouched.
    pub fn preview(&self, direction: Direction) -> (Board, u64) {
        let mut next = self.clone();
        let gained = next.slide(direction);
        (next, gained)
    }

    /// Returns `true` if sliding toward `direction` would change the board.
    pub fn can_move(&self, direction: Direction) -> bool {
        self.preview(direction).0 != *self
    }

    /// Returns every direction that would change the board, in code order.
    pub fn legal_moves(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&d| self.can_move(d))
            .collect()
    }

    /// Places a 2 (probability 0.9) or a 4 (probability 0.1) into an empty
    /// cell chosen uniformly at random.
    ///
    /// # Returns
    /// The `(row, col)` of the new tile, or `None` if the board is full.
    pub fn spawn_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, usize)> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }
        let (r, c) = empty[rng.gen_range(0..empty.len())];
        let value = generate_random_tile_value(rng);
        self.cells[r * self.size + c] = value;
        Some((r, c))
    }
}

impl fmt::Display for Board {
    /// Formats the board as right-aligned columns, with `.` for empty cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.max_tile().max(1).to_string().len();
        for (r, row) in self.rows().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, &value) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(" ")?;
                }
                if value == 0 {
                    write!(f, "{:>width$}", ".")?;
                } else {
                    write!(f, "{value:>width$}")?;
                }
            }
        }
        Ok(())
    }
}

/// The result of [`Game::make_move`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether the move changed the board. A move that changes nothing is a no-op:
    /// no tile is spawned and the score is unchanged.
    pub moved: bool,
    /// Where the new tile was spawned, if any.
    pub spawned: Option<(usize, usize)>,
    /// Score gained from merges during this move.
    pub score_gained: u64,
}

/// Manages the state and progression of a 2048 game session.
///
/// The game owns its board, its score, the `game_over` and `won` flags, and
/// the random generator used to spawn tiles. The generator is a type parameter
/// so that tests and simulations can pin every spawn.
///
/// `won` is an edge trigger: after a move that changes the board, it becomes
/// `true` if a [`WIN_TILE`] is on the board, and stays `true` until the caller
/// clears it with [`Game::clear_won`] or [`Game::take_won`]. The engine never
/// clears it, so a caller that has cleared it sees it raised again on the next
/// move while the tile remains. It never blocks further play.
///
/// # Examples
/// ```
/// use twenty48::engine::{Direction, Game};
/// let mut game = Game::with_seed(4, 42);
/// assert_eq!(game.score(), 0);
/// assert_eq!(game.board().empty_cells().len(), 14);
///
/// let outcome = game.make_move(Direction::Left);
/// if outcome.moved {
///     assert!(outcome.spawned.is_some());
/// }
/// if game.take_won() {
///     println!("You reached 2048!");
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Game<R = SmallRng> {
    board: Board,
    score: u64,
    moves: u32,
    game_over: bool,
    won: bool,
    rng: R,
}

impl Game<SmallRng> {
    /// Creates a game on a `size` x `size` board with an entropy-seeded generator.
    ///
    /// # Panics
    /// Panics if `size` is smaller than [`MIN_BOARD_SIZE`].
    pub fn new(size: usize) -> Self {
        Self::with_rng(size, SmallRng::from_entropy())
    }

    /// Creates a game whose spawns are fully determined by `seed`.
    ///
    /// # Panics
    /// Panics if `size` is smaller than [`MIN_BOARD_SIZE`].
    pub fn with_seed(size: usize, seed: u64) -> Self {
        Self::with_rng(size, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Creates a game using `rng` for every spawn. The board starts with two
    /// random tiles and the score at 0.
    ///
    /// # Panics
    /// Panics if `size` is smaller than [`MIN_BOARD_SIZE`].
    pub fn with_rng(size: usize, rng: R) -> Self {
        let mut game = Game {
            board: Board::new_empty(size),
            score: 0,
            moves: 0,
            game_over: false,
            won: false,
            rng,
        };
        game.reset();
        game
    }

    /// Creates a game that starts from `board` as-is (no tiles are spawned).
    ///
    /// The score starts at 0 and `game_over` reflects the given board. `won`
    /// starts `false`; a [`WIN_TILE`] already on the board raises it on the
    /// first move that changes the board.
    pub fn with_board(board: Board, rng: R) -> Self {
        let game_over = board.is_terminal();
        Game {
            board,
            score: 0,
            moves: 0,
            game_over,
            won: false,
            rng,
        }
    }

    /// Discards the board, score and flags, then spawns two fresh tiles.
    pub fn reset(&mut self) {
        self.board = Board::new_empty(self.board.size());
        self.score = 0;
        self.moves = 0;
        self.game_over = false;
        self.won = false;
        self.spawn_tile();
        self.spawn_tile();
        debug!("new {n}x{n} game", n = self.board.size());
    }

    /// Spawns a random tile into an empty cell.
    ///
    /// # Returns
    /// The position of the new tile, or `None` if the board has no empty cell.
    pub fn spawn_tile(&mut self) -> Option<(usize, usize)> {
        let spawned = self.board.spawn_random_tile(&mut self.rng);
        match spawned {
            Some((r, c)) => debug!("spawned {} at ({r}, {c})", self.board.get_tile(r, c)),
            None => debug!("no empty cell to spawn into"),
        }
        spawned
    }

    /// Pushes all tiles toward `direction`, merging equal neighbours.
    ///
    /// If the board changed, a new tile is spawned, the `won` flag is raised
    /// when it is clear and a [`WIN_TILE`] is on the board, and `game_over` is
    /// recomputed.
    /// If the board did not change, nothing else happens.
    ///
    /// # Examples
    /// ```
    /// use rand::rngs::mock::StepRng;
    /// use twenty48::engine::{Board, Direction, Game};
    ///
    /// let board = Board::from_rows(&[[2u32, 2], [0, 0]]).unwrap();
    /// let mut game = Game::with_board(board, StepRng::new(0, 0));
    /// let outcome = game.make_move(Direction::Left);
    /// assert!(outcome.moved);
    /// assert_eq!(outcome.score_gained, 4);
    /// assert_eq!(game.board().get_tile(0, 0), 4);
    /// ```
    pub fn make_move(&mut self, direction: Direction) -> MoveOutcome {
        let before = self.board.clone();
        let score_gained = self.board.slide(direction);

        if self.board == before {
            trace!("{direction}: no change");
            return MoveOutcome {
                moved: false,
                spawned: None,
                score_gained: 0,
            };
        }

        self.score += score_gained;
        self.moves += 1;
        trace!("{direction}: +{score_gained} (score {})", self.score);

        let spawned = self.spawn_tile();

        if !self.won && self.board.contains_tile(WIN_TILE) {
            self.won = true;
            info!("{WIN_TILE} on the board after {} moves", self.moves);
        }

        self.game_over = self.board.is_terminal();
        if self.game_over {
            info!(
                "game over after {} moves, score {}, best tile {}",
                self.moves,
                self.score,
                self.board.max_tile()
            );
        }

        MoveOutcome {
            moved: true,
            spawned,
            score_gained,
        }
    }
}

impl<R> Game<R> {
    /// Returns the current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the board size.
    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// Returns the score accumulated from merges.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Returns the number of moves that changed the board.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Returns `true` once the board is full and no adjacent tiles are equal.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Returns the `won` edge trigger.
    pub fn has_won(&self) -> bool {
        self.won
    }

    /// Clears the `won` edge trigger after the caller has acted on it.
    pub fn clear_won(&mut self) {
        self.won = false;
    }

    /// Returns the `won` edge trigger and clears it.
    pub fn take_won(&mut self) -> bool {
        std::mem::take(&mut self.won)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_str_array;
    use rand::rngs::mock::StepRng;

    // Always picks the first empty cell and spawns a 2.
    fn first_cell_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    fn game_from(rows: &[&str]) -> Game<StepRng> {
        Game::with_board(board_from_str_array(rows).unwrap(), first_cell_rng())
    }

    fn row_of(board: &Board, r: usize) -> Vec<u32> {
        board.rows().nth(r).unwrap().to_vec()
    }

    #[test]
    fn test_slide_line_merges_each_tile_once() {
        let mut line = [2u32, 2, 2, 2];
        assert_eq!(slide_line(&mut line), 8);
        assert_eq!(line, [4, 4, 0, 0]);

        let mut line = [4u32, 4, 8, 8];
        assert_eq!(slide_line(&mut line), 24);
        assert_eq!(line, [8, 16, 0, 0]);

        let mut line = [2u32, 2, 4, 0];
        assert_eq!(slide_line(&mut line), 4);
        assert_eq!(line, [4, 4, 0, 0]);
    }

    #[test]
    fn test_slide_line_merges_across_gaps() {
        let mut line = [2u32, 0, 2, 4];
        assert_eq!(slide_line(&mut line), 4);
        assert_eq!(line, [4, 4, 0, 0]);

        let mut line = [0u32, 0, 0, 8];
        assert_eq!(slide_line(&mut line), 0);
        assert_eq!(line, [8, 0, 0, 0]);
    }

    #[test]
    fn test_slide_line_without_merges() {
        let mut line = [2u32, 4, 2, 0];
        assert_eq!(slide_line(&mut line), 0);
        assert_eq!(line, [2, 4, 2, 0]);

        let mut line = [0u32; 5];
        assert_eq!(slide_line(&mut line), 0);
        assert_eq!(line, [0; 5]);
    }

    #[test]
    fn test_slide_line_leaves_max_tiles_unmerged() {
        let mut line = [MAX_TILE, MAX_TILE];
        assert_eq!(slide_line(&mut line), 0);
        assert_eq!(line, [MAX_TILE, MAX_TILE]);

        let half = MAX_TILE / 2;
        let mut line = [half, half, MAX_TILE];
        assert_eq!(slide_line(&mut line), u64::from(MAX_TILE));
        assert_eq!(line, [MAX_TILE, MAX_TILE, 0]);
        assert!(line.iter().all(|&v| is_valid_tile(v)));
    }

    #[test]
    fn test_board_of_max_tiles_is_terminal() {
        let board = Board::from_rows(&[[MAX_TILE, MAX_TILE], [2, 4]]).unwrap();
        assert!(board.is_terminal());
        assert!(board.legal_moves().is_empty());

        let mut game = Game::with_board(board.clone(), first_cell_rng());
        assert!(game.is_game_over());
        for direction in Direction::ALL {
            assert!(!game.make_move(direction).moved);
        }
        assert_eq!(game.board(), &board);
    }

    #[test]
    fn test_slide_right_merges_from_the_right_end() {
        let mut board = board_from_str_array(&[
            "2 2 2 .", //
            ". . . .",
            ". . . .",
            ". . . .",
        ])
        .unwrap();
        assert_eq!(board.slide(Direction::Right), 4);
        assert_eq!(row_of(&board, 0), vec![0, 0, 2, 4]);
    }

    #[test]
    fn test_slide_columns() {
        let board = board_from_str_array(&[
            "2 . 4 .", //
            "2 . . .",
            "4 . 4 .",
            "4 8 2 .",
        ])
        .unwrap();

        let (up, gained) = board.preview(Direction::Up);
        assert_eq!(gained, 4 + 8 + 8);
        assert_eq!(
            up,
            board_from_str_array(&[
                "4 8 8 .", //
                "8 . 2 .",
                ". . . .",
                ". . . .",
            ])
            .unwrap()
        );

        let (down, gained) = board.preview(Direction::Down);
        assert_eq!(gained, 4 + 8 + 8);
        assert_eq!(
            down,
            board_from_str_array(&[
                ". . . .", //
                ". . . .",
                "4 . 8 .",
                "8 8 2 .",
            ])
            .unwrap()
        );
    }

    #[test]
    fn test_preview_leaves_board_untouched() {
        let board = board_from_str_array(&["2 2", ". ."]).unwrap();
        let (next, gained) = board.preview(Direction::Left);
        assert_eq!(gained, 4);
        assert_eq!(next.get_tile(0, 0), 4);
        assert_eq!(board.get_tile(0, 0), 2);
        assert_eq!(board.get_tile(0, 1), 2);
    }

    #[test]
    fn test_move_left_merges_and_spawns() {
        let mut game = game_from(&[
            "2 2 . .", //
            ". . . .",
            ". . . .",
            ". . . .",
        ]);
        let outcome = game.make_move(Direction::Left);
        assert!(outcome.moved);
        assert_eq!(outcome.score_gained, 4);
        assert_eq!(game.score(), 4);
        assert_eq!(game.moves(), 1);
        // First empty cell in row-major order after the merge.
        assert_eq!(outcome.spawned, Some((0, 1)));
        assert_eq!(row_of(game.board(), 0), vec![4, 2, 0, 0]);
    }

    #[test]
    fn test_move_right_without_merge() {
        let mut game = game_from(&[
            "8 . . 2", //
            ". . . .",
            ". . . .",
            ". . . .",
        ]);
        let outcome = game.make_move(Direction::Right);
        assert!(outcome.moved);
        assert_eq!(outcome.score_gained, 0);
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().get_tile(0, 2), 8);
        assert_eq!(game.board().get_tile(0, 3), 2);
        assert_eq!(game.board().get_tile(0, 1), 0);
    }

    #[test]
    fn test_move_that_changes_nothing_is_a_no_op() {
        let mut game = game_from(&[
            "2 4 2 .", //
            ". . . .",
            ". . . .",
            ". . . .",
        ]);
        let before = game.board().clone();
        let outcome = game.make_move(Direction::Left);
        assert_eq!(
            outcome,
            MoveOutcome {
                moved: false,
                spawned: None,
                score_gained: 0,
            }
        );
        assert_eq!(game.board(), &before);
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_terminal_detection() {
        let stuck = board_from_str_array(&[
            "2 4 2 4", //
            "4 2 4 2",
            "2 4 2 4",
            "4 2 4 2",
        ])
        .unwrap();
        assert!(stuck.is_terminal());
        assert!(stuck.legal_moves().is_empty());

        let horizontal_pair = board_from_str_array(&[
            "2 2 8 4", //
            "4 8 4 2",
            "2 4 2 4",
            "4 2 4 2",
        ])
        .unwrap();
        assert!(!horizontal_pair.is_terminal());
        assert_eq!(
            horizontal_pair.legal_moves(),
            vec![Direction::Right, Direction::Left]
        );

        let vertical_pair = board_from_str_array(&[
            "2 4 2 4", //
            "2 8 4 2",
            "8 4 2 4",
            "4 2 4 2",
        ])
        .unwrap();
        assert!(!vertical_pair.is_terminal());

        let with_gap = board_from_str_array(&[
            "2 4 2 4", //
            "4 2 4 2",
            "2 4 . 4",
            "4 2 4 2",
        ])
        .unwrap();
        assert!(!with_gap.is_terminal());
    }

    #[test]
    fn test_move_into_terminal_state_sets_game_over() {
        let mut game = game_from(&["4 2", "8 ."]);
        assert!(!game.is_game_over());

        let outcome = game.make_move(Direction::Right);
        assert!(outcome.moved);
        assert_eq!(outcome.spawned, Some((1, 0)));
        assert_eq!(row_of(game.board(), 1), vec![2, 8]);
        assert!(game.is_game_over());

        for direction in Direction::ALL {
            assert!(!game.make_move(direction).moved);
        }
        assert!(game.is_game_over());
    }

    #[test]
    fn test_won_is_raised_again_after_caller_clears_it() {
        let mut game = game_from(&[
            "1024 1024 . .", //
            "2 . . .",
            ". . . .",
            ". . . .",
        ]);
        assert!(!game.has_won());

        assert!(game.make_move(Direction::Left).moved);
        assert_eq!(game.board().get_tile(0, 0), WIN_TILE);
        assert!(game.has_won());
        // Not cleared by the engine.
        assert!(game.make_move(Direction::Right).moved);
        assert!(game.has_won());

        assert!(game.take_won());
        assert!(!game.has_won());

        // The 2048 tile is still on the board, so the next move raises it again.
        assert!(game.make_move(Direction::Left).moved);
        assert!(game.board().contains_tile(WIN_TILE));
        assert!(game.has_won());

        game.clear_won();
        assert!(!game.has_won());
        assert!(!game.take_won());
    }

    #[test]
    fn test_win_tile_on_starting_board_raises_won_on_next_move() {
        let mut game = game_from(&[
            "2048 . . .", //
            ". . . .",
            ". . . .",
            ". . . .",
        ]);
        assert!(!game.has_won());

        // A move that changes nothing does not touch the flag.
        assert!(!game.make_move(Direction::Left).moved);
        assert!(!game.has_won());

        assert!(game.make_move(Direction::Right).moved);
        assert_eq!(game.board().get_tile(0, 3), WIN_TILE);
        assert!(game.has_won());
    }

    #[test]
    fn test_won_fires_again_after_win_tile_is_merged_away() {
        let mut game = game_from(&[
            "2048 2048 . .", //
            "1024 512 512 .",
            ". . . .",
            ". . . .",
        ]);

        assert!(game.make_move(Direction::Left).moved);
        assert_eq!(game.board().get_tile(0, 0), 4096);
        assert!(!game.board().contains_tile(WIN_TILE));
        assert!(!game.has_won());

        assert!(game.make_move(Direction::Left).moved);
        assert_eq!(game.board().get_tile(1, 0), WIN_TILE);
        assert!(game.has_won());
    }

    #[test]
    fn test_new_game_has_two_tiles() {
        let game = Game::with_seed(DEFAULT_BOARD_SIZE, 7);
        let tiles: Vec<u32> = game
            .board()
            .rows()
            .flatten()
            .copied()
            .filter(|&v| v != 0)
            .collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|&v| v == 2 || v == 4));
        assert_eq!(game.score(), 0);
        assert!(!game.is_game_over());
        assert!(!game.has_won());
    }

    #[test]
    fn test_with_rng_spawns_first_two_cells() {
        let game = Game::with_rng(3, first_cell_rng());
        assert_eq!(row_of(game.board(), 0), vec![2, 2, 0]);
        assert_eq!(game.board().empty_cells().len(), 7);
    }

    #[test]
    fn test_seeded_games_are_deterministic() {
        let mut a = Game::with_seed(4, 2024);
        let mut b = Game::with_seed(4, 2024);
        assert_eq!(a.board(), b.board());
        for direction in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
            assert_eq!(a.make_move(direction), b.make_move(direction));
            assert_eq!(a.board(), b.board());
        }
        assert_eq!(a.score(), b.score());
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut game = game_from(&[
            "1024 1024 . .", //
            ". . . .",
            ". . . .",
            ". . . .",
        ]);
        game.make_move(Direction::Left);
        assert!(game.score() > 0);
        assert!(game.has_won());

        game.reset();
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 0);
        assert!(!game.has_won());
        assert!(!game.is_game_over());
        assert_eq!(game.size(), 4);
        assert_eq!(game.board().empty_cells().len(), 14);
    }

    #[test]
    fn test_spawn_on_full_board_returns_none() {
        let mut game = game_from(&["2 4", "4 2"]);
        let before = game.board().clone();
        assert_eq!(game.spawn_tile(), None);
        assert_eq!(game.board(), &before);
    }

    #[test]
    fn test_spawn_distribution() {
        let mut rng = SmallRng::seed_from_u64(514514);
        let trials = 20_000;
        let mut fours = 0;
        let mut hits = [[0u32; 4]; 4];

        for _ in 0..trials {
            let mut board = Board::new_empty(4);
            let (r, c) = board.spawn_random_tile(&mut rng).unwrap();
            hits[r][c] += 1;
            match board.get_tile(r, c) {
                2 => {}
                4 => fours += 1,
                other => panic!("spawned {other}"),
            }
        }

        let ratio = f64::from(fours) / f64::from(trials);
        assert!((0.08..0.12).contains(&ratio), "ratio of fours was {ratio}");
        for row in hits {
            for count in row {
                // Expected 1250 per cell.
                assert!((1000..1500).contains(&count), "cell hit {count} times");
            }
        }
    }

    #[test]
    fn test_spawn_only_targets_empty_cells() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            let mut board = board_from_str_array(&[
                "2 . 4 .", //
                "8 16 . 2",
                ". 4 4 2",
                "2 2 2 .",
            ])
            .unwrap();
            let empty_before = board.empty_cells();
            let pos = board.spawn_random_tile(&mut rng).unwrap();
            assert!(empty_before.contains(&pos));
            assert_eq!(board.empty_cells().len(), empty_before.len() - 1);
        }
    }

    #[test]
    fn test_direction_conversions() {
        assert_eq!(Direction::try_from(0u8), Ok(Direction::Up));
        assert_eq!(Direction::try_from(1u8), Ok(Direction::Right));
        assert_eq!(Direction::try_from(2u8), Ok(Direction::Down));
        assert_eq!(Direction::try_from(3u8), Ok(Direction::Left));
        assert_eq!(
            Direction::try_from(4u8),
            Err(InvalidDirection::Code { code: 4 })
        );
        for direction in Direction::ALL {
            assert_eq!(Direction::try_from(direction as u8), Ok(direction));
            assert_eq!(direction.name().parse::<Direction>(), Ok(direction));
        }

        assert_eq!("W".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("a".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("s".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!("d".parse::<Direction>(), Ok(Direction::Right));
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    #[should_panic(expected = "below the minimum")]
    fn test_board_too_small_panics() {
        Board::new_empty(1);
    }

    #[test]
    fn test_from_rows_validation() {
        assert_eq!(
            Board::from_rows(&[[2u32]]),
            Err(BoardError::TooSmall { size: 1 })
        );
        assert_eq!(
            Board::from_rows(&[vec![2u32, 0], vec![0]]),
            Err(BoardError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            })
        );
        assert_eq!(
            Board::from_rows(&[[2u32, 3], [0, 0]]),
            Err(BoardError::InvalidTile {
                row: 0,
                col: 1,
                value: 3
            })
        );
        assert_eq!(
            Board::from_rows(&[[1u32, 0], [0, 0]]),
            Err(BoardError::InvalidTile {
                row: 0,
                col: 0,
                value: 1
            })
        );
        assert!(Board::from_rows(&[[2u32, 0], [0, 4096]]).is_ok());
        assert!(Board::from_rows(&[[MAX_TILE, 0], [0, 0]]).is_ok());
    }

    #[test]
    fn test_display_board_formatting() {
        let board = board_from_str_array(&[
            "2 . . 128", //
            ". 16 . .",
            ". . . .",
            "4 . . 2048",
        ])
        .unwrap();
        let expected = "   2    .    .  128\n\
                        \x20  .   16    .    .\n\
                        \x20  .    .    .    .\n\
                        \x20  4    .    . 2048";
        assert_eq!(board.to_string(), expected);
        assert_eq!(board.to_string().lines().count(), 4);
    }
}
