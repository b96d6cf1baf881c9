//! Move-selection strategies for self-play.
//!
//! Every strategy only ever returns a direction that changes the board, and
//! returns `None` once no such direction exists.
use crate::engine::{Board, Direction, Game};
use log::warn;
use rand::Rng;

/// Direction priority used by [`choose_move_corner`]: keep the largest tiles
/// in the bottom-left corner and only push up as a last resort.
pub const CORNER_PRIORITY: [Direction; 4] = [
    Direction::Left,
    Direction::Down,
    Direction::Right,
    Direction::Up,
];

/// Counts the empty cells on the board.
pub fn count_empty_cells(board: &Board) -> usize {
    board.rows().flatten().filter(|&&v| v == 0).count()
}

/// Chooses uniformly among the directions that change the board.
pub fn choose_move_random<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Direction> {
    let legal = board.legal_moves();
    if legal.is_empty() {
        return None;
    }
    Some(legal[rng.gen_range(0..legal.len())])
}

/// Chooses the direction with the largest immediate merge score.
///
/// Ties are broken by the number of empty cells after the slide (more is
/// better), then by direction code order.
///
/// # Returns
/// An `Option` containing the chosen direction and the score it would gain.
/// Returns `None` if no direction changes the board.
pub fn choose_move_greedy(board: &Board) -> Option<(Direction, u64)> {
    let mut best: Option<(Direction, u64, usize)> = None;

    for direction in Direction::ALL {
        let (next, gained) = board.preview(direction);
        if next == *board {
            continue;
        }
        let empty = count_empty_cells(&next);
        let better = match best {
            None => true,
            Some((_, best_gained, best_empty)) => {
                gained > best_gained || (gained == best_gained && empty > best_empty)
            }
        };
        if better {
            best = Some((direction, gained, empty));
        }
    }

    best.map(|(direction, gained, _)| (direction, gained))
}

/// Chooses the first direction in [`CORNER_PRIORITY`] that changes the board.
pub fn choose_move_corner(board: &Board) -> Option<Direction> {
    CORNER_PRIORITY.into_iter().find(|&d| board.can_move(d))
}

/// A named self-play strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// See [`choose_move_random`].
    Random,
    /// See [`choose_move_greedy`].
    Greedy,
    /// See [`choose_move_corner`].
    Corner,
}

impl Strategy {
    /// All strategies, in evaluation order.
    pub const ALL: [Strategy; 3] = [Strategy::Random, Strategy::Greedy, Strategy::Corner];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Random => "RANDOM",
            Strategy::Greedy => "GREEDY",
            Strategy::Corner => "CORNER",
        }
    }

    /// Chooses the next move for `board`. Only [`Strategy::Random`] draws from `rng`.
    pub fn choose<R: Rng + ?Sized>(self, board: &Board, rng: &mut R) -> Option<Direction> {
        match self {
            Strategy::Random => choose_move_random(board, rng),
            Strategy::Greedy => choose_move_greedy(board).map(|(d, _)| d),
            Strategy::Corner => choose_move_corner(board),
        }
    }
}

/// Plays `game` with `strategy` until no move changes the board.
///
/// The `won` flag is consumed whenever it fires, so play continues past 2048.
///
/// # Returns
/// `true` if a 2048 tile was reached at any point during the play-out.
pub fn play_out<G: Rng, R: Rng + ?Sized>(
    game: &mut Game<G>,
    strategy: Strategy,
    rng: &mut R,
) -> bool {
    let mut reached_win = false;
    while !game.is_game_over() {
        let Some(direction) = strategy.choose(game.board(), rng) else {
            break;
        };
        if !game.make_move(direction).moved {
            warn!(
                "{} chose {direction} but the board did not change:\n{}",
                strategy.name(),
                game.board()
            );
            break;
        }
        reached_win |= game.take_won();
    }
    reached_win
}
