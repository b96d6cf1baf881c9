use clap::Parser;
use derive_more::{Display, Error};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use twenty48::engine::{Direction, Game, DEFAULT_BOARD_SIZE, MIN_BOARD_SIZE, WIN_TILE};
use twenty48::utils::{board_from_text, BoardParseError};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play 2048 on the command line", long_about = None)]
struct Args {
    /// Board size (rows and columns)
    #[clap(short, long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,

    /// Seed for tile spawns; omit for a random game
    #[clap(long)]
    seed: Option<u64>,

    /// Start from the position in this file instead of two random tiles
    #[clap(short, long)]
    board: Option<PathBuf>,
}

#[derive(Debug, Display, Error)]
enum SetupError {
    #[display("failed to read {path}: {source}")]
    ReadBoard {
        path: String,
        source: io::Error,
    },
    #[display("invalid board in {path}: {source}")]
    ParseBoard {
        path: String,
        source: BoardParseError,
    },
    #[display("board size must be at least {}, got {size}", MIN_BOARD_SIZE)]
    SizeTooSmall { size: usize },
}

fn read_board_file(path: &Path, rng: SmallRng) -> Result<Game, SetupError> {
    let content = fs::read_to_string(path).map_err(|source| SetupError::ReadBoard {
        path: path.display().to_string(),
        source,
    })?;
    let board = board_from_text(&content).map_err(|source| SetupError::ParseBoard {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Game::with_board(board, rng))
}

fn new_game(args: &Args) -> Result<Game, SetupError> {
    let rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    match &args.board {
        Some(path) => read_board_file(path, rng),
        None if args.size < MIN_BOARD_SIZE => Err(SetupError::SizeTooSmall { size: args.size }),
        None => Ok(Game::with_rng(args.size, rng)),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut game = match new_game(&args) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    println!("Welcome to 2048! Join the tiles to reach {}.", WIN_TILE);

    // The engine raises `won` after every move while a 2048 is on the board.
    let mut announced = false;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("---------------------");
        println!("Moves: {}, Score: {}", game.moves(), game.score());
        println!("{}", game.board());

        if game.is_game_over() {
            println!("---------------------");
            println!("GAME OVER! Final Score: {}", game.score());
            println!("Best tile: {}", game.board().max_tile());
            println!("---------------------");
            print!("Enter 'n' for a new game or 'q' to quit: ");
        } else {
            print!("Enter a move (w/a/s/d or up/left/down/right), 'n' for a new game, 'q' to quit: ");
        }
        if io::stdout().flush().is_err() {
            break;
        }

        let input = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(_)) => {
                println!("Error reading input. Please try again.");
                continue;
            }
            None => break,
        };
        let trimmed_input = input.trim();

        match trimmed_input {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "n" => {
                game.reset();
                announced = false;
                println!("New game started.");
                continue;
            }
            "" => continue,
            _ => {}
        }

        let direction: Direction = match trimmed_input.parse() {
            Ok(direction) => direction,
            Err(e) => {
                println!("Invalid input: {}. Use w/a/s/d, 'n', or 'q'.", e);
                continue;
            }
        };

        let outcome = game.make_move(direction);
        if !outcome.moved {
            println!("Nothing moves {}.", direction);
            continue;
        }
        if outcome.score_gained > 0 {
            println!("+{}", outcome.score_gained);
        }
        if game.take_won() && !announced {
            announced = true;
            println!("🎉 You reached {}! Keep going or press 'n' for a new game. 🎉", WIN_TILE);
        }
    }
}
