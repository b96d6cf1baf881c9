use clap::Parser;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashMap;
use twenty48::engine::{Game, DEFAULT_BOARD_SIZE, MIN_BOARD_SIZE};
use twenty48::heuristics::{play_out, Strategy};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Evaluate 2048 self-play strategies over seeded games", long_about = None)]
struct Args {
    /// Number of games each strategy plays
    #[clap(short, long, default_value_t = 20)]
    games: u64,

    /// Seed of the first game; game `i` uses `seed + i`
    #[clap(long, default_value_t = 0)]
    seed: u64,

    /// Board size (rows and columns)
    #[clap(short, long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,
}

#[derive(Default)]
struct StrategyStats {
    scores: Vec<u64>,
    wins: u64,
    best_tile: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.size < MIN_BOARD_SIZE {
        eprintln!(
            "Board size must be at least {}, got {}",
            MIN_BOARD_SIZE, args.size
        );
        std::process::exit(1);
    }

    let mut all_stats: HashMap<Strategy, StrategyStats> = HashMap::new();

    println!(
        "Starting strategy evaluation for {} games on a {}x{} board...",
        args.games, args.size, args.size
    );

    for game_idx in 0..args.games {
        let current_seed = args.seed.wrapping_add(game_idx);
        debug!("game {} (seed {})", game_idx, current_seed);

        for strategy in Strategy::ALL {
            // Same spawns for every strategy; a separate stream for random choices.
            let mut game = Game::with_seed(args.size, current_seed);
            let mut choice_rng = SmallRng::seed_from_u64(current_seed ^ 0x2048);
            let reached_win = play_out(&mut game, strategy, &mut choice_rng);

            let best_tile = game.board().max_tile();
            info!(
                "game {:<4} {:<8} score {:<7} moves {:<5} best tile {}",
                game_idx,
                strategy.name(),
                game.score(),
                game.moves(),
                best_tile
            );

            let stats = all_stats.entry(strategy).or_default();
            stats.scores.push(game.score());
            stats.wins += u64::from(reached_win);
            stats.best_tile = stats.best_tile.max(best_tile);
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of games per strategy: {}", args.games);
    println!(
        "Strategies evaluated: {}",
        Strategy::ALL
            .iter()
            .map(|s| s.name())
            .collect::<Vec<&str>>()
            .join(", ")
    );
    println!("\n--- Average Scores ---");

    let mut sorted_avg_scores: Vec<(Strategy, f64)> = Vec::new();
    for strategy in Strategy::ALL {
        let Some(stats) = all_stats.get(&strategy) else {
            println!("Strategy {}: No scores recorded.", strategy.name());
            continue;
        };
        if stats.scores.is_empty() {
            println!("Strategy {}: No scores recorded.", strategy.name());
            continue;
        }
        let total_score: u64 = stats.scores.iter().sum();
        let avg_score = total_score as f64 / stats.scores.len() as f64;
        sorted_avg_scores.push((strategy, avg_score));
    }

    // Sort by average score descending
    sorted_avg_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (strategy, avg_score) in sorted_avg_scores {
        let stats = &all_stats[&strategy];
        let win_rate = 100.0 * stats.wins as f64 / stats.scores.len() as f64;
        println!(
            "Strategy {:<8}: Average Score = {:>10.2}, Win Rate = {:>5.1}%, Best Tile = {}",
            strategy.name(),
            avg_score,
            win_rate,
            stats.best_tile
        );
    }
}
