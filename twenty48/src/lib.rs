//! # 2048 Engine Library
//!
//! This library provides the core game logic for the 2048 sliding-tile puzzle:
//! a fixed-size board of tile values, a random tile spawner, and the four
//! directional slide/merge moves, together with score tracking and the
//! `won` / `game_over` conditions. Front ends drive a [`engine::Game`] one
//! move at a time and render its board however they like.
//!
//! It is used by two binaries:
//! - `play`: Plays a game interactively on the command line.
//! - `autoplay`: Runs the strategies from `heuristics` over many seeded games
//!   and reports average score, win rate and best tile.
//!
//! ## Modules
//! - `engine`: Contains the board representation (`Board`), move directions
//!   (`Direction`), the line slide/merge kernel (`slide_line`), and the game
//!   session (`Game`) with spawning and terminal-state detection.
//! - `heuristics`: Move-selection strategies used for self-play.
//! - `utils`: Provides utility functions, such as parsing boards from text.

pub mod engine;
pub mod heuristics;
pub mod utils;
