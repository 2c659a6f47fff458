//! Matches between search agents on the bundled games.
//!
//! Plays seeded games between two agents, alternating which one moves
//! first, optionally saves every game as JSON and prints the tally.

mod arena;
mod config;

use anyhow::{Context, Result};
use arena::{play_game, AgentKind, GameKind, GameRecord, MatchSettings, Tally};
use clap::{Parser, Subcommand};
use config::SelfplayConfig;
use gail_core::State;
use gail_search::games::{Connect4State, TicTacToeState};
use rayon::prelude::*;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Game-playing agent arena.
#[derive(Parser)]
#[command(name = "gail-selfplay")]
#[command(about = "Play matches between UCT, negamax, Monte Carlo and random agents")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match between two agents.
    Play {
        /// Game to play.
        #[arg(long, value_enum, default_value = "tictactoe")]
        game: GameKind,

        /// Agent moving first in even-numbered games.
        #[arg(long, value_enum, default_value = "uct")]
        first: AgentKind,

        /// Agent moving first in odd-numbered games.
        #[arg(long, value_enum, default_value = "negamax")]
        second: AgentKind,

        /// Number of games to play.
        #[arg(short, long, default_value = "10")]
        games: usize,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// UCT and Monte Carlo simulations per move (overrides the config
        /// file).
        #[arg(short, long)]
        simulations: Option<usize>,

        /// Negamax search depth (overrides the config file).
        #[arg(short, long)]
        depth: Option<usize>,

        /// Wall-clock budget per move in milliseconds. Without it every
        /// search runs to completion.
        #[arg(long)]
        budget_ms: Option<u64>,

        /// JSON file with `uct`, `negamax`, `monte_carlo` and `rollout`
        /// sections.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory to write one JSON file per game.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Play every game of a match, in parallel.
fn play_match<S>(settings: &MatchSettings, games: usize) -> Result<Vec<GameRecord>>
where
    S: State + Display,
    S::Action: Display,
{
    (0..games)
        .into_par_iter()
        .map(|i| play_game::<S>(settings, i).with_context(|| format!("Game {} failed", i)))
        .collect()
}

fn save_records(output: &Path, records: &[GameRecord]) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {:?}", output))?;

    for record in records {
        let filename = output.join(format!("game_{:06}.json", record.index));
        let file =
            File::create(&filename).with_context(|| format!("Failed to create file: {:?}", filename))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, record)
            .with_context(|| format!("Failed to serialize game {}", record.index))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_play(
    game: GameKind,
    first: AgentKind,
    second: AgentKind,
    games: usize,
    seed: u64,
    simulations: Option<usize>,
    depth: Option<usize>,
    budget_ms: Option<u64>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = match &config {
        Some(path) => SelfplayConfig::load(path)?,
        None => SelfplayConfig::default(),
    }
    .with_overrides(simulations, depth);

    let settings = MatchSettings {
        game,
        first,
        second,
        seed,
        budget: budget_ms.map(Duration::from_millis),
        config,
    };

    info!(?game, ?first, ?second, games, seed, budget_ms, "starting match");
    println!(
        "Playing {} games of {:?}: {:?} vs {:?}",
        games, game, first, second
    );
    println!("================================================");

    let start = Instant::now();
    let records = match game {
        GameKind::TicTacToe => play_match::<TicTacToeState>(&settings, games)?,
        GameKind::Connect4 => play_match::<Connect4State>(&settings, games)?,
    };
    let elapsed = start.elapsed();

    if let Some(output) = &output {
        save_records(output, &records)?;
        println!("Files saved to: {:?}", output);
    }

    let tally = Tally::from_records(&records);
    let total_moves: usize = records.iter().map(|r| r.moves.len()).sum();
    info!(
        first_wins = tally.first_wins,
        second_wins = tally.second_wins,
        draws = tally.draws,
        elapsed_ms = elapsed.as_millis() as u64,
        "match finished"
    );

    let percent = |n: usize| n as f64 / tally.total().max(1) as f64 * 100.0;
    println!("\nCompleted in {:.2}s", elapsed.as_secs_f64());
    println!(
        "Average game length: {:.1} moves",
        total_moves as f64 / games.max(1) as f64
    );
    println!("------------------------------------------------");
    println!("{:<8} wins: {} ({:.1}%)", format!("{:?}", first), tally.first_wins, percent(tally.first_wins));
    println!("{:<8} wins: {} ({:.1}%)", format!("{:?}", second), tally.second_wins, percent(tally.second_wins));
    println!("Draws:         {} ({:.1}%)", tally.draws, percent(tally.draws));

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Play {
            game,
            first,
            second,
            games,
            seed,
            simulations,
            depth,
            budget_ms,
            config,
            output,
        } => cmd_play(
            game,
            first,
            second,
            games,
            seed,
            simulations,
            depth,
            budget_ms,
            config,
            output,
        ),
    }
}
