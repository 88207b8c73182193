//! Gridwar CLI - relay server, headless matches and a network bot.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Gridwar - a two-player grid tactics engine
#[derive(Parser, Debug)]
#[command(name = "gridwar")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the matchmaking relay
    Serve {
        /// Listen address
        #[arg(short, long, default_value = gridwar::relay::DEFAULT_BIND)]
        bind: String,

        /// Listen on 0.0.0.0 at this port instead of --bind
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Length of generated room codes
        #[arg(long, default_value_t = gridwar::relay::DEFAULT_ROOM_CODE_LEN)]
        room_code_len: usize,
    },

    /// Play one AI-vs-AI match
    Simulate {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum side-turns before a draw
        #[arg(short, long, default_value_t = gridwar::simulation::DEFAULT_MAX_TURNS)]
        turns: u32,

        /// Ruleset JSON file (default: built-in table)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Run many AI-vs-AI matches in parallel
    Tournament {
        /// Number of games to play
        #[arg(short = 'n', long, default_value = "100")]
        games: u64,

        /// Base random seed (game i uses seed + i)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of threads (default: all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum side-turns per game
        #[arg(short, long, default_value_t = gridwar::simulation::DEFAULT_MAX_TURNS)]
        turns: u32,

        /// Ruleset JSON file (default: built-in table)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Connect to a relay and let the AI play one networked match
    Bot {
        /// Relay address
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: String,

        /// Join a private room instead of matchmaking
        #[arg(long, conflicts_with = "host")]
        room: Option<String>,

        /// Host a private room and wait for someone to join
        #[arg(long)]
        host: bool,

        /// Ruleset JSON file (default: built-in table)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Serve {
            bind,
            port,
            room_code_len,
        } => cli::serve::execute(bind, port, room_code_len),
        Commands::Simulate {
            seed,
            turns,
            rules,
            format,
        } => cli::simulate::execute(seed, turns, rules.as_deref(), format),
        Commands::Tournament {
            games,
            seed,
            threads,
            turns,
            rules,
            format,
            progress,
        } => cli::tournament::execute(games, seed, threads, turns, rules.as_deref(), format, progress),
        Commands::Bot {
            addr,
            room,
            host,
            rules,
        } => cli::bot::execute(&addr, room, host, rules.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
