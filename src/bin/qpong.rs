//! Pong Q-learning CLI
//!
//! This CLI provides a unified interface for:
//! - Training the tabular Q-learning agent
//! - Evaluating a saved Q-table with greedy play
//! - Watching the learned policy in the terminal

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qpong")]
#[command(version, about = "Tabular Q-learning on a discrete-grid Pong", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the Q-learning agent
    Train(qpong::cli::commands::train::TrainArgs),

    /// Evaluate a trained Q-table against the environment
    Evaluate(qpong::cli::commands::evaluate::EvaluateArgs),

    /// Watch a trained agent play in the terminal
    Play(qpong::cli::commands::play::PlayArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => qpong::cli::commands::train::execute(args),
        Commands::Evaluate(args) => qpong::cli::commands::evaluate::execute(args),
        Commands::Play(args) => qpong::cli::commands::play::execute(args),
    }
}
