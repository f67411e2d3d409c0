//! Evaluate command - Run a trained Q-table greedily and report statistics

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::output::{format_number, print_kv, print_section},
    pipeline::{ProgressObserver, TrainingConfig, TrainingPipeline},
    pong::{EnvConfig, PongEnv},
    q_learning::{AgentConfig, QLearningAgent, SavedQTable},
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained Q-table")]
pub struct EvaluateArgs {
    /// Path to trained Q-table file
    pub table: PathBuf,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 100)]
    pub episodes: usize,

    /// Step cap per episode
    #[arg(long, default_value_t = 500)]
    pub max_steps: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Grid width in cells (must match the trained layout)
    #[arg(long, default_value_t = 20)]
    pub width: i32,

    /// Grid height in cells (must match the trained layout)
    #[arg(long, default_value_t = 10)]
    pub height: i32,

    /// Paddle height in cells (must match the trained layout)
    #[arg(long, default_value_t = 3)]
    pub paddle_height: i32,

    /// Export results to JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    if !args.table.exists() {
        return Err(anyhow!("missing {} (train first)", args.table.display()));
    }

    println!("Loading q-table from: {}", args.table.display());
    let saved = SavedQTable::load_from_file(&args.table)?;

    print_section("Loaded Q-table");
    print_kv("States", &format_number(saved.states()));
    print_kv("Actions", &format!("{:?}", saved.actions));
    if let Some(episodes) = saved.metadata.episodes_trained {
        print_kv("Episodes trained", &format_number(episodes));
    }
    if let Some(seed) = saved.metadata.seed {
        print_kv("Training seed", &seed.to_string());
    }

    let mut agent = QLearningAgent::new(AgentConfig {
        actions: saved.actions.clone(),
        seed: args.seed.map(|s| s.wrapping_add(1)),
        ..AgentConfig::default()
    })?;
    saved.apply_to(&mut agent)?;

    let mut env = PongEnv::new(EnvConfig {
        width: args.width,
        height: args.height,
        paddle_height: args.paddle_height,
        seed: args.seed,
    })?;

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        max_steps: args.max_steps,
    })
    .with_observer(Box::new(ProgressObserver::new()));

    let result = pipeline.run_greedy(&mut env, &mut agent)?;

    print_section("Evaluation Results");
    print_kv("Episodes", &result.episodes.to_string());
    print_kv("Avg reward", &format!("{:.2}", result.avg_reward));
    print_kv("Avg hits", &format!("{:.2}", result.avg_hits));
    print_kv("Avg steps", &format!("{:.1}", result.avg_steps));

    if let Some(export_path) = &args.export {
        export_results(&result, &saved, &args, export_path)?;
        println!("\n✓ Results exported to: {}", export_path.display());
    }

    Ok(())
}

/// Export evaluation results to JSON
fn export_results(
    result: &crate::pipeline::TrainingResult,
    saved: &SavedQTable,
    args: &EvaluateArgs,
    path: &PathBuf,
) -> Result<()> {
    use std::fs::File;

    #[derive(Serialize)]
    struct EvaluationExport {
        evaluation: EvaluationSection,
        agent: AgentSection,
    }

    #[derive(Serialize)]
    struct EvaluationSection {
        table_file: String,
        episodes: usize,
        total_reward: f64,
        avg_reward: f64,
        avg_hits: f64,
        avg_steps: f64,
    }

    #[derive(Serialize)]
    struct AgentSection {
        states: usize,
        actions: Vec<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        episodes_trained: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        training_seed: Option<u64>,
    }

    let export = EvaluationExport {
        evaluation: EvaluationSection {
            table_file: args.table.display().to_string(),
            episodes: result.episodes,
            total_reward: result.total_reward,
            avg_reward: result.avg_reward,
            avg_hits: result.avg_hits,
            avg_steps: result.avg_steps,
        },
        agent: AgentSection {
            states: saved.states(),
            actions: saved.actions.clone(),
            episodes_trained: saved.metadata.episodes_trained,
            training_seed: saved.metadata.seed,
        },
    };

    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &export)?;
    Ok(())
}
