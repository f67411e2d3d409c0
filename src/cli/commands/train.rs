//! Train command - Run Q-learning episodes and save the learned table

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    cli::output::{format_number, print_kv, print_section},
    pipeline::{
        ConsoleLogObserver, CsvObserver, JsonlObserver, ProgressObserver, TrainingConfig,
        TrainingPipeline,
    },
    pong::{EnvConfig, PongEnv},
    q_learning::{AgentConfig, QLearningAgent, SavedQTable, TrainingMetadata},
};

#[derive(Debug, Serialize)]
struct SummaryStats {
    episodes: usize,
    total_reward: f64,
    avg_reward: f64,
    avg_hits: f64,
    avg_steps: f64,
    final_epsilon: f64,
    states_seen: usize,
}

impl From<&crate::pipeline::TrainingResult> for SummaryStats {
    fn from(result: &crate::pipeline::TrainingResult) -> Self {
        Self {
            episodes: result.episodes,
            total_reward: result.total_reward,
            avg_reward: result.avg_reward,
            avg_hits: result.avg_hits,
            avg_steps: result.avg_steps,
            final_epsilon: result.final_epsilon,
            states_seen: result.states_seen,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: SummaryStats,
    evaluation: Option<SummaryStats>,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    width: i32,
    height: i32,
    paddle_height: i32,
    learning_rate: f64,
    discount: f64,
    seed: Option<u64>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train the Q-learning agent")]
pub struct TrainArgs {
    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 500)]
    pub episodes: usize,

    /// Step cap per episode
    #[arg(long, default_value_t = 500)]
    pub max_steps: usize,

    /// Output file for the trained Q-table
    #[arg(long, short = 'O', default_value = "q_table.msgpack")]
    pub output: PathBuf,

    /// Optional file for JSONL per-episode statistics
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional CSV file for per-episode statistics
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show progress bar
    #[arg(long, default_value_t = true)]
    pub progress: bool,

    /// Log a summary line every N episodes (0 disables)
    #[arg(long, default_value_t = 50)]
    pub log_every: usize,

    /// Grid width in cells
    #[arg(long, default_value_t = 20)]
    pub width: i32,

    /// Grid height in cells
    #[arg(long, default_value_t = 10)]
    pub height: i32,

    /// Paddle height in cells
    #[arg(long, default_value_t = 3)]
    pub paddle_height: i32,

    /// Learning rate alpha (0.0-1.0)
    #[arg(long, default_value_t = 0.2)]
    pub learning_rate: f64,

    /// Discount factor gamma (0.0-1.0)
    #[arg(long, default_value_t = 0.95)]
    pub discount: f64,

    /// Initial epsilon (exploration rate)
    #[arg(long, default_value_t = 1.0)]
    pub epsilon: f64,

    /// Epsilon decay per episode
    #[arg(long, default_value_t = 0.995)]
    pub epsilon_decay: f64,

    /// Minimum epsilon
    #[arg(long, default_value_t = 0.05)]
    pub min_epsilon: f64,

    /// Number of post-training greedy evaluation episodes
    #[arg(long, short = 'v', default_value_t = 50)]
    pub eval_episodes: usize,

    /// Seed for the evaluation environment (defaults to seed+2)
    #[arg(long)]
    pub eval_seed: Option<u64>,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let summary_spec = args.summary.as_ref().map(|raw| {
        let sanitized = sanitize_summary_path(raw);
        let normalized = sanitized != *raw;
        (sanitized, normalized)
    });

    let env_config = EnvConfig {
        width: args.width,
        height: args.height,
        paddle_height: args.paddle_height,
        seed: args.seed,
    };
    let mut env = PongEnv::new(env_config)?;

    let agent_config = AgentConfig {
        learning_rate: args.learning_rate,
        discount_factor: args.discount,
        initial_epsilon: args.epsilon,
        min_epsilon: args.min_epsilon,
        epsilon_decay: args.epsilon_decay,
        seed: args.seed.map(|s| s.wrapping_add(1)),
        ..AgentConfig::default()
    };
    let mut agent = QLearningAgent::new(agent_config)?;

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        max_steps: args.max_steps,
    });

    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    if args.log_every > 0 {
        pipeline = pipeline.with_observer(Box::new(ConsoleLogObserver::new(args.log_every)));
    }

    if let Some(observations_path) = &args.observations {
        let jsonl_observer = JsonlObserver::new(observations_path)?;
        pipeline = pipeline.with_observer(Box::new(jsonl_observer));
    }

    if let Some(csv_path) = &args.export_csv {
        let csv_observer = CsvObserver::new(csv_path)?;
        pipeline = pipeline.with_observer(Box::new(csv_observer));
    }

    let result = pipeline.run(&mut env, &mut agent)?;

    print_section("Training Complete");
    print_kv("Episodes", &result.episodes.to_string());
    print_kv("Avg reward", &format!("{:.2}", result.avg_reward));
    print_kv("Avg hits", &format!("{:.2}", result.avg_hits));
    print_kv("Avg steps", &format!("{:.1}", result.avg_steps));
    print_kv("Final epsilon", &format!("{:.3}", result.final_epsilon));
    print_kv("States seen", &format_number(result.states_seen));

    // Save before evaluation so greedy play does not grow the stored table.
    let metadata = TrainingMetadata {
        episodes_trained: Some(result.episodes),
        seed: args.seed,
    };
    SavedQTable::from_agent(&agent, metadata).save_to_file(&args.output)?;
    println!("\nsaved q-table to {}", args.output.display());

    let evaluation_result = if args.eval_episodes > 0 {
        let eval_seed = args
            .eval_seed
            .or_else(|| args.seed.map(|s| s.wrapping_add(2)));
        let mut eval_env = PongEnv::new(EnvConfig {
            width: args.width,
            height: args.height,
            paddle_height: args.paddle_height,
            seed: eval_seed,
        })?;

        let mut eval_pipeline = TrainingPipeline::new(TrainingConfig {
            episodes: args.eval_episodes,
            max_steps: args.max_steps,
        });
        if args.progress {
            eval_pipeline = eval_pipeline.with_observer(Box::new(ProgressObserver::new()));
        }

        let eval_result = eval_pipeline.run_greedy(&mut eval_env, &mut agent)?;

        print_section("Greedy Evaluation");
        print_kv("Episodes", &eval_result.episodes.to_string());
        print_kv("Avg reward", &format!("{:.2}", eval_result.avg_reward));
        print_kv("Avg hits", &format!("{:.2}", eval_result.avg_hits));
        print_kv("Avg steps", &format!("{:.1}", eval_result.avg_steps));

        Some(eval_result)
    } else {
        None
    };

    if let Some((summary_path, normalized)) = summary_spec {
        if normalized {
            println!(
                "\n⚠️  Normalizing summary path to {}",
                summary_path.display()
            );
        }

        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let summary = TrainingSummaryFile {
            training: SummaryStats::from(&result),
            evaluation: evaluation_result.as_ref().map(SummaryStats::from),
            metadata: SummaryMetadata {
                width: args.width,
                height: args.height,
                paddle_height: args.paddle_height,
                learning_rate: args.learning_rate,
                discount: args.discount,
                seed: args.seed,
            },
        };

        let file = File::create(&summary_path)?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
