//! Play command - Watch a trained agent follow the ball in the terminal

use std::{io::Write, path::PathBuf, thread, time::Duration};

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::{
    pong::{EnvConfig, PongEnv, render_grid},
    q_learning::{AgentConfig, QLearningAgent, SavedQTable},
};

#[derive(Parser, Debug)]
#[command(about = "Watch a trained agent play")]
pub struct PlayArgs {
    /// Path to trained Q-table file
    pub table: PathBuf,

    /// Number of episodes to play
    #[arg(long, short = 'e', default_value_t = 3)]
    pub episodes: usize,

    /// Step cap per episode
    #[arg(long, default_value_t = 500)]
    pub max_steps: usize,

    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 80)]
    pub delay_ms: u64,

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
}

pub fn execute(args: PlayArgs) -> Result<()> {
    if !args.table.exists() {
        return Err(anyhow!("missing {} (train first)", args.table.display()));
    }

    let saved = SavedQTable::load_from_file(&args.table)?;
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

    let mut stdout = std::io::stdout();
    for episode in 1..=args.episodes {
        let mut state = env.reset();
        let mut total_reward = 0.0;
        let mut hits = 0;

        for _ in 0..args.max_steps {
            let action = agent.best_action(&state);
            let step = env.step(action)?;
            state = step.state;
            total_reward += step.reward;
            if step.reward > 0.0 {
                hits += 1;
            }

            write!(
                stdout,
                "\x1B[2J\x1B[1;1H{}\nepisode: {}  reward: {}  hits: {}  epsilon: {:.3}\n",
                render_grid(&env),
                episode,
                total_reward,
                hits,
                agent.epsilon()
            )?;
            stdout.flush()?;
            thread::sleep(Duration::from_millis(args.delay_ms));

            if step.done {
                break;
            }
        }

        writeln!(
            stdout,
            "episode {episode} done reward={total_reward} hits={hits}"
        )?;
        // Hold the summary line briefly before the next episode clears it.
        thread::sleep(Duration::from_millis(args.delay_ms.saturating_mul(8)));
    }

    Ok(())
}
