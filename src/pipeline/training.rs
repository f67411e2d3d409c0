//! Training and evaluation loops for the Pong Q-learner

use serde::{Deserialize, Serialize};

use crate::{
    Result, pipeline::observers::Observer, pong::PongEnv, q_learning::QLearningAgent,
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub episodes: usize,

    /// Step cap per episode, so a rally that never misses still terminates
    pub max_steps: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            max_steps: 500,
        }
    }
}

/// Statistics for one finished episode, fanned out to observers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Episode index (0-based)
    pub episode: usize,

    /// Sum of rewards over the episode
    pub reward: f64,

    /// Paddle hits (positive-reward steps)
    pub hits: usize,

    /// Steps taken before the rally ended or the cap was reached
    pub steps: usize,

    /// Exploration rate after the episode's decay
    pub epsilon: f64,
}

/// Aggregate result of a training or evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Episodes played
    pub episodes: usize,

    /// Sum of rewards over all episodes
    pub total_reward: f64,

    /// Mean episode reward
    pub avg_reward: f64,

    /// Mean paddle hits per episode
    pub avg_hits: f64,

    /// Mean episode length in steps
    pub avg_steps: f64,

    /// Exploration rate when the run finished
    pub final_epsilon: f64,

    /// States materialized in the Q-table when the run finished
    pub states_seen: usize,
}

impl TrainingResult {
    /// Aggregate per-episode statistics into a result.
    pub fn new(stats: &[EpisodeStats], final_epsilon: f64, states_seen: usize) -> Self {
        let episodes = stats.len();
        let total_reward: f64 = stats.iter().map(|s| s.reward).sum();
        let total_hits: usize = stats.iter().map(|s| s.hits).sum();
        let total_steps: usize = stats.iter().map(|s| s.steps).sum();

        let (avg_reward, avg_hits, avg_steps) = if episodes > 0 {
            (
                total_reward / episodes as f64,
                total_hits as f64 / episodes as f64,
                total_steps as f64 / episodes as f64,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        Self {
            episodes,
            total_reward,
            avg_reward,
            avg_hits,
            avg_steps,
            final_epsilon,
            states_seen,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Episode loop driving one environment and one agent.
///
/// Observers are notified after every episode; global statistics accumulate
/// here rather than in the environment or the agent.
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Train the agent for the configured number of episodes.
    ///
    /// Each episode: reset the environment, then up to `max_steps` rounds of
    /// select, step, and update, stopping early when the rally ends. Epsilon
    /// decays exactly once per episode, whether the rally ended or ran into
    /// the cap.
    pub fn run(&mut self, env: &mut PongEnv, agent: &mut QLearningAgent) -> Result<TrainingResult> {
        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        let mut all_stats = Vec::with_capacity(self.config.episodes);

        for episode in 0..self.config.episodes {
            let mut state = env.reset();
            let mut reward_total = 0.0;
            let mut hits = 0;
            let mut steps = 0;

            for _ in 0..self.config.max_steps {
                let action = agent.select_action(&state);
                let step = env.step(action)?;
                agent.update(&state, action, step.reward, &step.state, step.done)?;

                state = step.state;
                reward_total += step.reward;
                if step.reward > 0.0 {
                    hits += 1;
                }
                steps += 1;

                if step.done {
                    break;
                }
            }

            agent.decay_epsilon();

            let stats = EpisodeStats {
                episode,
                reward: reward_total,
                hits,
                steps,
                epsilon: agent.epsilon(),
            };
            for observer in &mut self.observers {
                observer.on_episode_end(&stats)?;
            }
            all_stats.push(stats);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        Ok(TrainingResult::new(
            &all_stats,
            agent.epsilon(),
            agent.states_seen(),
        ))
    }

    /// Evaluate the frozen policy: greedy actions only, no updates, no
    /// epsilon decay.
    pub fn run_greedy(
        &mut self,
        env: &mut PongEnv,
        agent: &mut QLearningAgent,
    ) -> Result<TrainingResult> {
        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        let mut all_stats = Vec::with_capacity(self.config.episodes);

        for episode in 0..self.config.episodes {
            let mut state = env.reset();
            let mut reward_total = 0.0;
            let mut hits = 0;
            let mut steps = 0;

            for _ in 0..self.config.max_steps {
                let action = agent.best_action(&state);
                let step = env.step(action)?;

                state = step.state;
                reward_total += step.reward;
                if step.reward > 0.0 {
                    hits += 1;
                }
                steps += 1;

                if step.done {
                    break;
                }
            }

            let stats = EpisodeStats {
                episode,
                reward: reward_total,
                hits,
                steps,
                epsilon: agent.epsilon(),
            };
            for observer in &mut self.observers {
                observer.on_episode_end(&stats)?;
            }
            all_stats.push(stats);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        Ok(TrainingResult::new(
            &all_stats,
            agent.epsilon(),
            agent.states_seen(),
        ))
    }
}
