//! Tabular Q-learning agent
//!
//! The agent keeps a sparse Q-table keyed by full grid states and follows an
//! ε-greedy behavior policy while learning off-policy toward the greedy
//! value.

use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::{
        q_table::QTable,
        serialization::{SavedQTable, TrainingMetadata},
    },
    types::GridState,
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Hyperparameters for [`QLearningAgent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Paddle moves the agent may choose from, in slot order
    pub actions: Vec<i32>,

    /// Learning rate α
    pub learning_rate: f64,

    /// Discount factor γ
    pub discount_factor: f64,

    /// Starting exploration rate
    pub initial_epsilon: f64,

    /// Exploration floor
    pub min_epsilon: f64,

    /// Multiplicative decay applied once per episode
    pub epsilon_decay: f64,

    /// Seed for the agent's RNG; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            actions: vec![-1, 0, 1],
            learning_rate: 0.2,
            discount_factor: 0.95,
            initial_epsilon: 1.0,
            min_epsilon: 0.05,
            epsilon_decay: 0.995,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Validate the action set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the action set is empty,
    /// contains a move other than -1, 0, or 1, or repeats a move.
    pub fn validate(&self) -> Result<()> {
        if self.actions.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "action set is empty".to_string(),
            });
        }

        for (i, &action) in self.actions.iter().enumerate() {
            if !matches!(action, -1 | 0 | 1) {
                return Err(Error::InvalidConfiguration {
                    message: format!("action {action} is not a paddle move (-1, 0, or 1)"),
                });
            }
            if self.actions[..i].contains(&action) {
                return Err(Error::InvalidConfiguration {
                    message: format!("action {action} appears more than once"),
                });
            }
        }

        Ok(())
    }
}

/// Tabular Q-learning agent (off-policy TD control).
///
/// States the agent has never seen answer with zero-valued rows, so nothing
/// needs to be enumerated up front; the table grows as play explores the
/// state space.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    actions: Vec<i32>,
    q_table: QTable,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    rng: StdRng,
}

impl QLearningAgent {
    /// Create an agent from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an invalid action set.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            q_table: QTable::new(
                config.learning_rate,
                config.discount_factor,
                config.actions.len(),
            ),
            actions: config.actions,
            epsilon: config.initial_epsilon,
            epsilon_decay: config.epsilon_decay,
            min_epsilon: config.min_epsilon,
            rng: build_rng(config.seed),
        })
    }

    /// ε-greedy action selection: explore with probability ε, otherwise act
    /// greedily.
    pub fn select_action(&mut self, state: &GridState) -> i32 {
        if self.rng.random::<f64>() < self.epsilon {
            // Explore: uniform over the action set
            *self
                .actions
                .choose(&mut self.rng)
                .expect("validated action set is non-empty")
        } else {
            self.best_action(state)
        }
    }

    /// Greedy action, breaking exact-value ties uniformly at random.
    ///
    /// Fresh states tie across the whole action set, so greedy play in
    /// unexplored territory stays uniform instead of favoring one slot.
    pub fn best_action(&mut self, state: &GridState) -> i32 {
        let candidates = self.q_table.greedy_indices(state);
        let index = *candidates
            .choose(&mut self.rng)
            .expect("greedy candidates always include the row maximum");
        self.actions[index]
    }

    /// Apply one TD update for an observed transition.
    ///
    /// When `done` the target is the reward alone; otherwise it bootstraps
    /// from the best value available in `next_state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if `action` is not in the agent's
    /// action set.
    pub fn update(
        &mut self,
        state: &GridState,
        action: i32,
        reward: f64,
        next_state: &GridState,
        done: bool,
    ) -> Result<()> {
        let index = self.action_index(action)?;
        self.q_table.td_update(state, index, reward, next_state, done);
        Ok(())
    }

    fn action_index(&self, action: i32) -> Result<usize> {
        self.actions
            .iter()
            .position(|&a| a == action)
            .ok_or(Error::UnknownAction { action })
    }

    /// Decay epsilon after an episode, never below the floor.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of states with materialized Q-rows.
    pub fn states_seen(&self) -> usize {
        self.q_table.len()
    }

    /// The agent's action set, in slot order.
    pub fn actions(&self) -> &[i32] {
        &self.actions
    }

    /// Persist the Q-table to `path` as a versioned MessagePack envelope.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        SavedQTable::from_agent(self, TrainingMetadata::default()).save_to_file(path)
    }

    /// Replace the Q-table wholesale with one loaded from `path`.
    ///
    /// Epsilon and the learning hyperparameters keep their current values;
    /// only the table is swapped.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or malformed, the format version is
    /// unsupported, or the saved action ordering differs from this agent's.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        SavedQTable::load_from_file(path)?.apply_to(self)
    }

    pub(crate) fn export_values(&self) -> std::collections::HashMap<GridState, Vec<f64>> {
        self.q_table.export_values()
    }

    pub(crate) fn replace_values(
        &mut self,
        values: std::collections::HashMap<GridState, Vec<f64>>,
    ) {
        self.q_table.replace_values(values);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn state(ball_x: i32) -> GridState {
        GridState {
            ball_x,
            ball_y: 5,
            ball_vx: -1,
            ball_vy: 1,
            paddle_y: 3,
        }
    }

    fn seeded_agent(initial_epsilon: f64) -> QLearningAgent {
        QLearningAgent::new(AgentConfig {
            initial_epsilon,
            seed: Some(3),
            ..AgentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_rejects_empty_actions() {
        let config = AgentConfig {
            actions: vec![],
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_out_of_range_action() {
        let config = AgentConfig {
            actions: vec![-1, 0, 2],
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_duplicate_actions() {
        let config = AgentConfig {
            actions: vec![-1, 0, 0],
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_full_epsilon_explores_every_action() {
        let mut agent = seeded_agent(1.0);

        let picked: HashSet<i32> = (0..100).map(|_| agent.select_action(&state(4))).collect();

        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_best_action_prefers_higher_value() {
        let mut agent = seeded_agent(0.0);
        agent.q_table.set(state(4), 2, 1.0);

        for _ in 0..20 {
            assert_eq!(agent.best_action(&state(4)), 1);
        }
    }

    #[test]
    fn test_best_action_breaks_ties_at_random() {
        let mut agent = seeded_agent(0.0);

        // Fresh state: every action ties at zero, so over many draws the
        // greedy policy must reach all of them.
        let picked: HashSet<i32> = (0..200).map(|_| agent.best_action(&state(4))).collect();

        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_tie_break_restricted_to_max_values() {
        let mut agent = seeded_agent(0.0);
        agent.q_table.set(state(4), 0, 1.0);
        agent.q_table.set(state(4), 2, 1.0);
        agent.q_table.set(state(4), 1, -1.0);

        let picked: HashSet<i32> = (0..200).map(|_| agent.best_action(&state(4))).collect();

        assert_eq!(picked, HashSet::from([-1, 1]));
    }

    #[test]
    fn test_update_rejects_unknown_action() {
        let mut agent = seeded_agent(0.0);

        let result = agent.update(&state(4), 5, 0.0, &state(5), false);

        assert!(matches!(result, Err(Error::UnknownAction { action: 5 })));
    }

    #[test]
    fn test_update_moves_value_toward_target() {
        let mut agent = seeded_agent(0.0);

        // Terminal transition: target is the raw reward.
        agent.update(&state(4), 0, 1.0, &state(5), true).unwrap();

        // Q(s, -1) = 0.0 + 0.2 * (1.0 - 0.0)
        assert!((agent.q_table.get(&state(4), 0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_update_ignores_next_state_values() {
        let mut agent = seeded_agent(0.0);
        agent.q_table.set(state(5), 1, 100.0);

        agent.update(&state(4), 0, -1.0, &state(5), true).unwrap();

        assert!((agent.q_table.get(&state(4), 0) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_nonterminal_update_bootstraps() {
        let mut agent = seeded_agent(0.0);
        agent.q_table.set(state(5), 1, 2.0);

        agent.update(&state(4), 0, 0.0, &state(5), false).unwrap();

        // Q(s, -1) = 0.0 + 0.2 * (0.0 + 0.95 * 2.0 - 0.0)
        assert!((agent.q_table.get(&state(4), 0) - 0.38).abs() < 1e-12);
    }

    #[test]
    fn test_decay_epsilon_stops_at_floor() {
        let mut agent = QLearningAgent::new(AgentConfig {
            initial_epsilon: 1.0,
            epsilon_decay: 0.5,
            min_epsilon: 0.3,
            seed: Some(3),
            ..AgentConfig::default()
        })
        .unwrap();

        agent.decay_epsilon();
        assert!((agent.epsilon() - 0.5).abs() < 1e-12);

        agent.decay_epsilon();
        assert!((agent.epsilon() - 0.3).abs() < 1e-12);

        agent.decay_epsilon();
        assert!((agent.epsilon() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_reproduces_choices() {
        let mut a = seeded_agent(0.5);
        let mut b = seeded_agent(0.5);

        for i in 0..50 {
            assert_eq!(a.select_action(&state(i % 10)), b.select_action(&state(i % 10)));
        }
    }
}
