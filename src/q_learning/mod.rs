//! Tabular Q-learning over grid Pong states
//!
//! Off-policy TD control with an ε-greedy behavior policy:
//!
//! Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
//!
//! The Q-table is sparse: states materialize with zero-valued rows the first
//! time they are read, so no enumeration of the state space is needed up
//! front. Greedy ties are broken uniformly at random, which keeps early
//! play unbiased while whole rows still sit at their initial zeros.
//!
//! ## Usage Example
//!
//! ```no_run
//! use qpong::pong::{EnvConfig, PongEnv};
//! use qpong::q_learning::{AgentConfig, QLearningAgent};
//!
//! let mut env = PongEnv::new(EnvConfig::default())?;
//! let mut agent = QLearningAgent::new(AgentConfig::default())?;
//!
//! let state = env.reset();
//! let action = agent.select_action(&state);
//! let step = env.step(action)?;
//! agent.update(&state, action, step.reward, &step.state, step.done)?;
//! # Ok::<(), qpong::Error>(())
//! ```

pub mod agent;
pub mod q_table;
pub mod serialization;

// Public re-exports
pub use agent::{AgentConfig, QLearningAgent};
pub use q_table::QTable;
pub use serialization::{SavedQTable, TrainingMetadata};
