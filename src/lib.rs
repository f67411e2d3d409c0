//! Tabular Q-learning on a discrete-grid Pong environment
//!
//! This crate provides:
//! - A deterministic single-paddle Pong environment on an integer grid
//! - A tabular Q-learning agent with epsilon-greedy exploration
//! - Training and evaluation pipelines with pluggable observers
//! - MessagePack persistence for learned Q-tables

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod pong;
pub mod q_learning;
pub mod types;

pub use error::{Error, Result};
pub use pong::{EnvConfig, PongEnv, Step};
pub use q_learning::{AgentConfig, QLearningAgent, SavedQTable};
pub use types::GridState;
