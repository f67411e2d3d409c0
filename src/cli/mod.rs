//! CLI infrastructure for the Pong Q-learning toolkit
//!
//! This module provides the command-line interface for training, evaluating,
//! and watching the tabular Q-learning agent.

pub mod commands;
pub mod output;
