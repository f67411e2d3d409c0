//! Training and evaluation pipeline abstractions
//!
//! This module provides composable pipelines for:
//! - Training the Q-learning agent against the Pong environment
//! - Evaluating learned policies greedily
//! - Recording per-episode statistics during training

pub mod observers;
pub mod training;

// Re-export observer implementations
pub use observers::{ConsoleLogObserver, CsvObserver, JsonlObserver, Observer, ProgressObserver};
pub use training::{EpisodeStats, TrainingConfig, TrainingPipeline, TrainingResult};
