//! Discrete-grid Pong environment

pub mod config;
pub mod env;
pub mod render;

pub use config::EnvConfig;
pub use env::{Ball, PADDLE_X, PongEnv, Step};
pub use render::render_grid;
