//! Shared domain types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of everything the agent observes: ball position, ball velocity,
/// and the paddle's top row.
///
/// All fields are integers, so a state is `Copy`, hashable, and usable
/// directly as a Q-table key. Two states compare equal exactly when every
/// component matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridState {
    pub ball_x: i32,
    pub ball_y: i32,
    pub ball_vx: i32,
    pub ball_vy: i32,
    pub paddle_y: i32,
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.ball_x, self.ball_y, self.ball_vx, self.ball_vy, self.paddle_y
        )
    }
}
