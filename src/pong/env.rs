//! Single-paddle Pong on a discrete grid.
//!
//! The ball moves one cell per step on unit velocities. The paddle defends a
//! fixed column near the left edge; the right edge and the horizontal walls
//! reflect the ball back into play. A rally ends when the ball gets past the
//! paddle.

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{
    error::{Error, Result},
    pong::config::EnvConfig,
    types::GridState,
};

/// Column the paddle is glued to. The ball is only ever tested against the
/// paddle when crossing this column leftward.
pub const PADDLE_X: i32 = 1;

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Ball position and unit velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ball {
    pub x: i32,
    pub y: i32,
    pub vx: i32,
    pub vy: i32,
}

/// Outcome of a single environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: GridState,
    pub reward: f64,
    pub done: bool,
}

/// The Pong environment.
///
/// All transition logic is deterministic; the only randomness is the serve
/// direction drawn in [`reset`](PongEnv::reset) from the environment's own
/// RNG, so an env and an agent seeded separately never perturb each other's
/// streams.
///
/// # Examples
///
/// ```
/// use qpong::pong::{EnvConfig, PongEnv};
///
/// let mut env = PongEnv::new(EnvConfig {
///     seed: Some(7),
///     ..EnvConfig::default()
/// })?;
/// let step = env.step(1)?;
/// assert!(!step.done);
/// # Ok::<(), qpong::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PongEnv {
    width: i32,
    height: i32,
    paddle_height: i32,
    paddle_y: i32,
    ball: Ball,
    rng: StdRng,
}

impl PongEnv {
    /// Build an environment from a configuration and serve the first ball.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the geometry cannot hold
    /// the paddle.
    pub fn new(config: EnvConfig) -> Result<Self> {
        config.validate()?;

        let mut env = Self {
            width: config.width,
            height: config.height,
            paddle_height: config.paddle_height,
            paddle_y: 0,
            ball: Ball {
                x: 0,
                y: 0,
                vx: -1,
                vy: 1,
            },
            rng: build_rng(config.seed),
        };
        env.reset();

        Ok(env)
    }

    /// Start a new rally: paddle centered, ball at the grid center moving
    /// toward the paddle, serve direction drawn from the environment RNG.
    pub fn reset(&mut self) -> GridState {
        self.paddle_y = (self.height - self.paddle_height) / 2;
        self.ball = Ball {
            x: self.width / 2,
            y: self.height / 2,
            vx: -1,
            vy: *[-1, 1]
                .choose(&mut self.rng)
                .expect("serve directions are non-empty"),
        };

        self.observation()
    }

    /// Advance the rally by one frame.
    ///
    /// Applies, in order: paddle move (clamped to the grid), ball advance,
    /// top/bottom wall reflection, far wall reflection, then the paddle
    /// test when the ball crosses the paddle column leftward. A hit reflects
    /// the ball and pays +1; a miss pays -1 and ends the rally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAction`] unless `action` is -1, 0, or 1.
    pub fn step(&mut self, action: i32) -> Result<Step> {
        if !matches!(action, -1 | 0 | 1) {
            return Err(Error::InvalidAction { action });
        }

        self.paddle_y = (self.paddle_y + action).clamp(0, self.height - self.paddle_height);

        self.ball.x += self.ball.vx;
        self.ball.y += self.ball.vy;

        if self.ball.y <= 0 {
            self.ball.y = 0;
            self.ball.vy = -self.ball.vy;
        } else if self.ball.y >= self.height - 1 {
            self.ball.y = self.height - 1;
            self.ball.vy = -self.ball.vy;
        }

        if self.ball.x >= self.width - 1 {
            self.ball.x = self.width - 1;
            self.ball.vx = -self.ball.vx;
        }

        let mut reward = 0.0;
        let mut done = false;

        if self.ball.vx < 0 && self.ball.x == PADDLE_X {
            if self.ball.y >= self.paddle_y && self.ball.y < self.paddle_y + self.paddle_height {
                self.ball.vx = -self.ball.vx;
                reward = 1.0;
            } else {
                reward = -1.0;
                done = true;
            }
        } else if self.ball.x < PADDLE_X {
            // Can only happen if the ball was already on the paddle column;
            // treated as a miss.
            reward = -1.0;
            done = true;
        }

        Ok(Step {
            state: self.observation(),
            reward,
            done,
        })
    }

    /// Current observation.
    pub fn observation(&self) -> GridState {
        GridState {
            ball_x: self.ball.x,
            ball_y: self.ball.y,
            ball_vx: self.ball.vx,
            ball_vy: self.ball.vy,
            paddle_y: self.paddle_y,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn paddle_height(&self) -> i32 {
        self.paddle_height
    }

    /// Top row of the paddle.
    pub fn paddle_y(&self) -> i32 {
        self.paddle_y
    }

    pub fn ball(&self) -> Ball {
        self.ball
    }
}
