//! Environment configuration

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    pong::env::PADDLE_X,
};

/// Grid geometry and seeding for the Pong environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Grid width in columns
    pub width: i32,

    /// Grid height in rows
    pub height: i32,

    /// Paddle span in rows
    pub paddle_height: i32,

    /// Seed for the serve RNG; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 10,
            paddle_height: 3,
            seed: None,
        }
    }
}

impl EnvConfig {
    /// Validate that the paddle fits the grid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the paddle span exceeds
    /// the grid height or the grid is too narrow to hold a rally.
    pub fn validate(&self) -> Result<()> {
        if self.paddle_height < 1 {
            return Err(Error::InvalidConfiguration {
                message: format!("paddle_height {} must be at least 1", self.paddle_height),
            });
        }

        if self.height < self.paddle_height {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "height {} cannot fit a paddle spanning {} rows",
                    self.height, self.paddle_height
                ),
            });
        }

        if self.width < PADDLE_X + 2 {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "width {} leaves no rally room right of the paddle column {}",
                    self.width, PADDLE_X
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EnvConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_paddle_taller_than_grid() {
        let config = EnvConfig {
            height: 2,
            paddle_height: 3,
            ..EnvConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_grid_without_rally_room() {
        let config = EnvConfig {
            width: 2,
            ..EnvConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_height_paddle() {
        let config = EnvConfig {
            paddle_height: 0,
            ..EnvConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
