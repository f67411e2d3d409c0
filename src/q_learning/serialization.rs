//! Persistence for trained Q-tables.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::agent::QLearningAgent,
    types::GridState,
};

/// Provenance carried alongside a saved Q-table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Episodes the table was trained for, if known
    pub episodes_trained: Option<usize>,

    /// Seed the training run used, if any
    pub seed: Option<u64>,
}

/// Versioned on-disk envelope for a Q-table.
///
/// The envelope records the action ordering the rows were produced under;
/// loading into an agent with a different ordering is refused rather than
/// silently reinterpreting the slots. MessagePack is used because the table
/// is keyed by struct states, which JSON maps cannot express.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQTable {
    pub version: u32,
    pub actions: Vec<i32>,
    q_values: HashMap<GridState, Vec<f64>>,
    pub metadata: TrainingMetadata,
}

impl SavedQTable {
    pub const VERSION: u32 = 1;

    /// Snapshot an agent's table.
    pub fn from_agent(agent: &QLearningAgent, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            actions: agent.actions().to_vec(),
            q_values: agent.export_values(),
            metadata,
        }
    }

    /// Number of states in the snapshot.
    pub fn states(&self) -> usize {
        self.q_values.len()
    }

    /// Install the snapshot into `agent`, replacing its table wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] for a foreign format version,
    /// [`Error::ActionSetMismatch`] when the saved action ordering differs
    /// from the agent's, and [`Error::SerializationContext`] when a row does
    /// not span the action set.
    pub fn apply_to(&self, agent: &mut QLearningAgent) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                version: self.version,
                expected: Self::VERSION,
            });
        }

        if self.actions != agent.actions() {
            return Err(Error::ActionSetMismatch {
                expected: agent.actions().to_vec(),
                got: self.actions.clone(),
            });
        }

        if let Some(row) = self
            .q_values
            .values()
            .find(|row| row.len() != self.actions.len())
        {
            return Err(Error::SerializationContext {
                operation: "validate Q-table rows".to_string(),
                message: format!(
                    "row width {} does not match {} actions",
                    row.len(),
                    self.actions.len()
                ),
            });
        }

        agent.replace_values(self.q_values.clone());
        Ok(())
    }

    /// Write the envelope to `path` as MessagePack.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or the table cannot be encoded.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, self).map_err(|e| Error::SerializationContext {
            operation: "serialize Q-table to MessagePack".to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }

    /// Read an envelope from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or does not decode as an envelope.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        let reader = BufReader::new(file);

        rmp_serde::decode::from_read(reader).map_err(|e| Error::SerializationContext {
            operation: "deserialize Q-table from MessagePack".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::q_learning::agent::AgentConfig;

    fn state(ball_x: i32) -> GridState {
        GridState {
            ball_x,
            ball_y: 5,
            ball_vx: -1,
            ball_vy: 1,
            paddle_y: 3,
        }
    }

    fn trained_agent() -> QLearningAgent {
        let mut agent = QLearningAgent::new(AgentConfig {
            seed: Some(11),
            ..AgentConfig::default()
        })
        .unwrap();

        for x in 0..8 {
            agent
                .update(&state(x), -1, 1.0, &state(x + 1), false)
                .unwrap();
            agent
                .update(&state(x + 1), 0, -1.0, &state(x), x % 3 == 0)
                .unwrap();
        }

        agent
    }

    #[test]
    fn test_roundtrip_preserves_values_exactly() {
        let agent = trained_agent();
        let saved = SavedQTable::from_agent(&agent, TrainingMetadata::default());

        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedQTable = rmp_serde::from_slice(&bytes).unwrap();

        let mut restored = QLearningAgent::new(AgentConfig {
            seed: Some(99),
            ..AgentConfig::default()
        })
        .unwrap();
        loaded.apply_to(&mut restored).unwrap();

        assert_eq!(restored.export_values(), agent.export_values());
    }

    #[test]
    fn test_metadata_roundtrips() {
        let agent = trained_agent();
        let metadata = TrainingMetadata {
            episodes_trained: Some(500),
            seed: Some(11),
        };
        let saved = SavedQTable::from_agent(&agent, metadata);

        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedQTable = rmp_serde::from_slice(&bytes).unwrap();

        assert_eq!(loaded.metadata.episodes_trained, Some(500));
        assert_eq!(loaded.metadata.seed, Some(11));
        assert_eq!(loaded.states(), saved.states());
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let agent = trained_agent();
        let mut saved = SavedQTable::from_agent(&agent, TrainingMetadata::default());
        saved.version = 99;

        let mut target = QLearningAgent::new(AgentConfig::default()).unwrap();
        let result = saved.apply_to(&mut target);

        assert!(matches!(
            result,
            Err(Error::UnsupportedVersion { version: 99, .. })
        ));
    }

    #[test]
    fn test_action_ordering_mismatch_is_rejected() {
        let agent = trained_agent();
        let saved = SavedQTable::from_agent(&agent, TrainingMetadata::default());

        let mut reordered = QLearningAgent::new(AgentConfig {
            actions: vec![1, 0, -1],
            ..AgentConfig::default()
        })
        .unwrap();
        let result = saved.apply_to(&mut reordered);

        assert!(matches!(result, Err(Error::ActionSetMismatch { .. })));
    }

    #[test]
    fn test_file_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("table.msgpack");

        let agent = trained_agent();
        let saved = SavedQTable::from_agent(&agent, TrainingMetadata::default());
        saved.save_to_file(&path).expect("Failed to save");

        let loaded = SavedQTable::load_from_file(&path).expect("Failed to load");
        assert_eq!(loaded.states(), saved.states());
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let result = SavedQTable::load_from_file("/tmp/nonexistent_qpong_12345.msgpack");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
