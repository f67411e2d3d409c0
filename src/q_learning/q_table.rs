//! Q-table implementation for temporal difference learning

use std::collections::HashMap;

use crate::types::GridState;

/// Sparse Q-table mapping grid states to per-action value rows.
///
/// Rows are materialized lazily: the first read of a state inserts a zero
/// row, so unseen states always answer with zeros and never error. The table
/// only ever grows.
#[derive(Debug, Clone)]
pub struct QTable {
    /// Q-values: state -> one value per action slot
    q_values: HashMap<GridState, Vec<f64>>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
    /// Row width, fixed by the agent's action set
    num_actions: usize,
}

impl QTable {
    /// Create a new Q-table with empty storage.
    pub fn new(learning_rate: f64, discount_factor: f64, num_actions: usize) -> Self {
        Self {
            q_values: HashMap::new(),
            learning_rate,
            discount_factor,
            num_actions,
        }
    }

    fn row_mut(&mut self, state: &GridState) -> &mut Vec<f64> {
        self.q_values
            .entry(*state)
            .or_insert_with(|| vec![0.0; self.num_actions])
    }

    /// Value row for a state, materializing a zero row on first sight.
    pub fn values(&mut self, state: &GridState) -> &[f64] {
        self.row_mut(state)
    }

    /// Q-value for a state and action slot.
    pub fn get(&mut self, state: &GridState, action_index: usize) -> f64 {
        self.row_mut(state)[action_index]
    }

    /// Overwrite the Q-value for a state and action slot.
    pub fn set(&mut self, state: GridState, action_index: usize, value: f64) {
        self.row_mut(&state)[action_index] = value;
    }

    /// Maximum Q-value over the state's row.
    pub fn max_value(&mut self, state: &GridState) -> f64 {
        self.values(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// All action slots whose value equals the row maximum exactly.
    ///
    /// Fresh rows are all zeros, so every slot ties; the caller breaks the
    /// tie uniformly at random.
    pub fn greedy_indices(&mut self, state: &GridState) -> Vec<usize> {
        let row = self.values(state);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        row.iter()
            .enumerate()
            .filter(|&(_, &q)| q == max)
            .map(|(index, _)| index)
            .collect()
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// On terminal transitions the target is the reward alone and the
    /// successor row is left untouched.
    pub fn td_update(
        &mut self,
        state: &GridState,
        action_index: usize,
        reward: f64,
        next_state: &GridState,
        done: bool,
    ) {
        let max_next = if done { 0.0 } else { self.max_value(next_state) };
        let target = reward + self.discount_factor * max_next;

        let learning_rate = self.learning_rate;
        let row = self.row_mut(state);
        row[action_index] += learning_rate * (target - row[action_index]);
    }

    /// Number of states with materialized rows.
    pub fn len(&self) -> usize {
        self.q_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }

    pub(crate) fn export_values(&self) -> HashMap<GridState, Vec<f64>> {
        self.q_values.clone()
    }

    pub(crate) fn replace_values(&mut self, values: HashMap<GridState, Vec<f64>>) {
        self.q_values = values;
    }
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn test_unseen_state_reads_zero_and_materializes() {
        let mut qtable = QTable::new(0.2, 0.95, 3);

        assert!(qtable.is_empty());
        assert_eq!(qtable.get(&state(4), 0), 0.0);
        assert_eq!(qtable.len(), 1);
    }

    #[test]
    fn test_set_get() {
        let mut qtable = QTable::new(0.2, 0.95, 3);
        qtable.set(state(4), 1, 1.5);
        assert_eq!(qtable.get(&state(4), 1), 1.5);
    }

    #[test]
    fn test_max_value() {
        let mut qtable = QTable::new(0.2, 0.95, 3);
        qtable.set(state(4), 0, 0.5);
        qtable.set(state(4), 1, 1.5);
        qtable.set(state(4), 2, 0.8);

        assert_eq!(qtable.max_value(&state(4)), 1.5);
    }

    #[test]
    fn test_greedy_indices_unique_max() {
        let mut qtable = QTable::new(0.2, 0.95, 3);
        qtable.set(state(4), 0, 0.5);
        qtable.set(state(4), 1, 1.5);
        qtable.set(state(4), 2, 0.8);

        assert_eq!(qtable.greedy_indices(&state(4)), vec![1]);
    }

    #[test]
    fn test_greedy_indices_report_all_ties() {
        let mut qtable = QTable::new(0.2, 0.95, 3);

        // A fresh row ties across every slot.
        assert_eq!(qtable.greedy_indices(&state(4)), vec![0, 1, 2]);

        qtable.set(state(4), 0, 1.0);
        qtable.set(state(4), 2, 1.0);
        assert_eq!(qtable.greedy_indices(&state(4)), vec![0, 2]);
    }

    #[test]
    fn test_td_update_bootstraps_from_next_state() {
        let mut qtable = QTable::new(0.5, 0.99, 3);
        qtable.set(state(5), 1, 1.0);
        qtable.set(state(5), 2, 2.0);

        qtable.td_update(&state(4), 0, 0.0, &state(5), false);

        // Q(s,0) = 0.0 + 0.5 * (0.0 + 0.99 * 2.0 - 0.0) = 0.99
        assert!((qtable.get(&state(4), 0) - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_td_update_terminal_skips_next_state() {
        let mut qtable = QTable::new(0.5, 0.99, 3);
        qtable.set(state(5), 2, 100.0);

        qtable.td_update(&state(4), 0, -1.0, &state(6), true);

        // Q(s,0) = 0.0 + 0.5 * (-1.0 - 0.0) = -0.5, unaffected by state 5,
        // and the terminal successor row was never materialized.
        assert!((qtable.get(&state(4), 0) + 0.5).abs() < 1e-12);
        assert_eq!(qtable.len(), 2);
    }

    #[test]
    fn test_td_update_materializes_both_rows() {
        let mut qtable = QTable::new(0.2, 0.95, 3);

        qtable.td_update(&state(4), 0, 0.0, &state(5), false);

        assert_eq!(qtable.len(), 2);
    }
}
