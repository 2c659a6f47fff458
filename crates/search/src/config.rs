//! Search configuration parameters.
//!
//! These parameters control the behavior of the UCT, Negamax, flat Monte
//! Carlo and rollout engines. Every struct has builder-style `with_*` setters and can be loaded
//! from a config file via serde; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

/// This exploration bias, 1/sqrt(2), was shown by Kocsis and Szepesvári to
/// satisfy the Hoeffding bound when rewards are in [0, 1].
pub const UNIT_EXPLORATION_BIAS: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// UCT configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UctConfig {
    /// Number of simulations to run before picking the best root action.
    pub num_simulations: usize,

    /// The multiplier C in the UCB1 exploration term `2C * sqrt(ln N / n)`.
    /// Higher values favor exploration, 0 is pure exploitation.
    pub exploration_bias: f64,

    /// Per-ply multiplier applied to rewards as they propagate upward.
    /// 1.0 = no discounting.
    pub discount_rate: f64,

    /// Simulations deeper than this are cut off with a direct evaluator call.
    pub max_depth: usize,

    /// For the first `num_initial_visits` visits to a tree position, play a
    /// random game instead of expanding the tree further. Saves memory.
    pub num_initial_visits: u32,

    /// Simulations per batch in asynchronous mode. The worker publishes its
    /// best-known action and checks for cancellation once per batch.
    pub simulations_per_batch: usize,
}

impl Default for UctConfig {
    fn default() -> Self {
        Self {
            num_simulations: 100_000,
            exploration_bias: UNIT_EXPLORATION_BIAS,
            discount_rate: 1.0,
            max_depth: 50,
            num_initial_visits: 0,
            simulations_per_batch: 1000,
        }
    }
}

impl UctConfig {
    /// Create a new config with the specified number of simulations.
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    pub fn with_exploration_bias(mut self, exploration_bias: f64) -> Self {
        self.exploration_bias = exploration_bias;
        self
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_num_initial_visits(mut self, num_initial_visits: u32) -> Self {
        self.num_initial_visits = num_initial_visits;
        self
    }

    /// Batch size is clamped to at least one simulation.
    pub fn with_simulations_per_batch(mut self, simulations_per_batch: usize) -> Self {
        self.simulations_per_batch = simulations_per_batch.max(1);
        self
    }
}

/// Negamax configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegamaxConfig {
    /// Depth to search to before evaluating positions.
    pub search_depth: usize,
}

impl Default for NegamaxConfig {
    fn default() -> Self {
        Self { search_depth: 4 }
    }
}

impl NegamaxConfig {
    pub fn with_search_depth(search_depth: usize) -> Self {
        Self { search_depth }
    }
}

/// Flat Monte Carlo configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Random games to play before picking the best root action.
    pub num_simulations: usize,

    /// Maximum number of random actions in one game.
    pub max_depth: usize,

    /// Per-ply multiplier applied to each game's final score.
    pub discount_rate: f64,

    /// Games per batch in asynchronous mode.
    pub simulations_per_batch: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_simulations: 100_000,
            max_depth: 500,
            discount_rate: 1.0,
            simulations_per_batch: 1000,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    /// Batch size is clamped to at least one game.
    pub fn with_simulations_per_batch(mut self, simulations_per_batch: usize) -> Self {
        self.simulations_per_batch = simulations_per_batch.max(1);
        self
    }
}

/// Random playout configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Maximum number of random actions in one playout.
    pub max_depth: usize,

    /// Per-ply multiplier applied to the playout's final score.
    pub discount_rate: f64,

    /// Playouts averaged per evaluation.
    pub num_playouts: usize,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            discount_rate: 1.0,
            num_playouts: 1,
        }
    }
}

impl RolloutConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    /// Playout count is clamped to at least one.
    pub fn with_num_playouts(mut self, num_playouts: usize) -> Self {
        self.num_playouts = num_playouts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uct_config() {
        let config = UctConfig::default();
        assert_eq!(config.num_simulations, 100_000);
        assert!((config.exploration_bias - 0.70710678).abs() < 1e-6);
        assert_eq!(config.discount_rate, 1.0);
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.num_initial_visits, 0);
    }

    #[test]
    fn test_uct_builder() {
        let config = UctConfig::with_simulations(500)
            .with_exploration_bias(0.0)
            .with_discount_rate(0.9)
            .with_max_depth(10)
            .with_num_initial_visits(3)
            .with_simulations_per_batch(0);

        assert_eq!(config.num_simulations, 500);
        assert_eq!(config.exploration_bias, 0.0);
        assert_eq!(config.discount_rate, 0.9);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.num_initial_visits, 3);
        assert_eq!(config.simulations_per_batch, 1);
    }

    #[test]
    fn test_default_negamax_config() {
        assert_eq!(NegamaxConfig::default().search_depth, 4);
        assert_eq!(NegamaxConfig::with_search_depth(9).search_depth, 9);
    }

    #[test]
    fn test_monte_carlo_config() {
        let config = MonteCarloConfig::default();
        assert_eq!(config.num_simulations, 100_000);
        assert_eq!(config.max_depth, 500);

        let config = MonteCarloConfig::with_simulations(20)
            .with_max_depth(9)
            .with_discount_rate(0.8)
            .with_simulations_per_batch(0);
        assert_eq!(config.num_simulations, 20);
        assert_eq!(config.max_depth, 9);
        assert_eq!(config.discount_rate, 0.8);
        assert_eq!(config.simulations_per_batch, 1);
    }

    #[test]
    fn test_rollout_builder() {
        let config = RolloutConfig::default()
            .with_max_depth(20)
            .with_discount_rate(0.5)
            .with_num_playouts(0);
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.discount_rate, 0.5);
        assert_eq!(config.num_playouts, 1);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: UctConfig = serde_json::from_str(r#"{"num_simulations": 42}"#).unwrap();
        assert_eq!(config.num_simulations, 42);
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.exploration_bias, UNIT_EXPLORATION_BIAS);
    }
}
