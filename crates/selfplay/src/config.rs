//! Engine configuration for matches.
//!
//! Loaded from an optional JSON file; any section or field left out keeps
//! its default, and command-line flags override what the file says.

use anyhow::{Context, Result};
use gail_search::{MonteCarloConfig, NegamaxConfig, RolloutConfig, UctConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfplayConfig {
    pub uct: UctConfig,
    pub negamax: NegamaxConfig,
    pub monte_carlo: MonteCarloConfig,

    /// Playouts used by negamax to value its horizon.
    pub rollout: RolloutConfig,
}

impl SelfplayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply command-line overrides. The simulation count applies to both
    /// UCT and flat Monte Carlo.
    pub fn with_overrides(mut self, simulations: Option<usize>, depth: Option<usize>) -> Self {
        if let Some(simulations) = simulations {
            self.uct.num_simulations = simulations;
            self.monte_carlo.num_simulations = simulations;
        }
        if let Some(depth) = depth {
            self.negamax.search_depth = depth;
        }
        self
    }
}
