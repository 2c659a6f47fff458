//! Game tree search engines behind a common agent interface.
//!
//! This crate provides UCT and alpha-beta negamax agents that can search any
//! game implementing the `gail_core::State` trait.
//!
//! # Features
//!
//! - **Generic**: Works with any `State` implementation
//! - **UCT**: UCB1 selection over a lazily grown tree, random playouts below it
//! - **Negamax**: Depth-limited alpha-beta over perform/undo, no copying per node
//! - **Flat Monte Carlo**: Random games per root action, no tree
//! - **Anytime search**: Every agent can search on a background thread and be
//!   stopped at any time for its best answer so far
//! - **Composition**: Any agent can act as another engine's evaluator
//!
//! # Example
//!
//! ```
//! use gail_core::{Player, State};
//! use gail_search::{games::TicTacToeState, Agent, UctConfig, UctSearch};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let state = TicTacToeState::new_game();
//!
//! let config = UctConfig::with_simulations(1000);
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let mut uct = UctSearch::with_win_loss(config, rng);
//!
//! let result = uct.pick_action(Player::One, &state).unwrap();
//! println!("Best action: {} ({:.3})", result.action, result.score);
//! ```

pub mod agent;
pub mod agent_evaluator;
pub mod config;
pub mod games;
pub mod monte_carlo;
pub mod negamax;
pub mod node;
pub mod rollout;
mod tree;
pub mod uct;
mod worker;

pub use agent::{Agent, RandomAgent};
pub use agent_evaluator::{AgentEvaluator, EvaluationBudget};
pub use config::{MonteCarloConfig, NegamaxConfig, RolloutConfig, UctConfig};
pub use monte_carlo::MonteCarloSearch;
pub use negamax::{NegamaxResult, NegamaxSearch};
pub use node::NodeStats;
pub use rollout::{playout, RolloutEvaluator};
pub use uct::{uct_priority, UctSearch};
pub use worker::{CancellationToken, Publisher};
