//! Random playouts (flat Monte Carlo evaluation).
//!
//! A playout repeatedly performs a uniformly random legal action until the
//! game ends or a depth limit is hit, then scores the final position. It is
//! the cheapest evaluator available for any game and is also what UCT uses
//! below the part of the tree it has expanded.

use crate::config::RolloutConfig;
use gail_core::{Evaluator, Player, Result, SearchError, State, WinLossEvaluator};
use rand::Rng;

/// Play random actions on `state` for at most `max_plies` plies.
///
/// Returns `evaluator`'s score of the final position for `player`,
/// multiplied by `discount_rate` once per ply played. The state is mutated in
/// place and not restored, so callers pass a private copy.
///
/// # Errors
/// Returns `SearchError::InvariantViolation` if a non-terminal state reports
/// no legal actions.
pub fn playout<S, E, R>(
    state: &mut S,
    player: Player,
    max_plies: usize,
    discount_rate: f64,
    evaluator: &mut E,
    rng: &mut R,
) -> Result<f64>
where
    S: State,
    E: Evaluator<S> + ?Sized,
    R: Rng + ?Sized,
{
    let mut discount = 1.0;
    let mut plies = 0;

    while plies < max_plies && !state.is_terminal() {
        let action = state.random_legal_action(rng).ok_or_else(|| {
            SearchError::InvariantViolation(format!(
                "non-terminal state at ply {} has no legal actions",
                state.ply()
            ))
        })?;
        state.perform(action);
        discount *= discount_rate;
        plies += 1;
    }

    Ok(evaluator.evaluate(player, state)? * discount)
}

/// Evaluator using random playouts.
///
/// The final position of each playout is scored by a terminal evaluator,
/// [`WinLossEvaluator`] unless another one is supplied.
#[derive(Clone, Debug)]
pub struct RolloutEvaluator<R, E = WinLossEvaluator> {
    config: RolloutConfig,
    terminal_evaluator: E,
    rng: R,
}

impl<R: Rng> RolloutEvaluator<R> {
    /// Create a new rollout evaluator.
    ///
    /// # Arguments
    /// * `rng` - Random number generator for playouts
    /// * `max_depth` - Maximum actions in a random playout
    pub fn new(rng: R, max_depth: usize) -> Self {
        Self::from_config(rng, RolloutConfig::default().with_max_depth(max_depth))
    }

    pub fn from_config(rng: R, config: RolloutConfig) -> Self {
        Self {
            config,
            terminal_evaluator: WinLossEvaluator,
            rng,
        }
    }
}

impl<R: Rng, E> RolloutEvaluator<R, E> {
    /// Replace the evaluator applied to the final position of each playout.
    pub fn with_terminal_evaluator<E2>(self, terminal_evaluator: E2) -> RolloutEvaluator<R, E2> {
        RolloutEvaluator {
            config: self.config,
            terminal_evaluator,
            rng: self.rng,
        }
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }
}

impl<S, R, E> Evaluator<S> for RolloutEvaluator<R, E>
where
    S: State,
    R: Rng + Send,
    E: Evaluator<S>,
{
    fn evaluate(&mut self, player: Player, state: &S) -> Result<f64> {
        let num_playouts = self.config.num_playouts.max(1);
        let mut total = 0.0;

        for _ in 0..num_playouts {
            let mut simulation = state.clone();
            total += playout(
                &mut simulation,
                player,
                self.config.max_depth,
                self.config.discount_rate,
                &mut self.terminal_evaluator,
                &mut self.rng,
            )?;
        }

        Ok(total / num_playouts as f64)
    }
}
