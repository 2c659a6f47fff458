//! Position evaluation abstraction.
//!
//! An `Evaluator` turns a (player, state) pair into a score for that player.
//! Both search engines consume evaluators at their horizon, and any agent can
//! be adapted into one, which is how the engines compose.

use crate::{Player, Result, State};

/// Trait for scoring game positions.
///
/// The score is from the perspective of `player`: higher is better for that
/// player. Zero-sum games should keep scores in [-1, 1], with +1 a win and
/// -1 a loss. Evaluators may be stochastic (random playouts), so equal inputs
/// need not produce equal outputs.
pub trait Evaluator<S: State>: Send {
    /// Evaluate `state` for `player`.
    ///
    /// # Errors
    /// Propagates invariant violations detected while inspecting or
    /// simulating from the state.
    fn evaluate(&mut self, player: Player, state: &S) -> Result<f64>;
}

/// Scores a position solely by who has won it: +1 win, -1 loss, 0 otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct WinLossEvaluator;

impl WinLossEvaluator {
    /// Score of `winner` for `player`.
    pub fn score(player: Player, winner: Option<Player>) -> f64 {
        match winner {
            Some(w) if w == player => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }
}

impl<S: State> Evaluator<S> for WinLossEvaluator {
    fn evaluate(&mut self, player: Player, state: &S) -> Result<f64> {
        Ok(Self::score(player, state.winner()))
    }
}

impl<S, F> Evaluator<S> for F
where
    S: State,
    F: FnMut(Player, &S) -> f64 + Send,
{
    fn evaluate(&mut self, player: Player, state: &S) -> Result<f64> {
        Ok(self(player, state))
    }
}
