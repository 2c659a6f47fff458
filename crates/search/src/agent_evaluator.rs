//! Adapting agents into evaluators.
//!
//! Any agent's reported score can serve as another engine's position
//! evaluation, which is how engines compose: a negamax search can value its
//! horizon with a short UCT search, for instance.

use crate::agent::Agent;
use gail_core::{Evaluator, Player, Result, SearchError, State, WinLossEvaluator};
use std::time::Duration;

/// How long an [`AgentEvaluator`] lets its agent search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationBudget {
    /// Run the agent's search to completion.
    Blocking,

    /// Run an asynchronous search for this long and take its latest answer.
    /// A search that published nothing scores 0.
    WallClock(Duration),
}

/// Evaluator that scores a position by asking an agent for its best action
/// and returning the score the agent reported.
#[derive(Debug)]
pub struct AgentEvaluator<A> {
    agent: A,
    budget: EvaluationBudget,
}

impl<A> AgentEvaluator<A> {
    /// Evaluate by running `agent` to completion.
    pub fn new(agent: A) -> Self {
        Self::with_budget(agent, EvaluationBudget::Blocking)
    }

    pub fn with_budget(agent: A, budget: EvaluationBudget) -> Self {
        Self { agent, budget }
    }

    pub fn budget(&self) -> EvaluationBudget {
        self.budget
    }

    /// Recover the wrapped agent.
    pub fn into_inner(self) -> A {
        self.agent
    }
}

impl<S, A> Evaluator<S> for AgentEvaluator<A>
where
    S: State,
    A: Agent<S>,
{
    fn evaluate(&mut self, player: Player, state: &S) -> Result<f64> {
        if state.is_terminal() {
            return Ok(WinLossEvaluator::score(player, state.winner()));
        }

        let mut represented = self.agent.state_representation_template();
        represented.initialize_from(state);

        let time_budget = match self.budget {
            EvaluationBudget::Blocking => None,
            EvaluationBudget::WallClock(budget) => Some(budget),
        };
        match self.agent.pick_action_blocking(player, &represented, time_budget) {
            Ok(result) => Ok(result.score),
            Err(SearchError::NotReady) => Ok(0.0),
            Err(err) => Err(err),
        }
    }
}
