//! Flat Monte Carlo search.
//!
//! Every simulation performs a uniformly random root action and then plays
//! random actions to the end of the game (or the depth limit). The root
//! action with the best average outcome wins. No tree is kept, so this is
//! the cheapest agent to run and a useful baseline for UCT.

use crate::{
    agent::Agent,
    config::MonteCarloConfig,
    node::NodeStats,
    rollout::playout,
    worker::Worker,
};
use gail_core::{ActionScore, Evaluator, Player, Result, SearchError, State, WinLossEvaluator};
use rand::Rng;
use tracing::{debug, trace};

struct MonteCarloEngine<S: State, E, R> {
    config: MonteCarloConfig,
    evaluator: E,
    rng: R,

    /// Outcomes of the current decision per root action, in enumeration
    /// order, from the point of view of the player searched for.
    outcomes: Vec<(S::Action, NodeStats)>,
}

impl<S, E, R> MonteCarloEngine<S, E, R>
where
    S: State,
    E: Evaluator<S>,
    R: Rng,
{
    fn reset(&mut self, root: &S) -> Result<()> {
        if root.is_terminal() {
            return Err(SearchError::NoLegalActions);
        }
        self.outcomes = root
            .legal_actions()
            .into_iter()
            .map(|action| (action, NodeStats::default()))
            .collect();
        if self.outcomes.is_empty() {
            return Err(SearchError::InvariantViolation(format!(
                "non-terminal root at ply {} has no legal actions",
                root.ply()
            )));
        }
        Ok(())
    }

    fn run_batch(&mut self, player: Player, root: &S, num_simulations: usize) -> Result<()> {
        for _ in 0..num_simulations {
            let index = self.rng.gen_range(0..self.outcomes.len());
            let action = self.outcomes[index].0;

            let mut state = root.clone();
            state.perform(action);
            let reward = self.config.discount_rate
                * playout(
                    &mut state,
                    player,
                    self.config.max_depth,
                    self.config.discount_rate,
                    &mut self.evaluator,
                    &mut self.rng,
                )?;
            self.outcomes[index].1.record(reward);
        }
        Ok(())
    }

    /// Highest average among tried actions, first in enumeration order on
    /// ties; the first action with score 0.0 if none was tried.
    fn best_action(&self) -> Result<ActionScore<S::Action>> {
        let (first, _) = self.outcomes.first().ok_or(SearchError::NoLegalActions)?;

        let mut best: Option<ActionScore<S::Action>> = None;
        for (action, stats) in &self.outcomes {
            if stats.visit_count == 0 {
                continue;
            }
            let average = stats.average_reward();
            if best.map_or(true, |b| average > b.score) {
                best = Some(ActionScore::new(*action, average));
            }
        }
        Ok(best.unwrap_or(ActionScore::new(*first, 0.0)))
    }

    fn search(&mut self, player: Player, root: &S) -> Result<ActionScore<S::Action>> {
        self.reset(root)?;
        self.run_batch(player, root, self.config.num_simulations)?;
        let best = self.best_action()?;

        debug!(
            engine = "monte_carlo",
            simulations = self.config.num_simulations,
            action = ?best.action,
            score = best.score,
            "decision complete"
        );
        Ok(best)
    }
}

/// Flat Monte Carlo agent.
///
/// Generic over:
/// - `S`: The state being searched
/// - `E`: The evaluator applied where each random game stops
/// - `R`: The random number generator
pub struct MonteCarloSearch<S: State, E = WinLossEvaluator, R = rand_chacha::ChaCha8Rng> {
    engine: Option<MonteCarloEngine<S, E, R>>,
    worker: Option<Worker<MonteCarloEngine<S, E, R>, S::Action>>,
}

impl<S, R> MonteCarloSearch<S, WinLossEvaluator, R>
where
    S: State,
    R: Rng,
{
    /// Create a Monte Carlo agent scoring random games by who won.
    pub fn with_win_loss(config: MonteCarloConfig, rng: R) -> Self {
        Self::new(config, WinLossEvaluator, rng)
    }
}

impl<S, E, R> MonteCarloSearch<S, E, R>
where
    S: State,
    E: Evaluator<S>,
    R: Rng,
{
    pub fn new(config: MonteCarloConfig, evaluator: E, rng: R) -> Self {
        Self {
            engine: Some(MonteCarloEngine {
                config,
                evaluator,
                rng,
                outcomes: Vec::new(),
            }),
            worker: None,
        }
    }

    /// Configuration, or `None` while an asynchronous search owns the engine.
    pub fn config(&self) -> Option<&MonteCarloConfig> {
        self.engine.as_ref().map(|engine| &engine.config)
    }

    /// Outcome statistics of every root action from the last search.
    ///
    /// Empty while an asynchronous search owns the engine.
    pub fn action_statistics(&self) -> Vec<(S::Action, NodeStats)> {
        self.engine
            .as_ref()
            .map_or_else(Vec::new, |engine| engine.outcomes.clone())
    }
}

impl<S, E, R> Agent<S> for MonteCarloSearch<S, E, R>
where
    S: State,
    E: Evaluator<S> + 'static,
    R: Rng + Send + 'static,
{
    fn pick_action(&mut self, player: Player, state: &S) -> Result<ActionScore<S::Action>> {
        self.engine
            .as_mut()
            .ok_or(SearchError::SearchInProgress)?
            .search(player, state)
    }

    fn begin_asynchronous_search(&mut self, player: Player, state: &S) -> Result<()> {
        let engine = self.engine.as_mut().ok_or(SearchError::SearchInProgress)?;
        engine.reset(state)?;
        let Some(engine) = self.engine.take() else {
            return Err(SearchError::SearchInProgress);
        };
        let root = state.clone();

        self.worker = Some(Worker::spawn(engine, move |engine, cancel, publisher| {
            let batch = engine.config.simulations_per_batch.max(1);
            let mut simulations = 0;
            while !cancel.is_cancelled() {
                engine.run_batch(player, &root, batch)?;
                simulations += batch;
                let best = engine.best_action()?;
                trace!(engine = "monte_carlo", simulations, action = ?best.action, score = best.score, "publish");
                publisher.publish(best);
            }
            debug!(engine = "monte_carlo", simulations, "asynchronous search stopped");
            Ok(())
        }));
        Ok(())
    }

    fn get_asynchronous_search_result(&mut self) -> Option<ActionScore<S::Action>> {
        let (engine, result) = self.worker.take()?.stop()?;
        self.engine = Some(engine);
        result
    }
}
