//! Depth-limited negamax search with alpha-beta pruning.
//!
//! The search mutates a single private copy of the root state, performing an
//! action before recursing and undoing it afterwards, so no state is copied
//! per node. Inside the search scores are from the point of view of the
//! player to move and are negated on the way up; results are converted to the
//! point of view of the player the search was asked about.

use crate::{
    agent::Agent,
    config::{NegamaxConfig, RolloutConfig},
    rollout::RolloutEvaluator,
    worker::{CancellationToken, Worker},
};
use gail_core::{ActionScore, Evaluator, Player, Result, SearchError, State};
use rand::Rng;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Outcome of a negamax search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NegamaxResult<A> {
    /// First action reaching the best score, `None` when the search stopped
    /// at the root (depth 0 or a terminal state).
    pub action: Option<A>,

    /// Score of the position for the player searched for.
    pub score: f64,
}

struct NegamaxEngine<S, E> {
    config: NegamaxConfig,
    evaluator: E,
    _state: PhantomData<fn() -> S>,
}

impl<S, E> NegamaxEngine<S, E>
where
    S: State,
    E: Evaluator<S>,
{
    /// Search `state` to `depth` plies, `player` being the player to move.
    ///
    /// Returns `None` if `cancel` fired before the search completed; the
    /// state is restored either way.
    fn negamax(
        &mut self,
        player: Player,
        state: &mut S,
        depth: usize,
        mut alpha: f64,
        beta: f64,
        cancel: &CancellationToken,
    ) -> Result<Option<NegamaxResult<S::Action>>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if depth == 0 || state.is_terminal() {
            let score = self.evaluator.evaluate(player, state)?;
            return Ok(Some(NegamaxResult {
                action: None,
                score,
            }));
        }

        let actions = state.legal_actions();
        if actions.is_empty() {
            return Err(SearchError::InvariantViolation(format!(
                "non-terminal state at ply {} has no legal actions",
                state.ply()
            )));
        }

        let mut best = NegamaxResult {
            action: None,
            score: f64::NEG_INFINITY,
        };
        for action in actions {
            let token = state.perform(action);
            let next_player = state.current_player();
            let child = self.negamax(next_player, state, depth - 1, -beta, -alpha, cancel);
            state.undo(action, token);

            let Some(child) = child? else {
                return Ok(None);
            };
            let value = -child.score;
            if best.action.is_none() || value > best.score {
                best = NegamaxResult {
                    action: Some(action),
                    score: value,
                };
            }
            if value > alpha {
                alpha = value;
            }
            if alpha >= beta {
                break; // Cutoff
            }
        }

        Ok(Some(best))
    }

    /// Search `state` to `depth` from the root, scoring the result for
    /// `player`.
    fn search_root(
        &mut self,
        player: Player,
        state: &mut S,
        depth: usize,
        cancel: &CancellationToken,
    ) -> Result<Option<NegamaxResult<S::Action>>> {
        let mover = state.current_player();
        let result = self.negamax(mover, state, depth, f64::NEG_INFINITY, f64::INFINITY, cancel)?;
        Ok(result.map(|r| NegamaxResult {
            action: r.action,
            score: player.score_from(mover, r.score),
        }))
    }

    /// Pick an action for `player` by searching `state` to `depth`.
    ///
    /// At depth 0 the first legal action is chosen and scored by the
    /// evaluator.
    fn decide(
        &mut self,
        player: Player,
        state: &mut S,
        depth: usize,
        cancel: &CancellationToken,
    ) -> Result<Option<ActionScore<S::Action>>> {
        if state.is_terminal() {
            return Err(SearchError::NoLegalActions);
        }
        let first = *state.legal_actions().first().ok_or_else(|| {
            SearchError::InvariantViolation(format!(
                "non-terminal root at ply {} has no legal actions",
                state.ply()
            ))
        })?;
        let result = self.search_root(player, state, depth, cancel)?;
        Ok(result.map(|r| ActionScore::new(r.action.unwrap_or(first), r.score)))
    }
}

/// Negamax agent.
///
/// Generic over:
/// - `S`: The state being searched
/// - `E`: The evaluator applied at the search horizon
pub struct NegamaxSearch<S: State, E> {
    engine: Option<NegamaxEngine<S, E>>,
    worker: Option<Worker<NegamaxEngine<S, E>, S::Action>>,
}

impl<S, R> NegamaxSearch<S, RolloutEvaluator<R>>
where
    S: State,
    R: Rng + Send,
{
    /// Create a negamax agent that values its horizon with random playouts.
    pub fn with_rollouts(config: NegamaxConfig, rollouts: RolloutConfig, rng: R) -> Self {
        Self::new(config, RolloutEvaluator::from_config(rng, rollouts))
    }
}

impl<S, E> NegamaxSearch<S, E>
where
    S: State,
    E: Evaluator<S>,
{
    /// Create a new negamax agent.
    pub fn new(config: NegamaxConfig, evaluator: E) -> Self {
        Self {
            engine: Some(NegamaxEngine {
                config,
                evaluator,
                _state: PhantomData,
            }),
            worker: None,
        }
    }

    /// Configuration, or `None` while an asynchronous search owns the engine.
    pub fn config(&self) -> Option<&NegamaxConfig> {
        self.engine.as_ref().map(|engine| &engine.config)
    }

    /// Search a copy of `state` to the configured depth, scoring it for
    /// `player`.
    ///
    /// Unlike [`Agent::pick_action`] this also searches terminal states, and
    /// reports no action when the search stops at the root.
    pub fn search(&mut self, player: Player, state: &S) -> Result<NegamaxResult<S::Action>> {
        let engine = self.engine.as_mut().ok_or(SearchError::SearchInProgress)?;
        let depth = engine.config.search_depth;
        let never = CancellationToken::new();
        let mut state = state.clone();

        engine
            .search_root(player, &mut state, depth, &never)?
            .ok_or_else(|| SearchError::InvariantViolation("uncancellable search was cancelled".to_string()))
    }
}

impl<S, E> Agent<S> for NegamaxSearch<S, E>
where
    S: State,
    E: Evaluator<S> + 'static,
{
    fn pick_action(&mut self, player: Player, state: &S) -> Result<ActionScore<S::Action>> {
        let engine = self.engine.as_mut().ok_or(SearchError::SearchInProgress)?;
        let depth = engine.config.search_depth;
        let never = CancellationToken::new();
        let mut state = state.clone();

        let best = engine
            .decide(player, &mut state, depth, &never)?
            .ok_or_else(|| SearchError::InvariantViolation("uncancellable search was cancelled".to_string()))?;

        debug!(
            engine = "negamax",
            depth,
            action = ?best.action,
            score = best.score,
            "decision complete"
        );
        Ok(best)
    }

    /// Iterative deepening: complete searches at depth 1, 2, ... up to the
    /// configured depth, publishing after each one. A depth interrupted by
    /// cancellation is discarded.
    fn begin_asynchronous_search(&mut self, player: Player, state: &S) -> Result<()> {
        if state.is_terminal() {
            return Err(SearchError::NoLegalActions);
        }
        let engine = self.engine.take().ok_or(SearchError::SearchInProgress)?;
        let mut root = state.clone();

        self.worker = Some(Worker::spawn(engine, move |engine, cancel, publisher| {
            let max_depth = engine.config.search_depth;
            for depth in max_depth.min(1)..=max_depth {
                let Some(best) = engine.decide(player, &mut root, depth, cancel)? else {
                    break;
                };
                trace!(engine = "negamax", depth, action = ?best.action, score = best.score, "publish");
                publisher.publish(best);
            }
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
