//! The `Agent` facade shared by every engine.
//!
//! An agent picks an action for a player in a given state, either by running
//! its search to completion or as an anytime search on a background thread
//! that is stopped and collected later.

use gail_core::{ActionScore, Player, Result, SearchError, State};
use rand::Rng;
use std::thread;
use std::time::Duration;

/// An entity that picks actions to take in a game state.
///
/// Agents own whatever engine state they need (configuration, evaluator,
/// random number generator, search tree) and never mutate the caller's
/// state: searches run on a private copy.
pub trait Agent<S: State>: Send {
    /// Search from `state` for `player` and return the best action found.
    ///
    /// # Errors
    /// - `SearchError::NoLegalActions` if `state` is terminal
    /// - `SearchError::SearchInProgress` if an asynchronous search is running
    fn pick_action(&mut self, player: Player, state: &S) -> Result<ActionScore<S::Action>>;

    /// Start searching from `state` for `player` on a background thread.
    ///
    /// Returns immediately. The search keeps improving its answer until
    /// [`get_asynchronous_search_result`](Agent::get_asynchronous_search_result)
    /// is called.
    ///
    /// # Errors
    /// - `SearchError::NoLegalActions` if `state` is terminal
    /// - `SearchError::SearchInProgress` if a search is already running
    fn begin_asynchronous_search(&mut self, player: Player, state: &S) -> Result<()>;

    /// Stop the asynchronous search and return the best action it found.
    ///
    /// Returns `None` if no search was started or it had not yet produced an
    /// answer.
    fn get_asynchronous_search_result(&mut self) -> Option<ActionScore<S::Action>>;

    /// A blank state in the representation this agent searches.
    fn state_representation_template(&self) -> S {
        S::default()
    }

    /// Pick an action, optionally under a wall-clock budget.
    ///
    /// With no budget this is [`pick_action`](Agent::pick_action). With a
    /// budget, an asynchronous search runs for that long and its latest
    /// answer is returned.
    ///
    /// # Errors
    /// `SearchError::NotReady` if the budget ran out before any answer was
    /// published, plus everything `pick_action` or
    /// `begin_asynchronous_search` can return.
    fn pick_action_blocking(
        &mut self,
        player: Player,
        state: &S,
        time_budget: Option<Duration>,
    ) -> Result<ActionScore<S::Action>> {
        let Some(budget) = time_budget else {
            return self.pick_action(player, state);
        };
        self.begin_asynchronous_search(player, state)?;
        thread::sleep(budget);
        self.get_asynchronous_search_result()
            .ok_or(SearchError::NotReady)
    }
}

impl<S: State, A: Agent<S> + ?Sized> Agent<S> for Box<A> {
    fn pick_action(&mut self, player: Player, state: &S) -> Result<ActionScore<S::Action>> {
        (**self).pick_action(player, state)
    }

    fn begin_asynchronous_search(&mut self, player: Player, state: &S) -> Result<()> {
        (**self).begin_asynchronous_search(player, state)
    }

    fn get_asynchronous_search_result(&mut self) -> Option<ActionScore<S::Action>> {
        (**self).get_asynchronous_search_result()
    }

    fn state_representation_template(&self) -> S {
        (**self).state_representation_template()
    }

    fn pick_action_blocking(
        &mut self,
        player: Player,
        state: &S,
        time_budget: Option<Duration>,
    ) -> Result<ActionScore<S::Action>> {
        (**self).pick_action_blocking(player, state, time_budget)
    }
}

/// Agent that plays a uniformly random legal action with score 0.
///
/// Useful as a baseline opponent.
#[derive(Clone, Debug)]
pub struct RandomAgent<R, A> {
    rng: R,
    pending: Option<ActionScore<A>>,
}

impl<R: Rng, A> RandomAgent<R, A> {
    pub fn new(rng: R) -> Self {
        Self { rng, pending: None }
    }
}

impl<S, R> Agent<S> for RandomAgent<R, S::Action>
where
    S: State,
    R: Rng + Send,
{
    fn pick_action(&mut self, _player: Player, state: &S) -> Result<ActionScore<S::Action>> {
        let action = state
            .random_legal_action(&mut self.rng)
            .ok_or(SearchError::NoLegalActions)?;
        Ok(ActionScore::new(action, 0.0))
    }

    fn begin_asynchronous_search(&mut self, player: Player, state: &S) -> Result<()> {
        if self.pending.is_some() {
            return Err(SearchError::SearchInProgress);
        }
        self.pending = Some(self.pick_action(player, state)?);
        Ok(())
    }

    fn get_asynchronous_search_result(&mut self) -> Option<ActionScore<S::Action>> {
        self.pending.take()
    }
}
