//! UCT (Upper Confidence bounds applied to Trees) search.
//!
//! Each simulation starts from a private copy of the root state and walks the
//! tree with UCB1 selection, descending into lazily created nodes until it
//! hits a terminal state, the depth limit, or a node that has not yet been
//! visited `num_initial_visits` times (which is valued by a random playout).
//! The resulting reward is negated at every ply on the way back up, so each
//! node stores rewards from the point of view of the player who moved into
//! it.

use crate::{
    agent::Agent,
    config::UctConfig,
    node::{NodeId, NodeStats},
    rollout::playout,
    tree::Tree,
    worker::Worker,
};
use gail_core::{ActionScore, Evaluator, Player, Result, SearchError, State, WinLossEvaluator};
use rand::Rng;
use tracing::{debug, trace};

/// Exploration priority of a child or parent that has never been visited.
///
/// Larger than any reachable UCB1 value, so unvisited children are always
/// tried before visited ones.
pub const UNVISITED_PRIORITY: f64 = 1e9;

/// Priorities are scaled by this much before random jitter in [0, 1) is
/// added, so jitter only separates (near-)equal priorities.
const TIE_BREAK_SCALE: f64 = 1e6;

/// UCB1 priority of a child.
///
/// `avg(child) + 2C * sqrt(ln N(parent) / N(child))`, or
/// [`UNVISITED_PRIORITY`] plus the average if either count is zero.
pub fn uct_priority(child: &NodeStats, parent_visits: u32, exploration_bias: f64) -> f64 {
    let exploration = if parent_visits == 0 || child.visit_count == 0 {
        UNVISITED_PRIORITY
    } else {
        2.0 * exploration_bias * ((parent_visits as f64).ln() / child.visit_count as f64).sqrt()
    };
    child.average_reward() + exploration
}

/// Everything a UCT search needs, moved into the worker thread during
/// asynchronous searches.
struct UctEngine<S: State, E, R> {
    config: UctConfig,
    evaluator: E,
    rng: R,
    tree: Tree<S::Action>,
}

impl<S, E, R> UctEngine<S, E, R>
where
    S: State,
    E: Evaluator<S>,
    R: Rng,
{
    /// Run `num_simulations` simulations from `root`, adding to the current
    /// tree.
    fn run_batch(&mut self, root: &S, num_simulations: usize) -> Result<()> {
        let mover = root.current_player();
        for _ in 0..num_simulations {
            let mut state = root.clone();
            self.simulate(NodeId::ROOT, mover, &mut state, 0)?;
        }
        Ok(())
    }

    /// Run one simulation through `node`, where `player` is to move in
    /// `state`.
    ///
    /// Returns the reward recorded at `node`, which is from the point of view
    /// of the player who moved into it.
    fn simulate(&mut self, node: NodeId, player: Player, state: &mut S, depth: usize) -> Result<f64> {
        if depth > self.config.max_depth || state.is_terminal() {
            let reward = -self.evaluator.evaluate(player, state)?;
            self.tree.record(node, reward);
            return Ok(reward);
        }

        if self.tree.get(node).stats.visit_count < self.config.num_initial_visits {
            let remaining = self.config.max_depth - depth;
            let reward = -playout(
                state,
                player,
                remaining,
                self.config.discount_rate,
                &mut self.evaluator,
                &mut self.rng,
            )?;
            self.tree.record(node, reward);
            return Ok(reward);
        }

        let action = self.select_action(node, state)?;
        state.perform(action);
        let child = self.tree.child_or_insert(node, action);
        let next_player = state.current_player();

        let reward = self.config.discount_rate * -self.simulate(child, next_player, state, depth + 1)?;
        self.tree.record(node, reward);
        Ok(reward)
    }

    /// Pick the action to descend from `node` by UCB1, breaking ties at
    /// random.
    fn select_action(&mut self, node: NodeId, state: &S) -> Result<S::Action> {
        let parent_visits = self.tree.get(node).stats.visit_count;
        let mut best_action = None;
        let mut best_priority = f64::NEG_INFINITY;

        for action in state.legal_actions() {
            let child = self.tree.child_stats(node, action);
            let priority = uct_priority(&child, parent_visits, self.config.exploration_bias)
                * TIE_BREAK_SCALE
                + self.rng.gen::<f64>();
            if priority > best_priority {
                best_priority = priority;
                best_action = Some(action);
            }
        }

        best_action.ok_or_else(|| {
            SearchError::InvariantViolation(format!(
                "non-terminal state at ply {} has no legal actions",
                state.ply()
            ))
        })
    }

    /// The root child with the highest average reward among visited
    /// children, first in enumeration order on ties. The score is from the
    /// point of view of the player to move at the root.
    ///
    /// Falls back to the first legal action with score 0.0 when no child has
    /// been visited.
    fn best_action(&self, root: &S) -> Result<ActionScore<S::Action>> {
        let actions = root.legal_actions();
        let first = *actions.first().ok_or_else(|| {
            SearchError::InvariantViolation(format!(
                "non-terminal root at ply {} has no legal actions",
                root.ply()
            ))
        })?;

        let mut best: Option<ActionScore<S::Action>> = None;
        for action in actions {
            let stats = self.tree.child_stats(NodeId::ROOT, action);
            if stats.visit_count == 0 {
                continue;
            }
            let average = stats.average_reward();
            if best.map_or(true, |b| average > b.score) {
                best = Some(ActionScore::new(action, average));
            }
        }

        Ok(best.unwrap_or(ActionScore::new(first, 0.0)))
    }

    /// [`best_action`](Self::best_action) scored for `player`.
    fn decision(&self, player: Player, root: &S) -> Result<ActionScore<S::Action>> {
        let best = self.best_action(root)?;
        Ok(ActionScore::new(
            best.action,
            player.score_from(root.current_player(), best.score),
        ))
    }

    fn search(&mut self, player: Player, root: &S) -> Result<ActionScore<S::Action>> {
        if root.is_terminal() {
            return Err(SearchError::NoLegalActions);
        }
        self.tree.clear();
        self.run_batch(root, self.config.num_simulations)?;
        let best = self.decision(player, root)?;

        debug!(
            engine = "uct",
            simulations = self.config.num_simulations,
            nodes = self.tree.len(),
            action = ?best.action,
            score = best.score,
            "decision complete"
        );
        Ok(best)
    }
}

/// UCT agent.
///
/// Generic over:
/// - `S`: The state being searched
/// - `E`: The evaluator applied at terminal states and the depth limit
/// - `R`: The random number generator
pub struct UctSearch<S: State, E = WinLossEvaluator, R = rand_chacha::ChaCha8Rng> {
    engine: Option<UctEngine<S, E, R>>,
    worker: Option<Worker<UctEngine<S, E, R>, S::Action>>,
}

impl<S, R> UctSearch<S, WinLossEvaluator, R>
where
    S: State,
    R: Rng,
{
    /// Create a UCT agent scoring leaves by who won.
    pub fn with_win_loss(config: UctConfig, rng: R) -> Self {
        Self::new(config, WinLossEvaluator, rng)
    }
}

impl<S, E, R> UctSearch<S, E, R>
where
    S: State,
    E: Evaluator<S>,
    R: Rng,
{
    /// Create a new UCT agent.
    pub fn new(config: UctConfig, evaluator: E, rng: R) -> Self {
        Self {
            engine: Some(UctEngine {
                config,
                evaluator,
                rng,
                tree: Tree::new(),
            }),
            worker: None,
        }
    }

    /// Configuration, or `None` while an asynchronous search owns the engine.
    pub fn config(&self) -> Option<&UctConfig> {
        self.engine.as_ref().map(|engine| &engine.config)
    }

    /// Statistics of every root child created by the last search, in
    /// creation order.
    ///
    /// Empty while an asynchronous search owns the engine.
    pub fn root_statistics(&self) -> Vec<(S::Action, NodeStats)> {
        let Some(engine) = &self.engine else {
            return Vec::new();
        };
        engine
            .tree
            .root()
            .children
            .iter()
            .map(|(action, id)| (*action, engine.tree.get(*id).stats.clone()))
            .collect()
    }

    fn engine_mut(&mut self) -> Result<&mut UctEngine<S, E, R>> {
        self.engine.as_mut().ok_or(SearchError::SearchInProgress)
    }
}

impl<S, E, R> Agent<S> for UctSearch<S, E, R>
where
    S: State,
    E: Evaluator<S> + 'static,
    R: Rng + Send + 'static,
{
    fn pick_action(&mut self, player: Player, state: &S) -> Result<ActionScore<S::Action>> {
        self.engine_mut()?.search(player, state)
    }

    fn begin_asynchronous_search(&mut self, player: Player, state: &S) -> Result<()> {
        if state.is_terminal() {
            return Err(SearchError::NoLegalActions);
        }
        let mut engine = self.engine.take().ok_or(SearchError::SearchInProgress)?;
        engine.tree.clear();
        let root = state.clone();

        self.worker = Some(Worker::spawn(engine, move |engine, cancel, publisher| {
            let batch = engine.config.simulations_per_batch.max(1);
            let mut simulations = 0;
            while !cancel.is_cancelled() {
                engine.run_batch(&root, batch)?;
                simulations += batch;
                let best = engine.decision(player, &root)?;
                trace!(engine = "uct", simulations, action = ?best.action, score = best.score, "publish");
                publisher.publish(best);
            }
            debug!(engine = "uct", simulations, nodes = engine.tree.len(), "asynchronous search stopped");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{TicTacToeAction, TicTacToeState};
    use gail_core::UndoToken;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    // Simple test game: race to 5
    // Players take turns adding 1 or 2. First to reach exactly 5 wins.
    // First player can always win with optimal play.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct RaceState {
        count: u8,
        ply: u32,
    }

    impl State for RaceState {
        type Action = u8;

        fn legal_actions(&self) -> Vec<u8> {
            match self.count {
                0..=3 => vec![1, 2],
                4 => vec![1],
                _ => Vec::new(),
            }
        }

        fn perform(&mut self, action: u8) -> UndoToken {
            self.count += action;
            self.ply += 1;
            UndoToken::new(self.ply, 0)
        }

        fn undo(&mut self, action: u8, _token: UndoToken) {
            self.count -= action;
            self.ply -= 1;
        }

        fn reset_to_start(&mut self) {
            *self = Self::default();
        }

        fn is_terminal(&self) -> bool {
            self.count >= 5
        }

        fn winner(&self) -> Option<Player> {
            // Player who just moved reached 5 and wins
            self.is_terminal().then(|| self.current_player().opponent())
        }

        fn current_player(&self) -> Player {
            if self.ply % 2 == 0 {
                Player::One
            } else {
                Player::Two
            }
        }

        fn ply(&self) -> u32 {
            self.ply
        }
    }

    fn uct(simulations: usize, seed: u64) -> UctSearch<RaceState> {
        UctSearch::with_win_loss(
            UctConfig::with_simulations(simulations),
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    #[test]
    fn test_uct_priority() {
        let unvisited = NodeStats::default();
        assert_eq!(uct_priority(&unvisited, 10, 1.0), UNVISITED_PRIORITY);

        let visited = NodeStats {
            visit_count: 4,
            total_reward: 2.0,
        };
        assert_eq!(uct_priority(&visited, 0, 1.0), 0.5 + UNVISITED_PRIORITY);

        let expected = 0.5 + 2.0 * 0.5 * ((16f64).ln() / 4.0).sqrt();
        assert!((uct_priority(&visited, 16, 0.5) - expected).abs() < 1e-12);

        // No exploration: just the average
        assert_eq!(uct_priority(&visited, 16, 0.0), 0.5);
    }

    #[test]
    fn test_uct_basic() {
        let mut search = uct(500, 42);
        let state = RaceState::new_game();

        let result = search.pick_action(Player::One, &state).unwrap();
        assert!(state.is_legal(result.action));
        assert!((-1.0..=1.0).contains(&result.score));

        // Every simulation passes through exactly one root child
        let visits: u32 = search.root_statistics().iter().map(|(_, s)| s.visit_count).sum();
        assert_eq!(visits, 500);
    }

    #[test]
    fn test_uct_finds_winning_line() {
        // From 0, adding 2 leaves the opponent at 2, a lost position
        let mut search = uct(2000, 1);
        let result = search.pick_action(Player::One, &RaceState::new_game()).unwrap();
        assert_eq!(result.action, 2);
        assert!(result.score > 0.0);
    }

    #[test]
    fn test_uct_deterministic() {
        let run_search = |seed: u64| {
            let mut search = uct(300, seed);
            let result = search.pick_action(Player::One, &RaceState::new_game()).unwrap();
            (result, search.root_statistics())
        };

        // Same seed should produce same results
        assert_eq!(run_search(12345), run_search(12345));
    }

    #[test]
    fn test_uct_terminal_root() {
        let mut search = uct(10, 0);
        let state = RaceState { count: 5, ply: 3 };
        assert_eq!(search.pick_action(Player::Two, &state), Err(SearchError::NoLegalActions));
        assert_eq!(
            search.begin_asynchronous_search(Player::Two, &state),
            Err(SearchError::NoLegalActions)
        );
    }

    #[test]
    fn test_uct_does_not_mutate_input() {
        let mut search = uct(200, 3);
        let state = RaceState::new_game();
        search.pick_action(Player::One, &state).unwrap();
        assert_eq!(state, RaceState::new_game());
    }

    fn node_count<S: State>(search: &UctSearch<S>) -> usize {
        search.engine.as_ref().map_or(0, |engine| engine.tree.len())
    }

    #[test]
    fn test_uct_initial_visits_limit_tree_growth() {
        let state = TicTacToeState::new_game();
        let grown = |num_initial_visits: u32| {
            let config = UctConfig::with_simulations(1000).with_num_initial_visits(num_initial_visits);
            let mut search: UctSearch<TicTacToeState> =
                UctSearch::with_win_loss(config, ChaCha8Rng::seed_from_u64(8));
            let result = search.pick_action(Player::One, &state).unwrap();
            assert!(state.is_legal(result.action));
            node_count(&search)
        };

        let full = grown(0);
        let limited = grown(5);
        // Each simulation creates at most one node below a visited position
        assert!(limited <= 1001, "{} nodes", limited);
        assert!(limited * 2 < full, "{} nodes with a threshold, {} without", limited, full);
    }

    #[test]
    fn test_uct_discounts_per_ply() {
        // From 3: adding 2 wins now, adding 1 loses two plies later
        let state = RaceState { count: 3, ply: 0 };
        let average_of = |discount_rate: f64, action: u8| {
            let config = UctConfig::with_simulations(200).with_discount_rate(discount_rate);
            let mut search: UctSearch<RaceState> =
                UctSearch::with_win_loss(config, ChaCha8Rng::seed_from_u64(5));
            let result = search.pick_action(Player::One, &state).unwrap();
            assert_eq!(result.action, 2);
            assert_eq!(result.score, 1.0);
            search
                .root_statistics()
                .into_iter()
                .find(|(a, _)| *a == action)
                .map(|(_, stats)| stats.average_reward())
                .unwrap()
        };

        assert_eq!(average_of(1.0, 1), -1.0);
        assert_eq!(average_of(0.5, 1), -0.5);
        // The immediate win is recorded undiscounted at the child itself
        assert_eq!(average_of(0.5, 2), 1.0);
    }

    #[test]
    fn test_uct_max_depth_zero_evaluates_below_root() {
        let state = TicTacToeState::new_game();
        let evaluator = |_: Player, child: &TicTacToeState| {
            assert_eq!(child.ply(), 1, "evaluated below the first ply");
            0.0
        };
        let config = UctConfig::with_simulations(100).with_max_depth(0);
        let mut search = UctSearch::new(config, evaluator, ChaCha8Rng::seed_from_u64(3));

        search.pick_action(Player::One, &state).unwrap();
        let stats = search.root_statistics();
        assert_eq!(stats.len(), 9);
        assert_eq!(stats.iter().map(|(_, s)| s.visit_count).sum::<u32>(), 100);
        assert_eq!(search.engine.as_ref().map(|e| e.tree.len()), Some(10));

        // A winning child is still recognised at the cutoff
        let mut winning = TicTacToeState::new_game();
        for cell in [0, 3, 1, 4] {
            winning.perform(TicTacToeAction::new(cell));
        }
        let config = UctConfig::with_simulations(100).with_max_depth(0);
        let mut search: UctSearch<TicTacToeState> =
            UctSearch::with_win_loss(config, ChaCha8Rng::seed_from_u64(3));
        let result = search.pick_action(Player::One, &winning).unwrap();
        assert_eq!(result.action, TicTacToeAction::new(2));
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_uct_scores_for_requested_player() {
        // X: 0, 1   O: 3, 4   X to move, 2 wins
        let mut state = TicTacToeState::new_game();
        for cell in [0, 3, 1, 4] {
            state.perform(TicTacToeAction::new(cell));
        }

        let mut search: UctSearch<TicTacToeState> =
            UctSearch::with_win_loss(UctConfig::with_simulations(3000), ChaCha8Rng::seed_from_u64(4));
        let for_x = search.pick_action(Player::One, &state).unwrap();
        let for_o = search.pick_action(Player::Two, &state).unwrap();

        assert_eq!(for_x.action, TicTacToeAction::new(2));
        assert_eq!(for_x.score, 1.0);
        assert_eq!(for_o.action, TicTacToeAction::new(2));
        assert_eq!(for_o.score, -1.0);
    }

    #[test]
    fn test_uct_takes_immediate_win() {
        // X: 0, 1   O: 3, 4   X to move, 2 wins
        let mut state = TicTacToeState::new_game();
        for cell in [0, 3, 1, 4] {
            state.perform(TicTacToeAction::new(cell));
        }

        let mut search: UctSearch<TicTacToeState> =
            UctSearch::with_win_loss(UctConfig::with_simulations(5000), ChaCha8Rng::seed_from_u64(4));
        let result = search.pick_action(Player::One, &state).unwrap();
        assert_eq!(result.action, TicTacToeAction::new(2));
    }

    #[test]
    fn test_uct_blocks_immediate_loss() {
        // X: 0, 8   O: 3, 4   X to move, must block 5
        let mut state = TicTacToeState::new_game();
        for cell in [0, 3, 8, 4] {
            state.perform(TicTacToeAction::new(cell));
        }

        let mut search: UctSearch<TicTacToeState> =
            UctSearch::with_win_loss(UctConfig::with_simulations(20_000), ChaCha8Rng::seed_from_u64(6));
        let result = search.pick_action(Player::One, &state).unwrap();
        assert_eq!(result.action, TicTacToeAction::new(5));
    }

    #[test]
    fn test_async_search_publishes_and_returns_engine() {
        let config = UctConfig::with_simulations(10).with_simulations_per_batch(50);
        let mut search: UctSearch<RaceState> =
            UctSearch::with_win_loss(config, ChaCha8Rng::seed_from_u64(2));
        let state = RaceState::new_game();

        search.begin_asynchronous_search(Player::One, &state).unwrap();
        assert!(search.config().is_none());
        assert_eq!(
            search.begin_asynchronous_search(Player::One, &state),
            Err(SearchError::SearchInProgress)
        );
        assert_eq!(search.pick_action(Player::One, &state), Err(SearchError::SearchInProgress));

        std::thread::sleep(Duration::from_millis(50));
        let result = search.get_asynchronous_search_result().unwrap();
        assert!(state.is_legal(result.action));

        // Engine is back and usable synchronously
        assert!(search.config().is_some());
        assert!(search.pick_action(Player::One, &state).is_ok());
        assert_eq!(search.get_asynchronous_search_result(), None);
    }
}
