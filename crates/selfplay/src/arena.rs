//! Playing matches between agents and recording the results.

use crate::config::SelfplayConfig;
use anyhow::{Context, Result};
use clap::ValueEnum;
use gail_core::{ActionScore, Player, SearchError, State};
use gail_search::{Agent, MonteCarloSearch, NegamaxSearch, RandomAgent, UctSearch};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    #[value(name = "tictactoe")]
    TicTacToe,
    Connect4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Uct,
    Negamax,
    #[value(name = "montecarlo")]
    MonteCarlo,
    Random,
}

/// Result of a game from the point of view of the two agent kinds in the
/// match, regardless of who moved first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    FirstAgentWins,
    SecondAgentWins,
    Draw,
}

/// A single action in a game record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveRecord {
    pub ply: u32,
    pub agent: AgentKind,
    pub action: String,
    pub score: f64,
}

/// A complete game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRecord {
    pub index: usize,
    pub seed: u64,
    pub game: GameKind,

    /// Agent playing as Player One (moving first).
    pub player_one: AgentKind,
    pub player_two: AgentKind,

    pub moves: Vec<MoveRecord>,
    pub outcome: Outcome,
}

/// Settings shared by every game of a match.
#[derive(Clone, Debug)]
pub struct MatchSettings {
    pub game: GameKind,
    pub first: AgentKind,
    pub second: AgentKind,
    pub seed: u64,

    /// Wall-clock budget per move; `None` runs every search to completion.
    /// An agent with nothing to show when the budget runs out plays a random
    /// legal action.
    pub budget: Option<Duration>,

    pub config: SelfplayConfig,
}

impl MatchSettings {
    /// Seed of game `index`.
    pub fn game_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64 * 1000)
    }

    /// The agent kinds as (Player One, Player Two) for game `index`.
    ///
    /// The first agent moves first in even games.
    pub fn seating(&self, index: usize) -> (AgentKind, AgentKind) {
        if index % 2 == 0 {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        }
    }
}

/// Create an agent of the given kind.
pub fn build_agent<S: State>(kind: AgentKind, config: &SelfplayConfig, seed: u64) -> Box<dyn Agent<S>> {
    let rng = ChaCha8Rng::seed_from_u64(seed);
    match kind {
        AgentKind::Uct => Box::new(UctSearch::<S>::with_win_loss(config.uct.clone(), rng)),
        AgentKind::Negamax => Box::new(NegamaxSearch::<S, _>::with_rollouts(
            config.negamax.clone(),
            config.rollout.clone(),
            rng,
        )),
        AgentKind::MonteCarlo => Box::new(MonteCarloSearch::<S>::with_win_loss(
            config.monte_carlo.clone(),
            rng,
        )),
        AgentKind::Random => Box::new(RandomAgent::<_, S::Action>::new(rng)),
    }
}

/// Play game `index` of a match from the starting position.
pub fn play_game<S>(settings: &MatchSettings, index: usize) -> Result<GameRecord>
where
    S: State + Display,
    S::Action: Display,
{
    let seed = settings.game_seed(index);
    let (one, two) = settings.seating(index);
    let mut agents: [Box<dyn Agent<S>>; 2] = [
        build_agent(one, &settings.config, seed),
        build_agent(two, &settings.config, seed.wrapping_add(1)),
    ];
    let kinds = [one, two];
    let mut fallback = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));

    let mut state = S::new_game();
    let mut moves = Vec::new();

    while !state.is_terminal() {
        let player = state.current_player();
        let kind = kinds[player.index()];
        let result = match agents[player.index()].pick_action_blocking(player, &state, settings.budget) {
            Err(SearchError::NotReady) => {
                warn!(index, ?kind, ply = state.ply(), "no answer within budget, playing randomly");
                let action = state
                    .random_legal_action(&mut fallback)
                    .ok_or(SearchError::NoLegalActions)?;
                ActionScore::new(action, 0.0)
            }
            result => result
                .with_context(|| format!("{:?} failed to move at ply {}\n{}", kind, state.ply(), state))?,
        };

        state
            .try_perform(result.action)
            .with_context(|| format!("{:?} chose an illegal action", kind))?;
        moves.push(MoveRecord {
            ply: state.ply(),
            agent: kind,
            action: result.action.to_string(),
            score: result.score,
        });
    }

    let outcome = match state.winner() {
        None => Outcome::Draw,
        Some(winner) => {
            let winning_kind_is_first = match winner {
                Player::One => index % 2 == 0,
                Player::Two => index % 2 == 1,
            };
            if winning_kind_is_first {
                Outcome::FirstAgentWins
            } else {
                Outcome::SecondAgentWins
            }
        }
    };
    debug!(index, seed, plies = state.ply(), ?outcome, "game finished\n{}", state);

    Ok(GameRecord {
        index,
        seed,
        game: settings.game,
        player_one: one,
        player_two: two,
        moves,
        outcome,
    })
}

/// Wins, losses and draws of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
}

impl Tally {
    pub fn from_records(records: &[GameRecord]) -> Self {
        let mut tally = Self::default();
        for record in records {
            match record.outcome {
                Outcome::FirstAgentWins => tally.first_wins += 1,
                Outcome::SecondAgentWins => tally.second_wins += 1,
                Outcome::Draw => tally.draws += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.first_wins + self.second_wins + self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gail_search::games::{Connect4State, TicTacToeState};

    fn settings(first: AgentKind, second: AgentKind) -> MatchSettings {
        let config = SelfplayConfig::default().with_overrides(Some(200), Some(9));
        MatchSettings {
            game: GameKind::TicTacToe,
            first,
            second,
            seed: 42,
            budget: None,
            config,
        }
    }

    #[test]
    fn test_seating_alternates() {
        let settings = settings(AgentKind::Uct, AgentKind::Random);
        assert_eq!(settings.seating(0), (AgentKind::Uct, AgentKind::Random));
        assert_eq!(settings.seating(1), (AgentKind::Random, AgentKind::Uct));
        assert_ne!(settings.game_seed(0), settings.game_seed(1));
    }

    #[test]
    fn test_random_game_record() {
        let settings = settings(AgentKind::Random, AgentKind::Random);
        let record = play_game::<TicTacToeState>(&settings, 0).unwrap();

        assert!(record.moves.len() >= 5 && record.moves.len() <= 9);
        assert_eq!(record.moves[0].ply, 1);
        assert_eq!(record.player_one, AgentKind::Random);
    }

    #[test]
    fn test_deterministic_under_seed() {
        let settings = settings(AgentKind::Uct, AgentKind::Random);
        let a = play_game::<TicTacToeState>(&settings, 3).unwrap();
        let b = play_game::<TicTacToeState>(&settings, 3).unwrap();

        let actions = |r: &GameRecord| r.moves.iter().map(|m| m.action.clone()).collect::<Vec<_>>();
        assert_eq!(actions(&a), actions(&b));
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn test_negamax_never_loses_to_random() {
        let settings = settings(AgentKind::Negamax, AgentKind::Random);
        let records: Vec<GameRecord> = (0..4)
            .map(|i| play_game::<TicTacToeState>(&settings, i).unwrap())
            .collect();

        let tally = Tally::from_records(&records);
        assert_eq!(tally.second_wins, 0, "{:?}", tally);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn test_monte_carlo_against_random() {
        let settings = settings(AgentKind::MonteCarlo, AgentKind::Random);
        let record = play_game::<TicTacToeState>(&settings, 0).unwrap();

        assert_eq!(record.player_one, AgentKind::MonteCarlo);
        assert_eq!(record.moves[0].agent, AgentKind::MonteCarlo);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["player_one"], "montecarlo");
    }

    #[test]
    fn test_connect4_with_budget() {
        let mut settings = settings(AgentKind::Uct, AgentKind::Random);
        settings.game = GameKind::Connect4;
        settings.budget = Some(Duration::from_millis(5));

        let record = play_game::<Connect4State>(&settings, 0).unwrap();
        assert!(!record.moves.is_empty());
        assert_eq!(record.game, GameKind::Connect4);
    }

    #[test]
    fn test_record_serializes() {
        let settings = settings(AgentKind::Random, AgentKind::Random);
        let record = play_game::<TicTacToeState>(&settings, 0).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["game"], "tictactoe");
        assert_eq!(json["player_one"], "random");
        assert!(json["moves"].as_array().unwrap().len() >= 5);
    }
}
