//! Property-based tests for the bundled `State` implementations.
//!
//! - Round trip: perform then undo restores an identical state
//! - Enumeration consistency: after perform, every enumerated action is
//!   legal for the new player to move, and the set is empty only when the
//!   game is over

use gail_core::{Player, State};
use gail_search::games::{Connect4Action, Connect4State, TicTacToeState};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// =============================================================================
// Strategies for generating test inputs
// =============================================================================

fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Number of random plies to play; long enough to end either game.
fn arb_plies() -> impl Strategy<Value = usize> {
    0usize..50
}

// =============================================================================
// Generic checks
// =============================================================================

/// Play random actions, undo them all in reverse and compare every
/// intermediate state with a snapshot taken before the action.
fn check_round_trip<S>(seed: u64, plies: usize) -> Result<(), TestCaseError>
where
    S: State + PartialEq,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = S::new_game();
    let mut history = Vec::new();

    for _ in 0..plies {
        let Some(action) = state.random_legal_action(&mut rng) else {
            break;
        };
        let snapshot = state.clone();
        let token = state.perform(action);
        prop_assert_eq!(token.ply(), state.ply());
        history.push((action, token, snapshot));
    }

    while let Some((action, token, snapshot)) = history.pop() {
        state.try_undo(action, token).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&state, &snapshot);
    }
    prop_assert_eq!(state, S::new_game());
    Ok(())
}

/// After each random action, every enumerated action must be accepted by a
/// checked perform on a copy, the enumeration has no duplicates, and it is
/// empty exactly when the state is terminal.
fn check_enumeration<S: State>(seed: u64, plies: usize) -> Result<(), TestCaseError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = S::new_game();

    for _ in 0..plies {
        let Some(action) = state.random_legal_action(&mut rng) else {
            break;
        };
        let mover = state.current_player();
        state.perform(action);
        prop_assert_eq!(state.current_player(), state.player_after(mover));

        let actions = state.legal_actions();
        prop_assert_eq!(actions.is_empty(), state.is_terminal());

        let mut unique = actions.clone();
        unique.sort_by_key(|a| format!("{:?}", a));
        unique.dedup();
        prop_assert_eq!(unique.len(), actions.len(), "duplicate actions in {:?}", actions);

        for &next in &actions {
            let mut copy = state.clone();
            prop_assert!(copy.try_perform(next).is_ok(), "{:?} rejected", next);
        }
    }
    Ok(())
}

// =============================================================================
// Round trip
// =============================================================================

proptest! {
    #[test]
    fn prop_tictactoe_round_trip(seed in arb_seed(), plies in arb_plies()) {
        check_round_trip::<TicTacToeState>(seed, plies)?;
    }

    #[test]
    fn prop_connect4_round_trip(seed in arb_seed(), plies in arb_plies()) {
        check_round_trip::<Connect4State>(seed, plies)?;
    }
}

// =============================================================================
// Enumeration consistency
// =============================================================================

proptest! {
    #[test]
    fn prop_tictactoe_enumeration(seed in arb_seed(), plies in arb_plies()) {
        check_enumeration::<TicTacToeState>(seed, plies)?;
    }

    #[test]
    fn prop_connect4_enumeration(seed in arb_seed(), plies in arb_plies()) {
        check_enumeration::<Connect4State>(seed, plies)?;
    }

    /// Connect Four actions always belong to the player to move
    #[test]
    fn prop_connect4_actions_for_current_player(seed in arb_seed(), plies in arb_plies()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = Connect4State::new_game();

        for _ in 0..plies {
            let Some(action) = state.random_legal_action(&mut rng) else {
                break;
            };
            state.perform(action);
            let player = state.current_player();
            for next in state.legal_actions() {
                prop_assert_eq!(next.player(), player);
            }
        }
    }
}

#[test]
fn test_action_for_wrong_player_is_rejected() {
    let mut state = Connect4State::new_game();
    let result = state.try_perform(Connect4Action::new(Player::Two, 3));
    assert!(result.is_err());
    assert_eq!(state, Connect4State::new_game());
}
