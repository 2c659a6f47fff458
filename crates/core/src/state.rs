use crate::{Player, Result, SearchError, UndoToken};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;

/// A mutable position in a two-player, perfect-information game.
///
/// This trait is the only thing the search engines know about a game. A
/// state tracks whose turn it is, which actions are legal and whether anybody
/// has won. Engines mutate a state in place with [`perform`](State::perform)
/// and restore it with [`undo`](State::undo) in strict LIFO order, so both
/// should be as cheap as possible (O(1) amortized where feasible): they are
/// called once per simulated ply.
///
/// `Default` constructs a blank state; call [`reset_to_start`](State::reset_to_start)
/// (or use [`new_game`](State::new_game)) before searching. `Clone` is a deep copy.
pub trait State: Clone + Default + Debug + Send + 'static {
    /// A game action. The bit layout is private to the implementation.
    type Action: Clone + Copy + Debug + Eq + Hash + Send + Sync + 'static;

    /// Returns every action that is legal from the current position.
    ///
    /// The returned list is an owned snapshot, so it stays valid across any
    /// number of perform/undo pairs made while iterating it.
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Performs `action` by mutating the state.
    ///
    /// The action must be one of [`legal_actions`](State::legal_actions).
    /// Implementations are not required to check this in release builds; use
    /// [`try_perform`](State::try_perform) for untrusted input.
    fn perform(&mut self, action: Self::Action) -> UndoToken;

    /// Reverses the most recently performed action.
    ///
    /// `token` must be the value `perform` returned for that same action.
    fn undo(&mut self, action: Self::Action, token: UndoToken);

    /// Puts this state in the starting condition of the game.
    fn reset_to_start(&mut self);

    /// Returns true if no more actions are possible (the game has ended).
    fn is_terminal(&self) -> bool;

    /// Returns the winner, or `None` for a draw or a game still in progress.
    fn winner(&self) -> Option<Player>;

    /// Returns the player whose turn it is.
    fn current_player(&self) -> Player;

    /// Number of actions performed since the start of the game.
    fn ply(&self) -> u32;

    /// Returns the player who moves after `player`.
    fn player_after(&self, player: Player) -> Player {
        player.opponent()
    }

    /// Returns the player who moved before `player`.
    fn player_before(&self, player: Player) -> Player {
        player.opponent()
    }

    /// Returns a uniformly random legal action, or `None` if there is none.
    fn random_legal_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Self::Action> {
        self.legal_actions().choose(rng).copied()
    }

    /// Returns true if `action` is currently legal.
    fn is_legal(&self, action: Self::Action) -> bool {
        self.legal_actions().contains(&action)
    }

    /// Mutates this state into a deep copy of `other`.
    fn initialize_from(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// Creates a state in the starting condition of the game.
    fn new_game() -> Self {
        let mut state = Self::default();
        state.reset_to_start();
        state
    }

    /// Performs `action` after checking that it is legal.
    ///
    /// # Errors
    /// Returns `SearchError::IllegalAction` if the action is not currently in
    /// the legal action enumeration. The state is left untouched.
    fn try_perform(&mut self, action: Self::Action) -> Result<UndoToken> {
        if !self.is_legal(action) {
            return Err(SearchError::IllegalAction(format!(
                "{:?} at ply {}",
                action,
                self.ply()
            )));
        }
        Ok(self.perform(action))
    }

    /// Reverses `action` after checking that `token` belongs to the most
    /// recent perform.
    ///
    /// # Errors
    /// Returns `SearchError::InvalidUndoToken` if the token was issued at a
    /// different ply. The state is left untouched.
    fn try_undo(&mut self, action: Self::Action, token: UndoToken) -> Result<()> {
        if token.ply() != self.ply() {
            return Err(SearchError::InvalidUndoToken {
                expected: self.ply(),
                found: token.ply(),
            });
        }
        self.undo(action, token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // Simple test game: counting to 3 (whoever says 3 wins)
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct CountingState {
        count: u8,
        ply: u32,
    }

    impl State for CountingState {
        type Action = u8;

        fn legal_actions(&self) -> Vec<u8> {
            match self.count {
                0 | 1 => vec![1, 2],
                2 => vec![1],
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
            self.count >= 3
        }

        fn winner(&self) -> Option<Player> {
            if self.count >= 3 {
                Some(self.current_player().opponent())
            } else {
                None
            }
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

    #[test]
    fn test_try_perform_rejects_illegal_action() {
        let mut state = CountingState::new_game();
        state.perform(2);

        let result = state.try_perform(2);
        assert!(matches!(result, Err(SearchError::IllegalAction(_))));
        // State untouched
        assert_eq!(state.count, 2);
        assert_eq!(state.ply(), 1);
    }

    #[test]
    fn test_try_undo_rejects_stale_token() {
        let mut state = CountingState::new_game();
        let first = state.try_perform(1).unwrap();
        let _second = state.try_perform(1).unwrap();

        let result = state.try_undo(1, first);
        assert_eq!(
            result,
            Err(SearchError::InvalidUndoToken {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(state.count, 2);
    }

    #[test]
    fn test_try_undo_restores_state() {
        let mut state = CountingState::new_game();
        let before = state.clone();
        let token = state.try_perform(2).unwrap();
        state.try_undo(2, token).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_random_legal_action() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut state = CountingState::new_game();

        for _ in 0..20 {
            let action = state.random_legal_action(&mut rng).unwrap();
            assert!(state.is_legal(action));
        }

        state.perform(2);
        state.perform(1);
        assert!(state.is_terminal());
        assert_eq!(state.random_legal_action(&mut rng), None);
    }

    #[test]
    fn test_winner_and_players() {
        let mut state = CountingState::new_game();
        assert_eq!(state.current_player(), Player::One);
        assert_eq!(state.player_after(Player::One), Player::Two);
        assert_eq!(state.player_before(Player::One), Player::Two);

        state.perform(2);
        state.perform(1);
        assert_eq!(state.winner(), Some(Player::Two));
    }

    #[test]
    fn test_initialize_from() {
        let mut source = CountingState::new_game();
        source.perform(1);

        let mut target = CountingState::default();
        target.initialize_from(&source);
        assert_eq!(target, source);
    }
}
