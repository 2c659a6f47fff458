//! Value types shared by every state and search engine.
//!
//! - Player: one of the two sides of a zero-sum game
//! - UndoToken: proof of a `perform`, required to reverse it
//! - ActionScore: an action paired with its heuristic score

use std::fmt;

/// One of the two players of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Get the opposing player.
    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Index of this player (0 or 1), useful for per-player tables.
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// Zero-sum `score`, computed for `scored_for`, seen by this player.
    pub fn score_from(self, scored_for: Player, score: f64) -> f64 {
        if self == scored_for {
            score
        } else {
            -score
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "Player One"),
            Player::Two => write!(f, "Player Two"),
        }
    }
}

/// Token returned by [`State::perform`](crate::State::perform).
///
/// Invariant: `ply` is the state's ply count *after* the action was
/// performed, so a token is only valid while the state is still at that ply.
/// The payload is private to the state implementation (for example the row a
/// piece landed in).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UndoToken {
    ply: u32,
    payload: u64,
}

impl UndoToken {
    /// Create a token for an action performed to reach `ply`.
    pub fn new(ply: u32, payload: u64) -> Self {
        Self { ply, payload }
    }

    /// Ply the state was at right after the action.
    pub fn ply(self) -> u32 {
        self.ply
    }

    /// State-private data needed to reverse the action.
    pub fn payload(self) -> u64 {
        self.payload
    }
}

/// An action together with the heuristic score an agent assigned to it.
///
/// Higher scores are better for the player the agent searched for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionScore<A> {
    pub action: A,
    pub score: f64,
}

impl<A> ActionScore<A> {
    pub fn new(action: A, score: f64) -> Self {
        Self { action, score }
    }
}

impl<A: fmt::Debug> fmt::Display for ActionScore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:.3})", self.action, self.score)
    }
}
