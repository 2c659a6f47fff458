//! GAIL Core - State contract and shared types for game search
//!
//! This crate provides the `State` trait that any two-player,
//! perfect-information, zero-sum game must implement to be searched by the
//! engines in `gail_search`, plus the `Evaluator` trait they share.
//!
//! # Types
//!
//! - [`State`] - Mutable game position with perform/undo
//! - [`Evaluator`] - Scores a position for a player
//! - [`Player`] - One of the two sides
//! - [`UndoToken`] - Returned by `perform`, consumed by `undo`
//! - [`ActionScore`] - Action chosen by an agent and its score

mod error;
mod evaluator;
mod state;
mod types;

pub use error::{Result, SearchError};
pub use evaluator::{Evaluator, WinLossEvaluator};
pub use state::State;
pub use types::{ActionScore, Player, UndoToken};
