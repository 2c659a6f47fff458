//! Reference game implementations.
//!
//! These games are used to validate the engines and by the selfplay binary.
//! Tic-tac-toe is small enough to solve exactly; Connect Four is not.

pub mod connect4;
pub mod tictactoe;

pub use connect4::{Connect4Action, Connect4State};
pub use tictactoe::{TicTacToeAction, TicTacToeState};
