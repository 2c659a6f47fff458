//! Connect Four on the standard 7x6 board.
//!
//! Large enough that neither engine can solve it from the opening, so it is
//! the game used to compare engines under a fixed budget.

use gail_core::{Player, State, UndoToken};
use std::fmt;

pub const WIDTH: usize = 7;
pub const HEIGHT: usize = 6;

/// Directions checked for four in a row, each paired with its opposite.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

const PLAYER_TWO_BIT: u64 = 1 << 8;

/// Connect Four action: drop a piece in a column.
///
/// The low byte holds the column; bit 8 is set for Player Two's drops, so the
/// same column yields distinct actions for the two players.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct Connect4Action(u64);

impl Connect4Action {
    pub fn new(player: Player, column: usize) -> Self {
        debug_assert!(column < WIDTH, "column {} out of range", column);
        let player_bit = match player {
            Player::One => 0,
            Player::Two => PLAYER_TWO_BIT,
        };
        Self(player_bit | column as u64)
    }

    pub fn column(self) -> usize {
        (self.0 & 0xff) as usize
    }

    pub fn player(self) -> Player {
        if self.0 & PLAYER_TWO_BIT == 0 {
            Player::One
        } else {
            Player::Two
        }
    }
}

impl fmt::Display for Connect4Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.column())
    }
}

/// Connect Four board state.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Connect4State {
    /// Indexed as `board[column][row]` with the origin in the bottom left.
    board: [[Option<Player>; HEIGHT]; WIDTH],

    /// Number of pieces in each column, i.e. the row the next drop lands in.
    heights: [u8; WIDTH],

    current: Player,
    winner: Option<Player>,
    ply: u32,
}

impl Connect4State {
    /// Create an empty board with Player One to move.
    pub fn new() -> Self {
        Self {
            board: [[None; HEIGHT]; WIDTH],
            heights: [0; WIDTH],
            current: Player::One,
            winner: None,
            ply: 0,
        }
    }

    /// Piece at `(column, row)`, row 0 being the bottom.
    pub fn get(&self, column: usize, row: usize) -> Option<Player> {
        self.board
            .get(column)
            .and_then(|col| col.get(row))
            .copied()
            .flatten()
    }

    /// Number of pieces in `column`.
    pub fn height(&self, column: usize) -> usize {
        self.heights[column] as usize
    }

    /// Action dropping a piece in `column` for the player to move.
    pub fn action_for_column(&self, column: usize) -> Connect4Action {
        Connect4Action::new(self.current, column)
    }

    fn is_full(&self) -> bool {
        self.heights.iter().all(|&h| h as usize == HEIGHT)
    }

    /// Length of the run of `player`'s pieces starting next to `(column,
    /// row)` and heading in direction `(dc, dr)`.
    fn run_length(&self, player: Player, column: usize, row: usize, dc: isize, dr: isize) -> usize {
        let mut count = 0;
        let mut c = column as isize + dc;
        let mut r = row as isize + dr;
        while (0..WIDTH as isize).contains(&c)
            && (0..HEIGHT as isize).contains(&r)
            && self.board[c as usize][r as usize] == Some(player)
        {
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }

    /// Whether the piece `player` just dropped at `(column, row)` completes
    /// four in a row.
    fn completes_line(&self, player: Player, column: usize, row: usize) -> bool {
        DIRECTIONS.iter().any(|&(dc, dr)| {
            1 + self.run_length(player, column, row, dc, dr)
                + self.run_length(player, column, row, -dc, -dr)
                >= 4
        })
    }
}

impl Default for Connect4State {
    fn default() -> Self {
        Self::new()
    }
}

impl State for Connect4State {
    type Action = Connect4Action;

    fn legal_actions(&self) -> Vec<Connect4Action> {
        if self.winner.is_some() {
            return Vec::new();
        }
        (0..WIDTH)
            .filter(|&column| self.height(column) < HEIGHT)
            .map(|column| self.action_for_column(column))
            .collect()
    }

    fn perform(&mut self, action: Connect4Action) -> UndoToken {
        let column = action.column();
        debug_assert!(
            self.winner.is_none() && action.player() == self.current && self.height(column) < HEIGHT,
            "illegal connect four action {:?}\n{}",
            action,
            self
        );
        let row = self.height(column);
        self.board[column][row] = Some(self.current);
        self.heights[column] += 1;
        if self.completes_line(self.current, column, row) {
            self.winner = Some(self.current);
        }
        self.current = self.current.opponent();
        self.ply += 1;
        UndoToken::new(self.ply, row as u64)
    }

    fn undo(&mut self, action: Connect4Action, token: UndoToken) {
        debug_assert_eq!(token.ply(), self.ply, "undo token from another ply");
        let column = action.column();
        self.heights[column] -= 1;
        let row = self.height(column);
        debug_assert_eq!(token.payload(), row as u64);
        self.board[column][row] = None;
        self.winner = None;
        self.current = self.current.opponent();
        self.ply -= 1;
    }

    fn reset_to_start(&mut self) {
        *self = Self::new();
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.is_full()
    }

    fn winner(&self) -> Option<Player> {
        self.winner
    }

    fn current_player(&self) -> Player {
        self.current
    }

    fn ply(&self) -> u32 {
        self.ply
    }
}

impl fmt::Display for Connect4State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                let c = match self.board[column][row] {
                    Some(Player::One) => 'X',
                    Some(Player::Two) => 'O',
                    None => '-',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
