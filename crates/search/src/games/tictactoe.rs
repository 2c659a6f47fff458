//! Tic-tac-toe implementation for search validation.
//!
//! Tic-tac-toe is a solved game where perfect play always results in a draw.
//! This makes it ideal for validating the engines:
//! - A full-depth negamax should never lose against any opponent
//! - Two full-depth negamax players should always draw
//! - UCT should exploit opponent mistakes

use gail_core::{Player, State, UndoToken};
use std::fmt;

/// Every winning line as a bitmask over cells 0-8.
const LINES: [u16; 8] = [
    0b000_000_111, // top row
    0b000_111_000, // middle row
    0b111_000_000, // bottom row
    0b001_001_001, // left column
    0b010_010_010, // center column
    0b100_100_100, // right column
    0b100_010_001, // main diagonal
    0b001_010_100, // anti-diagonal
];

const FULL_BOARD: u16 = 0b111_111_111;

/// Tic-tac-toe action (cell index 0-8, row-major).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct TicTacToeAction(u64);

impl TicTacToeAction {
    /// Action placing a mark on `cell` (0-8).
    pub fn new(cell: u8) -> Self {
        debug_assert!(cell < 9, "cell {} out of range", cell);
        Self(cell as u64)
    }

    pub fn cell(self) -> usize {
        self.0 as usize
    }

    /// Get the row (0-2).
    pub fn row(self) -> usize {
        self.cell() / 3
    }

    /// Get the column (0-2).
    pub fn col(self) -> usize {
        self.cell() % 3
    }

    fn mask(self) -> u16 {
        1 << self.0
    }
}

impl fmt::Display for TicTacToeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row(), self.col())
    }
}

/// Tic-tac-toe board state.
///
/// Player One plays X and moves first.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TicTacToeState {
    /// One bitboard per player, bit `i` set when that player holds cell `i`.
    /// ```text
    /// 0 | 1 | 2
    /// ---------
    /// 3 | 4 | 5
    /// ---------
    /// 6 | 7 | 8
    /// ```
    marks: [u16; 2],

    /// Current player to move.
    current: Player,

    /// Cached winner (if any).
    winner: Option<Player>,

    ply: u32,
}

impl TicTacToeState {
    /// Create a new empty board with X to move.
    pub fn new() -> Self {
        Self {
            marks: [0; 2],
            current: Player::One,
            winner: None,
            ply: 0,
        }
    }

    /// Get the piece at a cell, if any.
    pub fn get(&self, cell: usize) -> Option<Player> {
        let mask = 1u16 << cell;
        if self.marks[Player::One.index()] & mask != 0 {
            Some(Player::One)
        } else if self.marks[Player::Two.index()] & mask != 0 {
            Some(Player::Two)
        } else {
            None
        }
    }

    fn occupied(&self) -> u16 {
        self.marks[0] | self.marks[1]
    }

    /// Check whether `player` holds a complete line.
    fn has_line(&self, player: Player) -> bool {
        let marks = self.marks[player.index()];
        LINES.iter().any(|&line| marks & line == line)
    }

    /// Check if the board is full (draw if no winner).
    fn is_full(&self) -> bool {
        self.occupied() == FULL_BOARD
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl State for TicTacToeState {
    type Action = TicTacToeAction;

    fn legal_actions(&self) -> Vec<TicTacToeAction> {
        if self.winner.is_some() {
            return Vec::new();
        }
        let occupied = self.occupied();
        (0..9u8)
            .filter(|&cell| occupied & (1 << cell) == 0)
            .map(TicTacToeAction::new)
            .collect()
    }

    fn perform(&mut self, action: TicTacToeAction) -> UndoToken {
        debug_assert!(
            self.winner.is_none() && self.occupied() & action.mask() == 0,
            "illegal tic-tac-toe action {:?}\n{}",
            action,
            self
        );
        self.marks[self.current.index()] |= action.mask();
        if self.has_line(self.current) {
            self.winner = Some(self.current);
        }
        self.current = self.current.opponent();
        self.ply += 1;
        UndoToken::new(self.ply, 0)
    }

    fn undo(&mut self, action: TicTacToeAction, token: UndoToken) {
        debug_assert_eq!(token.ply(), self.ply, "undo token from another ply");
        self.ply -= 1;
        self.current = self.current.opponent();
        self.marks[self.current.index()] &= !action.mask();
        // Nobody had won before the undone action, or the game would have ended
        self.winner = None;
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

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "-----------")?;
            }
            for col in 0..3 {
                if col > 0 {
                    write!(f, "|")?;
                }
                match self.get(row * 3 + col) {
                    Some(Player::One) => write!(f, " X ")?,
                    Some(Player::Two) => write!(f, " O ")?,
                    None => write!(f, "   ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
