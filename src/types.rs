use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest allowed board extent on either axis.
pub const MIN_EXTENT: u8 = 1;
/// Largest allowed board extent on either axis. The region key packs one bit per
/// column and row into a `u32`, which caps both axes at 16.
pub const MAX_EXTENT: u8 = 16;

/// A grid cell or boundary corner, 1-indexed. `(0, 0)` is only used as the
/// sentinel returned for an empty region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u8,
    pub y: u8,
}

impl Coordinate {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// `true` when `self` is weakly up-and-right of `other` on both axes.
    pub fn dominates(self, other: Coordinate) -> bool {
        self.x >= other.x && self.y >= other.y
    }

    /// `true` when either point dominates the other. Two corners of one
    /// staircase are never comparable.
    pub fn is_comparable(self, other: Coordinate) -> bool {
        self.dominates(other) || other.dominates(self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// A move annotated by the solver.
///
/// Contract:
/// - `value == 1`: the maximizing side (the one `solve` was asked for) wins.
/// - `value == 0`: the minimizing side wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    pub cell: Coordinate,
    pub value: u8,
}

impl Move {
    pub const fn new(cell: Coordinate, value: u8) -> Self {
        Self { cell, value }
    }

    pub fn is_winning(&self) -> bool {
        self.value == 1
    }
}

/// Options accepted by `new_game`. Missing fields fall back to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: u8,
    pub height: u8,
    pub ai_first: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 4,
            height: 4,
            ai_first: false,
        }
    }
}

/// Public game state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub width: u8,
    pub height: u8,
    /// Boundary corners of the remaining region, largest x first.
    pub corners: Vec<Coordinate>,
    pub remaining: u16,
    pub current_player: u8,
    pub is_game_over: bool,
    pub move_count: u16,
    pub last_move: Option<Coordinate>,
    /// Contract:
    /// - `None` until the AI has moved at least once.
    /// - Otherwise the most recent AI move together with its solver value.
    pub last_ai_move: Option<Move>,
    pub ai_think_ms: Option<u32>,
}

/// Final result after game over. The loser is whoever took the last cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub winner: u8,
    pub loser: u8,
    pub move_count: u16,
}
