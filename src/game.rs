use thiserror::Error;
use tracing::{info, trace};
use web_time::Instant;

use crate::ai::Solver;
use crate::region::Region;
use crate::snapshot::{GameSnapshot, SnapshotError};
use crate::types::{Coordinate, GameConfig, GameResult, GameState, MAX_EXTENT, MIN_EXTENT, Move};

pub const PLAYER_HUMAN: u8 = 1;
pub const PLAYER_AI: u8 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("board size {width}x{height} is out of range (1..=16 on each axis)")]
    InvalidSize { width: u8, height: u8 },

    #[error("coordinate [{x}, {y}] is out of range: too small")]
    TooSmall { x: u32, y: u32 },

    #[error("coordinate [{x}, {y}] is out of range: too large")]
    TooLarge { x: u32, y: u32 },

    #[error("illegal move at {0}")]
    IllegalMove(Coordinate),

    #[error("game is already over")]
    GameOver,

    #[error("game is not over yet")]
    NotOver,

    #[error("it is not the player's turn")]
    NotHumanTurn,

    #[error("it is not AI's turn")]
    NotAiTurn,

    #[error("AI could not select a move")]
    NoMoveSelected,

    #[error("AI selected an illegal move at {0}")]
    AiIllegalMove(Coordinate),

    #[error("no game in progress")]
    NotStarted,

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Chooses the AI's cell for a non-empty region.
pub trait MoveSelector: Send + Sync {
    fn select_move(&mut self, region: &Region) -> Option<Move>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalMoveSelector;

impl MoveSelector for FirstLegalMoveSelector {
    fn select_move(&mut self, region: &Region) -> Option<Move> {
        region.moves().next().map(|cell| Move::new(cell, 0))
    }
}

impl MoveSelector for Solver {
    fn select_move(&mut self, region: &Region) -> Option<Move> {
        if region.is_empty() {
            None
        } else {
            Some(self.solve(region))
        }
    }
}

pub struct GameInstance {
    region: Region,
    config: GameConfig,
    pub current_player: u8,
    pub is_game_over: bool,
    move_count: u16,
    last_move: Option<Coordinate>,
    last_ai_move: Option<Move>,
    ai_think_ms: Option<u32>,
    selector: Box<dyn MoveSelector>,
}

impl GameInstance {
    pub fn new(config: GameConfig, selector: Box<dyn MoveSelector>) -> Result<Self, GameError> {
        let extents = MIN_EXTENT..=MAX_EXTENT;
        if !extents.contains(&config.width) || !extents.contains(&config.height) {
            return Err(GameError::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }

        Ok(Self {
            region: Region::new(config.width, config.height),
            config,
            current_player: if config.ai_first {
                PLAYER_AI
            } else {
                PLAYER_HUMAN
            },
            is_game_over: false,
            move_count: 0,
            last_move: None,
            last_ai_move: None,
            ai_think_ms: None,
            selector,
        })
    }

    pub fn new_with_solver(config: GameConfig) -> Result<Self, GameError> {
        Self::new(config, Box::new(Solver::new()))
    }

    /// Restores a saved game. The selector starts cold.
    pub fn from_snapshot(
        snapshot: GameSnapshot,
        selector: Box<dyn MoveSelector>,
    ) -> Result<Self, GameError> {
        snapshot.validate()?;
        let mut game = Self::new(snapshot.config, selector)?;
        game.region = snapshot.region;
        game.current_player = snapshot.current_player;
        game.is_game_over = snapshot.is_game_over;
        game.move_count = snapshot.move_count;
        Ok(game)
    }

    pub fn to_snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            config: self.config,
            current_player: self.current_player,
            is_game_over: self.is_game_over,
            move_count: self.move_count,
            region: self.region.clone(),
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Human move at `(x, y)`. A rejected move leaves the turn unchanged.
    pub fn place(&mut self, x: u32, y: u32) -> Result<(), GameError> {
        if self.is_game_over {
            return Err(GameError::GameOver);
        }
        if self.current_player != PLAYER_HUMAN {
            return Err(GameError::NotHumanTurn);
        }

        if x < u32::from(MIN_EXTENT) || y < u32::from(MIN_EXTENT) {
            return Err(GameError::TooSmall { x, y });
        }
        let (Ok(col), Ok(row)) = (u8::try_from(x), u8::try_from(y)) else {
            return Err(GameError::TooLarge { x, y });
        };
        if col > MAX_EXTENT || row > MAX_EXTENT {
            return Err(GameError::TooLarge { x, y });
        }

        self.apply_move(Coordinate::new(col, row), PLAYER_HUMAN)
    }

    pub fn do_ai_move(&mut self) -> Result<Move, GameError> {
        if self.is_game_over {
            return Err(GameError::GameOver);
        }
        if self.current_player != PLAYER_AI {
            return Err(GameError::NotAiTurn);
        }

        let start = Instant::now();
        let selected = self
            .selector
            .select_move(&self.region)
            .ok_or(GameError::NoMoveSelected)?;
        let think_ms = u32::try_from(start.elapsed().as_millis()).unwrap_or(u32::MAX);

        self.apply_move(selected.cell, PLAYER_AI)
            .map_err(|_| GameError::AiIllegalMove(selected.cell))?;
        self.last_ai_move = Some(selected);
        self.ai_think_ms = Some(think_ms);
        info!(
            cell = %selected.cell,
            value = selected.value,
            think_ms,
            "AI chomps"
        );

        Ok(selected)
    }

    pub fn get_legal_moves(&self) -> Vec<Coordinate> {
        if self.is_game_over {
            return Vec::new();
        }
        self.region.moves().collect()
    }

    pub fn to_game_state(&self) -> GameState {
        GameState {
            width: self.config.width,
            height: self.config.height,
            corners: self.region.corners().to_vec(),
            remaining: self.region.cell_count(),
            current_player: self.current_player,
            is_game_over: self.is_game_over,
            move_count: self.move_count,
            last_move: self.last_move,
            last_ai_move: self.last_ai_move,
            ai_think_ms: self.ai_think_ms,
        }
    }

    pub fn to_game_result(&self) -> Result<GameResult, GameError> {
        if !self.is_game_over {
            return Err(GameError::NotOver);
        }
        // The turn passed on after the last cell was eaten.
        Ok(GameResult {
            winner: self.current_player,
            loser: opponent_of(self.current_player),
            move_count: self.move_count,
        })
    }

    pub fn render(&self) -> String {
        self.region.to_string()
    }

    fn apply_move(&mut self, cell: Coordinate, player: u8) -> Result<(), GameError> {
        if !self.region.chomp(cell) {
            trace!(%cell, player, "rejected move");
            return Err(GameError::IllegalMove(cell));
        }

        self.move_count += 1;
        self.last_move = Some(cell);
        self.current_player = opponent_of(player);

        if self.region.is_empty() {
            self.is_game_over = true;
            info!(
                winner = self.current_player,
                moves = self.move_count,
                "game over"
            );
        }

        Ok(())
    }

    #[cfg(test)]
    fn set_region_for_test(&mut self, region: Region, current_player: u8) {
        self.region = region;
        self.current_player = current_player;
        self.is_game_over = false;
    }
}

fn opponent_of(player: u8) -> u8 {
    match player {
        PLAYER_HUMAN => PLAYER_AI,
        PLAYER_AI => PLAYER_HUMAN,
        _ => unreachable!("invalid player value: {}", player),
    }
}
