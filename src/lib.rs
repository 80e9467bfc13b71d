use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod ai;
pub mod game;
pub mod region;
pub mod snapshot;
pub mod types;

pub use ai::{SolveStats, Solver};
pub use game::{FirstLegalMoveSelector, GameError, GameInstance, MoveSelector};
pub use region::Region;
pub use snapshot::{GameSnapshot, SnapshotError};
pub use types::{Coordinate, GameConfig, GameResult, GameState, Move};

/// The one game driven through the WASM surface.
static GAME: Lazy<Mutex<Option<GameInstance>>> = Lazy::new(|| Mutex::new(None));

fn replace_game(game: GameInstance) {
    *GAME.lock().unwrap_or_else(PoisonError::into_inner) = Some(game);
}

fn with_game<T>(
    action: impl FnOnce(&mut GameInstance) -> Result<T, GameError>,
) -> Result<T, GameError> {
    let mut slot = GAME.lock().unwrap_or_else(PoisonError::into_inner);
    let game = slot.as_mut().ok_or(GameError::NotStarted)?;
    action(game)
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}

/// Starts a new game. `config` may be `undefined` or a partial
/// `{ width, height, ai_first }` object.
#[wasm_bindgen]
pub fn new_game(config: JsValue) -> Result<JsValue, JsValue> {
    let config: GameConfig = if config.is_undefined() || config.is_null() {
        GameConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(serde_to_js_error)?
    };

    let game = GameInstance::new_with_solver(config).map_err(serde_to_js_error)?;
    let state = game.to_game_state();
    replace_game(game);
    to_js(&state)
}

#[wasm_bindgen]
pub fn get_state() -> Result<JsValue, JsValue> {
    let state = with_game(|game| Ok(game.to_game_state())).map_err(serde_to_js_error)?;
    to_js(&state)
}

#[wasm_bindgen]
pub fn get_legal_moves() -> Result<JsValue, JsValue> {
    let moves = with_game(|game| Ok(game.get_legal_moves())).map_err(serde_to_js_error)?;
    to_js(&moves)
}

/// Human move. Errors leave the game untouched so the caller can re-prompt.
/// Coordinates arrive as `u32` so out-of-range input is rejected, not truncated.
#[wasm_bindgen]
pub fn place(x: u32, y: u32) -> Result<JsValue, JsValue> {
    let state = with_game(|game| {
        game.place(x, y)?;
        Ok(game.to_game_state())
    })
    .map_err(serde_to_js_error)?;
    to_js(&state)
}

#[wasm_bindgen]
pub fn ai_move() -> Result<JsValue, JsValue> {
    let mv = with_game(GameInstance::do_ai_move).map_err(serde_to_js_error)?;
    to_js(&mv)
}

#[wasm_bindgen]
pub fn get_result() -> Result<JsValue, JsValue> {
    let result = with_game(|game| game.to_game_result()).map_err(serde_to_js_error)?;
    to_js(&result)
}

#[wasm_bindgen]
pub fn render_board() -> Result<String, JsValue> {
    with_game(|game| Ok(game.render())).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub fn export_game() -> Result<Vec<u8>, JsValue> {
    with_game(|game| Ok(game.to_snapshot().to_bytes())).map_err(serde_to_js_error)
}

/// Replaces the current game with a saved one. The solver cache starts empty.
#[wasm_bindgen]
pub fn import_game(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let snapshot = GameSnapshot::from_bytes(bytes).map_err(serde_to_js_error)?;
    let game = GameInstance::from_snapshot(snapshot, Box::new(Solver::new()))
        .map_err(serde_to_js_error)?;
    let state = game.to_game_state();
    replace_game(game);
    to_js(&state)
}
