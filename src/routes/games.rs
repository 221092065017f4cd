use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::GameError, models::GameView, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: String,
    pub creator_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub player_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub player_name: String,
    pub cell_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub player_name: String,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, GameError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GameError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(value)
}

/// A malformed id cannot name any game, so it reads as unknown.
fn parse_game_id(raw: &str) -> Result<Uuid, GameError> {
    Uuid::parse_str(raw).map_err(|_| GameError::NotFound)
}

pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameView>), GameError> {
    let name = required(&req.name, "name")?;
    let creator = required(&req.creator_name, "creatorName")?;
    let game = state.registry.create_game(name, creator);
    Ok((StatusCode::CREATED, Json(GameView::from(&game))))
}

pub async fn list_games(State(state): State<Arc<AppState>>) -> Json<Vec<GameView>> {
    Json(state.registry.list().iter().map(GameView::from).collect())
}

pub async fn join_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<JoinGameRequest>,
) -> Result<Json<GameView>, GameError> {
    let player = required(&req.player_name, "playerName")?;
    let game = state.registry.join_game(parse_game_id(&id)?, player)?;
    Ok(Json(GameView::from(&game)))
}

pub async fn play_move(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<GameView>, GameError> {
    let player = required(&req.player_name, "playerName")?;
    let game = state
        .registry
        .apply_move(parse_game_id(&id)?, player, req.cell_index)?;
    Ok(Json(GameView::from(&game)))
}

pub async fn leave_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LeaveRequest>,
) -> Result<Json<Value>, GameError> {
    let player = required(&req.player_name, "playerName")?;
    state.registry.leave(parse_game_id(&id)?, player)?;
    Ok(Json(json!({ "status": "ok" })))
}
