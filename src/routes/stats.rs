use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{db, models::PlayerStats, AppState};

/// Durable win/loss counters for one user. Users with no recorded
/// games get zeroed counters rather than a 404.
pub async fn player_stats(
    State(state): State<Arc<AppState>>,
    Path(user_name): Path<String>,
) -> Result<Json<PlayerStats>, StatusCode> {
    let Some(pool) = &state.db else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    match db::queries::get_stats(pool, &user_name).await {
        Ok(Some(stats)) => Ok(Json(stats)),
        Ok(None) => Ok(Json(PlayerStats::empty(user_name))),
        Err(e) => {
            tracing::error!("failed to load stats for {}: {}", user_name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
