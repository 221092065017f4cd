pub mod events;
pub mod games;
pub mod health;
pub mod stats;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/games", post(games::create_game).get(games::list_games))
        .route("/games/{id}/join", post(games::join_game))
        .route("/games/{id}/move", post(games::play_move))
        .route("/games/{id}/leave", post(games::leave_game))
        .route("/events/{channel}", get(events::catch_up))
        .route("/stats/{user_name}", get(stats::player_stats))
}
