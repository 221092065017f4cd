use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{relay::RelayEvent, AppState};

#[derive(Debug, Deserialize)]
pub struct CatchUpQuery {
    /// Last event id the client has seen. Absent or already evicted
    /// means the full current buffer comes back as a resync snapshot.
    pub after: Option<u64>,
}

pub async fn catch_up(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    Query(query): Query<CatchUpQuery>,
) -> Json<Vec<RelayEvent>> {
    Json(state.relay.since(&channel, query.after))
}
