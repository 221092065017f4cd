use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last-seen bookkeeping for a user, refreshed on every registry
/// operation they perform. Read by the cleanup sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    pub user_name: String,
    pub last_seen_at: DateTime<Utc>,
}
