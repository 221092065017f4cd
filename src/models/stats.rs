use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single player's result in a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Win,
    Loss,
    Draw,
}

/// Durable win/loss counters for one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub user_name: String,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub updated_at: DateTime<Utc>,
}

impl PlayerStats {
    /// Zeroed counters for a user with no recorded games yet.
    pub fn empty(user_name: String) -> Self {
        Self {
            user_name,
            wins: 0,
            losses: 0,
            draws: 0,
            updated_at: Utc::now(),
        }
    }
}
