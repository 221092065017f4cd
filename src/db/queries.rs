use sqlx::{PgPool, Result};

use crate::models::{MatchOutcome, PlayerStats};

/// Add one finished-game result to a user's durable counters.
///
/// Delivery is at-most-once: the in-memory game state has already
/// committed when this runs, and a crash in between silently loses the
/// update.
pub async fn record_result(pool: &PgPool, user_name: &str, outcome: MatchOutcome) -> Result<()> {
    let (wins, losses, draws) = match outcome {
        MatchOutcome::Win => (1, 0, 0),
        MatchOutcome::Loss => (0, 1, 0),
        MatchOutcome::Draw => (0, 0, 1),
    };

    sqlx::query(
        r#"
        INSERT INTO player_stats (user_name, wins, losses, draws)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_name)
        DO UPDATE SET
            wins = player_stats.wins + $2,
            losses = player_stats.losses + $3,
            draws = player_stats.draws + $4,
            updated_at = NOW()
        "#,
    )
    .bind(user_name)
    .bind(wins)
    .bind(losses)
    .bind(draws)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_stats(pool: &PgPool, user_name: &str) -> Result<Option<PlayerStats>> {
    sqlx::query_as::<_, PlayerStats>("SELECT * FROM player_stats WHERE user_name = $1")
        .bind(user_name)
        .fetch_optional(pool)
        .await
}
