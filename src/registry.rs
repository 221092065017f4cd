use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db,
    error::GameError,
    game::GameRules,
    models::{Game, GameOutcome, GamePhase, GameView, MatchOutcome, UserPresence},
    push::BroadcastGateway,
    relay::{game_channel, EventRelay, EventType, LOBBY_CHANNEL},
};

/// Owner of all live game sessions and user presence.
///
/// Mutations on one game id are mutually exclusive: every write goes
/// through the map entry's exclusive guard, so two simultaneous moves
/// on the same game serialize while games under other ids proceed in
/// parallel. Snapshots handed out are clones. The relay append for a
/// committed mutation happens inside the exclusive section (it is a
/// cheap in-memory push) so per-channel event order always matches
/// commit order; the push transport request itself runs in a detached
/// task and never executes under a map lock.
///
/// Constructed once at startup and passed wherever it is needed; the
/// maps it owns are mutated by nobody else.
pub struct GameRegistry {
    games: DashMap<Uuid, Game>,
    presence: DashMap<String, UserPresence>,
    relay: Arc<EventRelay>,
    gateway: BroadcastGateway,
    stats: Option<PgPool>,
}

impl GameRegistry {
    pub fn new(relay: Arc<EventRelay>, gateway: BroadcastGateway, stats: Option<PgPool>) -> Self {
        Self {
            games: DashMap::new(),
            presence: DashMap::new(),
            relay,
            gateway,
            stats,
        }
    }

    /// Create a new waiting game owned by `creator`. Ids are random
    /// v4 uuids, so two games created in the same millisecond can
    /// never collide.
    pub fn create_game(&self, name: &str, creator: &str) -> Game {
        let game = Game::new(name, creator);
        let snapshot = game.clone();
        // Announce while still holding the fresh entry, so no later
        // mutation of this game can publish ahead of the create event.
        let entry = self.games.entry(game.id).insert(game);
        self.emit_game_event(EventType::GameCreated, &snapshot);
        drop(entry);

        self.touch_presence(creator);
        tracing::info!(game_id = %snapshot.id, creator, "game created");
        snapshot
    }

    /// Seat a second player and start the game. The creator moves first.
    pub fn join_game(&self, id: Uuid, player: &str) -> Result<Game, GameError> {
        let snapshot = {
            let mut entry = self.games.get_mut(&id).ok_or(GameError::NotFound)?;
            if !GameRules::can_join(&entry, player) {
                return Err(GameError::IllegalJoin);
            }
            entry.players.push(player.to_string());
            let creator = entry.created_by.clone();
            entry.phase = GamePhase::Active {
                current_player: creator,
            };
            entry.last_activity_at = Utc::now();
            let snapshot = entry.clone();
            self.emit_game_event(EventType::GameUpdated, &snapshot);
            snapshot
        };

        self.touch_presence(player);
        tracing::info!(game_id = %id, player, "player joined, game active");
        Ok(snapshot)
    }

    /// Validate and apply one move, delegating the turn rules. Rule
    /// violations come back unchanged and leave no trace in the game.
    pub fn apply_move(&self, id: Uuid, player: &str, cell_index: usize) -> Result<Game, GameError> {
        let snapshot = {
            let mut entry = self.games.get_mut(&id).ok_or(GameError::NotFound)?;
            GameRules::apply_move(&mut entry, player, cell_index)?;
            entry.last_activity_at = Utc::now();
            let snapshot = entry.clone();
            self.emit_game_event(EventType::GameUpdated, &snapshot);
            snapshot
        };

        self.touch_presence(player);
        if matches!(snapshot.phase, GamePhase::Finished { .. }) {
            self.record_outcomes(Self::finished_outcomes(&snapshot));
        }
        Ok(snapshot)
    }

    /// Remove a player from a game. Leaving an active game forfeits it:
    /// the remaining player wins. Leaving a game the player is not in
    /// is a successful no-op.
    pub fn leave(&self, id: Uuid, player: &str) -> Result<Game, GameError> {
        let (snapshot, forfeited) = {
            let mut entry = self.games.get_mut(&id).ok_or(GameError::NotFound)?;
            let Some(pos) = entry.players.iter().position(|p| p == player) else {
                let snapshot = entry.clone();
                drop(entry);
                self.touch_presence(player);
                return Ok(snapshot);
            };
            entry.players.remove(pos);

            let mut forfeited = false;
            if matches!(entry.phase, GamePhase::Active { .. }) {
                if let Some(remaining) = entry.players.first().cloned() {
                    entry.phase = GamePhase::Finished {
                        outcome: GameOutcome::Winner(remaining),
                    };
                    forfeited = true;
                }
            }
            entry.last_activity_at = Utc::now();
            let snapshot = entry.clone();
            self.emit_game_event(EventType::GameUpdated, &snapshot);
            (snapshot, forfeited)
        };

        self.touch_presence(player);
        if forfeited {
            tracing::info!(game_id = %id, player, "player left an active game, forfeit");
            let mut outcomes = vec![(player.to_string(), MatchOutcome::Loss)];
            if let GamePhase::Finished {
                outcome: GameOutcome::Winner(winner),
            } = &snapshot.phase
            {
                outcomes.push((winner.clone(), MatchOutcome::Win));
            }
            self.record_outcomes(outcomes);
        }
        Ok(snapshot)
    }

    /// Snapshots of all games, oldest first.
    pub fn list(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self.games.iter().map(|entry| entry.value().clone()).collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        games
    }

    /// Unconditional deletion, used by the cleanup sweep.
    pub fn remove(&self, id: Uuid) -> Result<Game, GameError> {
        let (_, game) = self.games.remove(&id).ok_or(GameError::NotFound)?;
        self.fan_out(
            EventType::GameRemoved,
            id,
            serde_json::json!({ "id": id }),
        );
        tracing::info!(game_id = %id, "game removed");
        Ok(game)
    }

    /// Drop presence entries older than `cutoff`; returns how many went.
    pub fn prune_presence(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.presence.len();
        self.presence
            .retain(|_, presence| presence.last_seen_at >= cutoff);
        before - self.presence.len()
    }

    fn touch_presence(&self, user_name: &str) {
        self.presence.insert(
            user_name.to_string(),
            UserPresence {
                user_name: user_name.to_string(),
                last_seen_at: Utc::now(),
            },
        );
    }

    /// Publish one domain event for a committed game mutation, to the
    /// game's own channel and mirrored on the lobby channel.
    fn emit_game_event(&self, event_type: EventType, game: &Game) {
        let payload = match serde_json::to_value(GameView::from(game)) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(game_id = %game.id, "failed to serialize event payload: {}", e);
                return;
            }
        };
        self.fan_out(event_type, game.id, payload);
    }

    fn fan_out(&self, event_type: EventType, game_id: Uuid, payload: Value) {
        for channel in [game_channel(game_id), LOBBY_CHANNEL.to_string()] {
            self.relay.publish(&channel, event_type, payload.clone());
            self.gateway.publish(&channel, event_type, payload.clone());
        }
    }

    /// Hand each participant's result to the statistics store, once per
    /// finished game. Writes run detached so the mutation caller never
    /// waits on the database.
    fn record_outcomes(&self, outcomes: Vec<(String, MatchOutcome)>) {
        let Some(pool) = &self.stats else {
            return;
        };
        for (user_name, outcome) in outcomes {
            let pool = pool.clone();
            tokio::spawn(async move {
                if let Err(e) = db::queries::record_result(&pool, &user_name, outcome).await {
                    tracing::warn!("failed to record {:?} for {}: {}", outcome, user_name, e);
                }
            });
        }
    }

    fn finished_outcomes(game: &Game) -> Vec<(String, MatchOutcome)> {
        match &game.phase {
            GamePhase::Finished {
                outcome: GameOutcome::Winner(winner),
            } => game
                .players
                .iter()
                .map(|p| {
                    let outcome = if p == winner {
                        MatchOutcome::Win
                    } else {
                        MatchOutcome::Loss
                    };
                    (p.clone(), outcome)
                })
                .collect(),
            GamePhase::Finished {
                outcome: GameOutcome::Draw,
            } => game
                .players
                .iter()
                .map(|p| (p.clone(), MatchOutcome::Draw))
                .collect(),
            _ => Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate_game(&self, id: Uuid, last_activity_at: DateTime<Utc>) {
        if let Some(mut entry) = self.games.get_mut(&id) {
            entry.last_activity_at = last_activity_at;
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate_user(&self, user_name: &str, last_seen_at: DateTime<Utc>) {
        self.presence.insert(
            user_name.to_string(),
            UserPresence {
                user_name: user_name.to_string(),
                last_seen_at,
            },
        );
    }

    #[cfg(test)]
    pub(crate) fn tracked_user_count(&self) -> usize {
        self.presence.len()
    }
}
