use std::{sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::CleanupConfig,
    models::GameView,
    push::BroadcastGateway,
    registry::GameRegistry,
    relay::{EventRelay, EventType, LOBBY_CHANNEL},
};

/// What one sweep evicted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub removed_games: usize,
    pub dropped_users: usize,
}

impl SweepReport {
    pub fn changed(&self) -> bool {
        self.removed_games > 0 || self.dropped_users > 0
    }
}

/// Periodic eviction of idle games and stale user presence.
///
/// Owns no state: it mutates the registry exclusively through its
/// public API. The scheduling (a tokio interval) is separate from the
/// sweep itself so tests can drive `sweep` directly.
pub struct PresenceCleanup {
    registry: Arc<GameRegistry>,
    relay: Arc<EventRelay>,
    gateway: BroadcastGateway,
    interval: Duration,
    game_idle: chrono::Duration,
    presence_idle: chrono::Duration,
}

impl PresenceCleanup {
    pub fn new(
        registry: Arc<GameRegistry>,
        relay: Arc<EventRelay>,
        gateway: BroadcastGateway,
        config: &CleanupConfig,
    ) -> Self {
        Self {
            registry,
            relay,
            gateway,
            interval: Duration::from_secs(config.interval_secs),
            game_idle: chrono::Duration::seconds(config.game_idle_timeout_secs as i64),
            presence_idle: chrono::Duration::seconds(config.presence_idle_timeout_secs as i64),
        }
    }

    /// Background loop; spawn once at startup.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            let report = self.sweep();
            if report.changed() {
                tracing::info!(
                    removed_games = report.removed_games,
                    dropped_users = report.dropped_users,
                    "cleanup sweep evicted stale state"
                );
            }
        }
    }

    /// One pass over all games and users. A failure evicting one game
    /// is logged and the rest of the sweep continues.
    pub fn sweep(&self) -> SweepReport {
        let now = Utc::now();
        let game_cutoff = now - self.game_idle;

        let stale: Vec<Uuid> = self
            .registry
            .list()
            .iter()
            .filter(|game| game.last_activity_at < game_cutoff)
            .map(|game| game.id)
            .collect();

        let mut removed_games = 0;
        for id in stale {
            match self.registry.remove(id) {
                Ok(_) => removed_games += 1,
                Err(e) => {
                    tracing::warn!(game_id = %id, "failed to evict idle game: {}", e);
                }
            }
        }

        let dropped_users = self.registry.prune_presence(now - self.presence_idle);

        let report = SweepReport {
            removed_games,
            dropped_users,
        };
        if report.changed() {
            self.announce_games();
        }
        report
    }

    /// Publish the post-sweep game list so clients drop evicted games.
    fn announce_games(&self) {
        let games: Vec<GameView> = self.registry.list().iter().map(GameView::from).collect();
        let payload = match serde_json::to_value(&games) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to serialize games snapshot: {}", e);
                return;
            }
        };
        self.relay
            .publish(LOBBY_CHANNEL, EventType::GamesUpdated, payload.clone());
        self.gateway
            .publish(LOBBY_CHANNEL, EventType::GamesUpdated, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_setup() -> (PresenceCleanup, Arc<GameRegistry>, Arc<EventRelay>) {
        let relay = Arc::new(EventRelay::new());
        let registry = Arc::new(GameRegistry::new(
            relay.clone(),
            BroadcastGateway::disabled(),
            None,
        ));
        let config = CleanupConfig {
            interval_secs: 60,
            game_idle_timeout_secs: 600,
            presence_idle_timeout_secs: 600,
        };
        let cleanup = PresenceCleanup::new(
            registry.clone(),
            relay.clone(),
            BroadcastGateway::disabled(),
            &config,
        );
        (cleanup, registry, relay)
    }

    #[test]
    fn test_idle_games_are_evicted_and_fresh_ones_kept() {
        let (cleanup, registry, _relay) = test_setup();
        let idle = registry.create_game("idle", "Alice");
        let fresh = registry.create_game("fresh", "Bob");
        registry.backdate_game(idle.id, Utc::now() - chrono::Duration::hours(1));

        // Present before the sweep
        assert_eq!(registry.list().len(), 2);

        let report = cleanup.sweep();
        assert_eq!(report.removed_games, 1);

        let remaining: Vec<_> = registry.list().iter().map(|g| g.id).collect();
        assert_eq!(remaining, vec![fresh.id]);
    }

    #[test]
    fn test_changed_sweep_announces_fresh_snapshot() {
        let (cleanup, registry, relay) = test_setup();
        let idle = registry.create_game("idle", "Alice");
        let keeper = registry.create_game("keeper", "Bob");
        registry.backdate_game(idle.id, Utc::now() - chrono::Duration::hours(1));

        cleanup.sweep();

        let events = relay.since(LOBBY_CHANNEL, None);
        let snapshot = events
            .iter()
            .rev()
            .find(|e| e.event_type == EventType::GamesUpdated)
            .expect("sweep should announce the game list");
        let listed = snapshot.payload.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], keeper.id.to_string());
    }

    #[test]
    fn test_quiet_sweep_publishes_nothing() {
        let (cleanup, registry, relay) = test_setup();
        registry.create_game("fresh", "Alice");
        let before = relay.since(LOBBY_CHANNEL, None).len();

        let report = cleanup.sweep();
        assert!(!report.changed());
        assert_eq!(relay.since(LOBBY_CHANNEL, None).len(), before);
    }

    #[test]
    fn test_stale_users_are_dropped() {
        let (cleanup, registry, _relay) = test_setup();
        registry.create_game("g", "Alice");
        registry.backdate_user("Alice", Utc::now() - chrono::Duration::hours(2));

        let report = cleanup.sweep();
        assert_eq!(report.dropped_users, 1);
        assert_eq!(registry.tracked_user_count(), 0);
    }
}
