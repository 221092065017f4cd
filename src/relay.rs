use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use uuid::Uuid;

/// Maximum buffered events per channel; the oldest are evicted first.
pub const EVENT_LOG_CAPACITY: usize = 100;

/// Channel carrying lobby-wide events (game list changes).
pub const LOBBY_CHANNEL: &str = "lobby";

/// Channel carrying events for a single game.
pub fn game_channel(game_id: Uuid) -> String {
    format!("game-{}", game_id)
}

/// Kinds of domain events flowing through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    GameCreated,
    GameUpdated,
    GameRemoved,
    GamesUpdated,
}

/// One buffered event. `id` comes from a per-channel counter, never a
/// timestamp, so two events in the same millisecond cannot collide and
/// ids are strictly increasing within a channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    pub id: u64,
    pub channel: String,
    pub event_type: EventType,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

struct ChannelLog {
    next_id: u64,
    events: VecDeque<RelayEvent>,
}

impl Default for ChannelLog {
    fn default() -> Self {
        Self {
            next_id: 1,
            events: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }
}

/// Bounded append-only event log per channel, used by reconnecting
/// clients to catch up on missed events.
#[derive(Default)]
pub struct EventRelay {
    channels: DashMap<String, ChannelLog>,
}

impl EventRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to a channel, evicting the oldest entry once the
    /// channel exceeds capacity.
    pub fn publish(&self, channel: &str, event_type: EventType, payload: Value) -> RelayEvent {
        let mut log = self.channels.entry(channel.to_string()).or_default();
        let event = RelayEvent {
            id: log.next_id,
            channel: channel.to_string(),
            event_type,
            payload,
            timestamp: Utc::now(),
        };
        log.next_id += 1;
        log.events.push_back(event.clone());
        if log.events.len() > EVENT_LOG_CAPACITY {
            log.events.pop_front();
        }
        event
    }

    /// Events after `last_event_id`, in publication order.
    ///
    /// When the id is absent or no longer buffered (evicted, or never
    /// issued), the entire current buffer is returned: the caller may
    /// have missed events and must resynchronize from the full snapshot.
    pub fn since(&self, channel: &str, last_event_id: Option<u64>) -> Vec<RelayEvent> {
        let Some(log) = self.channels.get(channel) else {
            return Vec::new();
        };
        match last_event_id.and_then(|id| log.events.iter().position(|e| e.id == id)) {
            Some(pos) => log.events.iter().skip(pos + 1).cloned().collect(),
            None => log.events.iter().cloned().collect(),
        }
    }
}
