use serde::Serialize;
use serde_json::Value;

use crate::relay::EventType;

/// Body shape the external push service expects.
#[derive(Debug, Clone, Serialize)]
struct PushEnvelope {
    channel: String,
    event: EventType,
    payload: Value,
}

/// Best-effort adapter forwarding relay events to the external push
/// transport over HTTP. Delivery is fire-and-forget: the request runs
/// in a detached task, failures are logged and discarded, and nothing
/// propagates back to the state mutation that triggered the event.
#[derive(Clone)]
pub struct BroadcastGateway {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl BroadcastGateway {
    pub fn new(client: reqwest::Client, endpoint: Option<String>, api_key: Option<String>) -> Self {
        if endpoint.is_none() {
            tracing::warn!("PUSH_ENDPOINT not set; outbound event fanout is disabled");
        }
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// A gateway that drops everything.
    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: None,
            api_key: None,
        }
    }

    /// Forward one event. Returns as soon as the request task is
    /// spawned; the caller must not wait on, or hold locks for, the
    /// delivery itself.
    pub fn publish(&self, channel: &str, event_type: EventType, payload: Value) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };
        let url = format!("{}/events", endpoint.trim_end_matches('/'));
        let envelope = PushEnvelope {
            channel: channel.to_string(),
            event: event_type,
            payload,
        };
        let client = self.client.clone();
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            let mut request = client.post(&url).json(&envelope);
            if let Some(key) = &api_key {
                request = request.bearer_auth(key);
            }
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(
                        status = %response.status(),
                        channel = %envelope.channel,
                        "push transport rejected event"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(channel = %envelope.channel, "push transport unreachable: {}", e);
                }
            }
        });
    }
}
