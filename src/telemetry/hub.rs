use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

/// Envelope pushed to every connected dashboard client.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: PushKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PushKind {
    Connected,
    Monitor,
    Alert,
    Notification,
}

impl PushMessage {
    pub fn new(kind: PushKind, data: Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Acknowledgment sent once per connection, immediately after upgrade.
    pub fn connected() -> Self {
        Self::new(PushKind::Connected, json!({ "message": "WebSocket connected" }))
    }
}

/// Process-wide fan-out channel for telemetry pushes. Connected clients are
/// broadcast receivers: registration is `subscribe()`, deregistration is
/// dropping the receiver. Delivery is at-most-once with no replay; a
/// receiver that falls behind skips the missed messages.
#[derive(Clone)]
pub struct TelemetryHub {
    tx: broadcast::Sender<PushMessage>,
}

impl TelemetryHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.tx.subscribe()
    }

    /// Deliver a message to every channel open at this moment. Returns the
    /// number of receivers it reached; zero when nobody is connected.
    pub fn broadcast(&self, kind: PushKind, data: Value) -> usize {
        let message = PushMessage::new(kind, data);
        self.tx.send(message).unwrap_or(0)
    }

    pub fn broadcast_monitor<T: Serialize>(&self, sample: &T) -> usize {
        let data = serde_json::to_value(sample).unwrap_or(Value::Null);
        self.broadcast(PushKind::Monitor, data)
    }

    pub fn connected_clients(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_type_tag() {
        let message = PushMessage::connected();
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["data"]["message"], "WebSocket connected");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_open_channel() {
        let hub = TelemetryHub::new(16);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        let delivered = hub.broadcast(PushKind::Monitor, json!({ "serverId": 3 }));
        assert_eq!(delivered, 2);

        let received = first.recv().await.unwrap();
        assert_eq!(received.kind, PushKind::Monitor);
        assert_eq!(received.data["serverId"], 3);

        let received = second.recv().await.unwrap();
        assert_eq!(received.data["serverId"], 3);
    }

    #[tokio::test]
    async fn dropped_channels_are_removed_from_the_live_set() {
        let hub = TelemetryHub::new(16);
        let mut first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.connected_clients(), 2);

        drop(second);
        let delivered = hub.broadcast(PushKind::Notification, json!({ "text": "hi" }));
        assert_eq!(delivered, 1);
        assert_eq!(hub.connected_clients(), 1);
        assert!(first.recv().await.is_ok());
    }

    #[tokio::test]
    async fn broadcast_without_clients_is_dropped() {
        let hub = TelemetryHub::new(16);
        assert_eq!(hub.broadcast(PushKind::Alert, json!({})), 0);

        // A client joining later does not see earlier messages
        let mut late = hub.subscribe();
        assert_eq!(hub.broadcast(PushKind::Alert, json!({ "n": 2 })), 1);
        let received = late.recv().await.unwrap();
        assert_eq!(received.data["n"], 2);
    }
}
