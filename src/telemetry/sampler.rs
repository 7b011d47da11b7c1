use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::telemetry::hub::TelemetryHub;

/// Snapshot pushed over the wire; matches what a collection agent would
/// report for one server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub server_id: i64,
    pub metrics: TelemetryMetrics,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_in: i64,
    pub network_out: i64,
}

impl TelemetrySample {
    /// Synthetic sample for a random server. A real deployment would feed
    /// the hub from ingestion instead; see `spawn_simulator`.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            server_id: rng.gen_range(1..=10),
            metrics: TelemetryMetrics {
                cpu_usage: rng.gen_range(0.0..100.0),
                memory_usage: rng.gen_range(0.0..100.0),
                disk_usage: rng.gen_range(0.0..100.0),
                network_in: rng.gen_range(0..1_000_000),
                network_out: rng.gen_range(0..1_000_000),
            },
            timestamp: Utc::now(),
        }
    }
}

/// Periodically broadcast synthetic monitoring snapshots to all connected
/// dashboard clients. Runs for the lifetime of the process.
pub fn spawn_simulator(hub: TelemetryHub, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let sample = TelemetrySample::generate();
            let delivered = hub.broadcast_monitor(&sample);
            tracing::trace!(
                server_id = sample.server_id,
                delivered,
                "broadcast simulated monitor sample"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_metrics_stay_in_range() {
        for _ in 0..100 {
            let sample = TelemetrySample::generate();
            assert!((1..=10).contains(&sample.server_id));
            assert!((0.0..100.0).contains(&sample.metrics.cpu_usage));
            assert!((0.0..100.0).contains(&sample.metrics.memory_usage));
            assert!(sample.metrics.network_in >= 0);
        }
    }

    #[test]
    fn sample_serializes_camel_case() {
        let sample = TelemetrySample::generate();
        let json = serde_json::to_value(&sample).unwrap();
        assert!(json["serverId"].is_i64());
        assert!(json["metrics"]["cpuUsage"].is_f64());
        assert!(json["metrics"]["networkOut"].is_i64());
    }

    #[tokio::test(start_paused = true)]
    async fn simulator_broadcasts_on_each_tick() {
        let hub = TelemetryHub::new(16);
        let mut rx = hub.subscribe();
        let handle = spawn_simulator(hub, Duration::from_secs(5));

        // First tick fires immediately, the next after the period elapses
        let first = rx.recv().await.unwrap();
        assert_eq!(
            serde_json::to_value(&first.kind).unwrap(),
            serde_json::json!("monitor")
        );

        tokio::time::advance(Duration::from_secs(5)).await;
        let second = rx.recv().await.unwrap();
        assert!(second.data["metrics"]["cpuUsage"].is_f64());

        handle.abort();
    }
}
