use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Persisted monitoring sample for one server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonitorSample {
    pub id: i64,
    pub server_id: i64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_in: i64,
    pub network_out: i64,
    pub temperature: Option<f64>,
    pub power_usage: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates over the trailing hour.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    pub avg_cpu_usage: f64,
    pub avg_memory_usage: f64,
    pub avg_disk_usage: f64,
    pub total_network_in: i64,
    pub total_network_out: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ResourceTrendRow {
    pub time_label: String,
    pub avg_cpu: f64,
    pub avg_memory: f64,
    pub avg_disk: f64,
}

/// Column-oriented trend series as consumed by the dashboard charts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceTrend {
    pub timestamps: Vec<String>,
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
    pub disk: Vec<f64>,
}

impl From<Vec<ResourceTrendRow>> for ResourceTrend {
    fn from(rows: Vec<ResourceTrendRow>) -> Self {
        let mut trend = ResourceTrend::default();
        for row in rows {
            trend.timestamps.push(row.time_label);
            trend.cpu.push(row.avg_cpu);
            trend.memory.push(row.avg_memory);
            trend.disk.push(row.avg_disk);
        }
        trend
    }
}

/// One server's latest usage for a single metric, used by the dashboard
/// top-N view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServerUsage {
    pub id: i64,
    pub hostname: String,
    pub usage: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct NetworkTrendRow {
    pub time_label: String,
    pub total_in: i64,
    pub total_out: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkTrend {
    pub timestamps: Vec<String>,
    #[serde(rename = "in")]
    pub network_in: Vec<i64>,
    #[serde(rename = "out")]
    pub network_out: Vec<i64>,
}

impl From<Vec<NetworkTrendRow>> for NetworkTrend {
    fn from(rows: Vec<NetworkTrendRow>) -> Self {
        let mut trend = NetworkTrend::default();
        for row in rows {
            trend.timestamps.push(row.time_label);
            trend.network_in.push(row.total_in);
            trend.network_out.push(row.total_out);
        }
        trend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_trend_pivots_rows_into_series() {
        let rows = vec![
            ResourceTrendRow {
                time_label: "2026-08-06 10:00".into(),
                avg_cpu: 41.5,
                avg_memory: 60.0,
                avg_disk: 70.25,
            },
            ResourceTrendRow {
                time_label: "2026-08-06 11:00".into(),
                avg_cpu: 43.0,
                avg_memory: 61.0,
                avg_disk: 70.5,
            },
        ];

        let trend = ResourceTrend::from(rows);
        assert_eq!(trend.timestamps.len(), 2);
        assert_eq!(trend.cpu, vec![41.5, 43.0]);
        assert_eq!(trend.disk[1], 70.5);
    }

    #[test]
    fn network_trend_serializes_in_out_keys() {
        let trend = NetworkTrend::from(vec![NetworkTrendRow {
            time_label: "2026-08-06 10:00".into(),
            total_in: 1000,
            total_out: 2000,
        }]);
        let json = serde_json::to_value(&trend).unwrap();
        assert_eq!(json["in"][0], 1000);
        assert_eq!(json["out"][0], 2000);
    }
}
