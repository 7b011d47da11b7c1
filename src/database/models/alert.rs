use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertRule {
    pub id: i64,
    pub name: String,
    pub metric: String,
    pub threshold: f64,
    pub operator: String,
    pub duration: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Alert occurrence joined with its rule and server for display.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertEvent {
    pub id: i64,
    pub rule_id: Option<i64>,
    pub server_id: Option<i64>,
    pub alert_level: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub rule_name: Option<String>,
    pub metric: Option<String>,
    pub hostname: Option<String>,
}

/// 24-hour summary counters.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertStats {
    pub total: i64,
    pub info: i64,
    pub warning: i64,
    pub critical: i64,
    pub unresolved: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct AlertTrendRow {
    pub time_label: String,
    pub info_count: i64,
    pub warning_count: i64,
    pub critical_count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertTrend {
    pub timestamps: Vec<String>,
    pub info: Vec<i64>,
    pub warning: Vec<i64>,
    pub critical: Vec<i64>,
}

impl From<Vec<AlertTrendRow>> for AlertTrend {
    fn from(rows: Vec<AlertTrendRow>) -> Self {
        let mut trend = AlertTrend::default();
        for row in rows {
            trend.timestamps.push(row.time_label);
            trend.info.push(row.info_count);
            trend.warning.push(row.warning_count);
            trend.critical.push(row.critical_count);
        }
        trend
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlertRule {
    pub name: String,
    pub metric: String,
    pub threshold: f64,
    pub operator: String,
    pub duration: Option<i32>,
    pub enabled: Option<bool>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertRuleUpdate {
    pub name: Option<String>,
    pub metric: Option<String>,
    pub threshold: Option<f64>,
    pub operator: Option<String>,
    pub duration: Option<i32>,
    pub enabled: Option<bool>,
}

impl AlertRuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.metric.is_none()
            && self.threshold.is_none()
            && self.operator.is_none()
            && self.duration.is_none()
            && self.enabled.is_none()
    }
}
