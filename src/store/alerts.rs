use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::alert::{
    AlertEvent, AlertRule, AlertRuleUpdate, AlertStats, AlertTrend, AlertTrendRow, NewAlertRule,
};
use crate::database::DatabaseError;

const SELECT_EVENT: &str = "SELECT ah.id, ah.rule_id, ah.server_id, ah.alert_level, ah.message, \
     ah.status, ah.created_at, ah.resolved_at, \
     ar.name AS rule_name, ar.metric, s.hostname \
     FROM alert_history ah \
     LEFT JOIN alert_rules ar ON ah.rule_id = ar.id \
     LEFT JOIN servers s ON ah.server_id = s.id";

/// Optional history filters; all of them combine with AND.
#[derive(Debug, Default, Clone)]
pub struct AlertHistoryFilter {
    pub level: Option<String>,
    pub status: Option<String>,
    pub server_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

pub struct AlertStore {
    pool: PgPool,
}

impl AlertStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_rules(&self, page: i64, page_size: i64) -> Result<(Vec<AlertRule>, i64), DatabaseError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alert_rules")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, AlertRule>(
            "SELECT * FROM alert_rules ORDER BY id DESC LIMIT $1 OFFSET $2",
        )
        .bind(page_size)
        .bind(super::offset(page, page_size))
        .fetch_all(&self.pool)
        .await?;
        Ok((rows, total))
    }

    pub async fn find_rule(&self, id: i64) -> Result<Option<AlertRule>, DatabaseError> {
        let row = sqlx::query_as::<_, AlertRule>("SELECT * FROM alert_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_rule(&self, rule: &NewAlertRule) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO alert_rules (name, metric, threshold, operator, duration, enabled) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&rule.name)
        .bind(&rule.metric)
        .bind(rule.threshold)
        .bind(&rule.operator)
        .bind(rule.duration.unwrap_or(60))
        .bind(rule.enabled.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Apply only the fields present in `changes`. Unknown ids are a silent
    /// no-op at this layer.
    pub async fn update_rule(&self, id: i64, changes: &AlertRuleUpdate) -> Result<(), DatabaseError> {
        let Some(mut query) = build_rule_update(id, changes) else {
            return Ok(());
        };
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete_rule(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM alert_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_history(
        &self,
        filter: &AlertHistoryFilter,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<AlertEvent>, i64), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM alert_history ah WHERE 1=1");
        push_history_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(SELECT_EVENT);
        query.push(" WHERE 1=1");
        push_history_filters(&mut query, filter);
        query
            .push(" ORDER BY ah.created_at DESC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(super::offset(page, page_size));

        let rows = query.build_query_as::<AlertEvent>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Resolving an unknown or already-resolved alert affects zero rows and
    /// is not an error.
    pub async fn resolve(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE alert_history SET status = 'resolved', resolved_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<AlertStats, DatabaseError> {
        let stats = sqlx::query_as::<_, AlertStats>(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE alert_level = 'info') AS info, \
             COUNT(*) FILTER (WHERE alert_level = 'warning') AS warning, \
             COUNT(*) FILTER (WHERE alert_level = 'critical') AS critical, \
             COUNT(*) FILTER (WHERE status = 'triggered') AS unresolved \
             FROM alert_history \
             WHERE created_at >= NOW() - INTERVAL '24 hours'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<AlertEvent>, DatabaseError> {
        let sql = format!("{SELECT_EVENT} WHERE ah.status = 'triggered' ORDER BY ah.created_at DESC LIMIT $1");
        let rows = sqlx::query_as::<_, AlertEvent>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn trend(&self, range: &str) -> Result<AlertTrend, DatabaseError> {
        let (bucket, window) = match range {
            "7d" => ("hour", "7 days"),
            "30d" => ("day", "30 days"),
            _ => ("hour", "24 hours"),
        };

        let rows = sqlx::query_as::<_, AlertTrendRow>(
            "SELECT to_char(date_trunc($1, created_at), 'YYYY-MM-DD HH24:MI') AS time_label, \
             COUNT(*) FILTER (WHERE alert_level = 'info') AS info_count, \
             COUNT(*) FILTER (WHERE alert_level = 'warning') AS warning_count, \
             COUNT(*) FILTER (WHERE alert_level = 'critical') AS critical_count \
             FROM alert_history \
             WHERE created_at >= NOW() - $2::INTERVAL \
             GROUP BY 1 ORDER BY 1",
        )
        .bind(bucket)
        .bind(window)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into())
    }
}

fn push_history_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a AlertHistoryFilter) {
    if let Some(level) = &filter.level {
        query.push(" AND ah.alert_level = ").push_bind(level);
    }
    if let Some(status) = &filter.status {
        query.push(" AND ah.status = ").push_bind(status);
    }
    if let Some(server_id) = filter.server_id {
        query.push(" AND ah.server_id = ").push_bind(server_id);
    }
    if let Some(start) = filter.start_time {
        query.push(" AND ah.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end_time {
        query.push(" AND ah.created_at <= ").push_bind(end);
    }
}

fn build_rule_update<'a>(id: i64, changes: &'a AlertRuleUpdate) -> Option<QueryBuilder<'a, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE alert_rules SET ");
    let mut set = qb.separated(", ");
    if let Some(name) = &changes.name {
        set.push("name = ").push_bind_unseparated(name);
    }
    if let Some(metric) = &changes.metric {
        set.push("metric = ").push_bind_unseparated(metric);
    }
    if let Some(threshold) = changes.threshold {
        set.push("threshold = ").push_bind_unseparated(threshold);
    }
    if let Some(operator) = &changes.operator {
        set.push("operator = ").push_bind_unseparated(operator);
    }
    if let Some(duration) = changes.duration {
        set.push("duration = ").push_bind_unseparated(duration);
    }
    if let Some(enabled) = changes.enabled {
        set.push("enabled = ").push_bind_unseparated(enabled);
    }
    qb.push(" WHERE id = ").push_bind(id);
    Some(qb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rule_update_builds_nothing() {
        assert!(build_rule_update(1, &AlertRuleUpdate::default()).is_none());
    }

    #[test]
    fn toggle_touches_only_enabled() {
        let changes = AlertRuleUpdate {
            enabled: Some(false),
            ..Default::default()
        };
        let sql = build_rule_update(1, &changes).unwrap().into_sql();
        assert!(sql.contains("enabled = "));
        assert!(!sql.contains("threshold"));
        assert!(!sql.contains("metric"));
    }

    #[test]
    fn history_filters_compose_with_and() {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM alert_history ah WHERE 1=1");
        let filter = AlertHistoryFilter {
            level: Some("critical".into()),
            status: Some("triggered".into()),
            server_id: Some(3),
            start_time: None,
            end_time: None,
        };
        push_history_filters(&mut qb, &filter);
        let sql = qb.into_sql();
        assert!(sql.contains("ah.alert_level = "));
        assert!(sql.contains("ah.status = "));
        assert!(sql.contains("ah.server_id = "));
        assert!(!sql.contains("ah.created_at"));
    }
}
