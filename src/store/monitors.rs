use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::monitor::{
    MonitorSample, MonitorStats, NetworkTrend, NetworkTrendRow, ResourceTrend, ResourceTrendRow,
    ServerUsage,
};
use crate::database::DatabaseError;

/// Chart ranges map to a lookback window and a bucket width.
fn trend_window(range: &str) -> (&'static str, &'static str) {
    match range {
        "1h" => ("minute", "1 hour"),
        "7d" => ("hour", "7 days"),
        "30d" => ("day", "30 days"),
        _ => ("hour", "24 hours"),
    }
}

pub struct MonitorStore {
    pool: PgPool,
}

impl MonitorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_server(
        &self,
        server_id: i64,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<MonitorSample>, i64), DatabaseError> {
        let mut count_query =
            QueryBuilder::new("SELECT COUNT(*) FROM monitor_data WHERE server_id = ");
        count_query.push_bind(server_id);
        push_time_range(&mut count_query, start_time, end_time);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM monitor_data WHERE server_id = ");
        query.push_bind(server_id);
        push_time_range(&mut query, start_time, end_time);
        query
            .push(" ORDER BY timestamp DESC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(super::offset(page, page_size));

        let rows = query
            .build_query_as::<MonitorSample>()
            .fetch_all(&self.pool)
            .await?;
        Ok((rows, total))
    }

    pub async fn latest_by_server(&self, server_id: i64) -> Result<Option<MonitorSample>, DatabaseError> {
        let row = sqlx::query_as::<_, MonitorSample>(
            "SELECT * FROM monitor_data WHERE server_id = $1 ORDER BY timestamp DESC LIMIT 1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Latest sample per requested server; servers with no samples are
    /// simply absent from the result.
    pub async fn latest_by_servers(&self, server_ids: &[i64]) -> Result<Vec<MonitorSample>, DatabaseError> {
        if server_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query_as::<_, MonitorSample>(
            "SELECT DISTINCT ON (server_id) * FROM monitor_data \
             WHERE server_id = ANY($1) \
             ORDER BY server_id, timestamp DESC",
        )
        .bind(server_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Averages and totals over the trailing hour, optionally scoped to one
    /// server.
    pub async fn stats(&self, server_id: Option<i64>) -> Result<MonitorStats, DatabaseError> {
        let mut query = QueryBuilder::new(
            "SELECT COALESCE(AVG(cpu_usage), 0)::DOUBLE PRECISION AS avg_cpu_usage, \
             COALESCE(AVG(memory_usage), 0)::DOUBLE PRECISION AS avg_memory_usage, \
             COALESCE(AVG(disk_usage), 0)::DOUBLE PRECISION AS avg_disk_usage, \
             COALESCE(SUM(network_in), 0)::BIGINT AS total_network_in, \
             COALESCE(SUM(network_out), 0)::BIGINT AS total_network_out \
             FROM monitor_data WHERE timestamp >= NOW() - INTERVAL '1 hour'",
        );
        if let Some(server_id) = server_id {
            query.push(" AND server_id = ").push_bind(server_id);
        }

        let stats = query
            .build_query_as::<MonitorStats>()
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }

    pub async fn resource_trend(&self, range: &str) -> Result<ResourceTrend, DatabaseError> {
        let (bucket, window) = trend_window(range);
        let rows = sqlx::query_as::<_, ResourceTrendRow>(
            "SELECT to_char(date_trunc($1, timestamp), 'YYYY-MM-DD HH24:MI') AS time_label, \
             ROUND(AVG(cpu_usage)::NUMERIC, 2)::DOUBLE PRECISION AS avg_cpu, \
             ROUND(AVG(memory_usage)::NUMERIC, 2)::DOUBLE PRECISION AS avg_memory, \
             ROUND(AVG(disk_usage)::NUMERIC, 2)::DOUBLE PRECISION AS avg_disk \
             FROM monitor_data \
             WHERE timestamp >= NOW() - $2::INTERVAL \
             GROUP BY 1 ORDER BY 1",
        )
        .bind(bucket)
        .bind(window)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into())
    }

    /// Servers ranked by their most recent sample for `metric`. The metric
    /// name is mapped to a column here, never interpolated from input.
    pub async fn top_usage(&self, metric: &str, limit: i64) -> Result<Vec<ServerUsage>, DatabaseError> {
        let column = match metric {
            "memory" => "memory_usage",
            "disk" => "disk_usage",
            _ => "cpu_usage",
        };

        let sql = format!(
            "SELECT s.id, s.hostname, latest.{column} AS usage \
             FROM servers s \
             INNER JOIN ( \
                 SELECT DISTINCT ON (server_id) server_id, cpu_usage, memory_usage, disk_usage \
                 FROM monitor_data ORDER BY server_id, timestamp DESC \
             ) latest ON latest.server_id = s.id \
             ORDER BY usage DESC LIMIT $1"
        );

        let rows = sqlx::query_as::<_, ServerUsage>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn network_trend(&self, range: &str) -> Result<NetworkTrend, DatabaseError> {
        let (bucket, window) = trend_window(range);
        let rows = sqlx::query_as::<_, NetworkTrendRow>(
            "SELECT to_char(date_trunc($1, timestamp), 'YYYY-MM-DD HH24:MI') AS time_label, \
             COALESCE(SUM(network_in), 0)::BIGINT AS total_in, \
             COALESCE(SUM(network_out), 0)::BIGINT AS total_out \
             FROM monitor_data \
             WHERE timestamp >= NOW() - $2::INTERVAL \
             GROUP BY 1 ORDER BY 1",
        )
        .bind(bucket)
        .bind(window)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into())
    }
}

fn push_time_range(
    query: &mut QueryBuilder<'_, Postgres>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
) {
    if let Some(start) = start_time {
        query.push(" AND timestamp >= ").push_bind(start);
    }
    if let Some(end) = end_time {
        query.push(" AND timestamp <= ").push_bind(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_map_to_window_and_bucket() {
        assert_eq!(trend_window("1h"), ("minute", "1 hour"));
        assert_eq!(trend_window("24h"), ("hour", "24 hours"));
        assert_eq!(trend_window("7d"), ("hour", "7 days"));
        assert_eq!(trend_window("30d"), ("day", "30 days"));
        // Unknown ranges fall back to the daily view
        assert_eq!(trend_window("nonsense"), ("hour", "24 hours"));
    }

    #[test]
    fn time_range_filters_are_optional() {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM monitor_data WHERE server_id = 1");
        push_time_range(&mut qb, None, None);
        assert!(!qb.into_sql().contains("timestamp"));

        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM monitor_data WHERE server_id = 1");
        push_time_range(&mut qb, Some(Utc::now()), None);
        let sql = qb.into_sql();
        assert!(sql.contains("timestamp >= "));
        assert!(!sql.contains("timestamp <= "));
    }
}
