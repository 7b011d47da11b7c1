use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::server::{
    NewServer, NewServerGroup, ServerGroup, ServerRow, ServerStats, ServerUpdate,
};
use crate::database::DatabaseError;

const SELECT_SERVER: &str = "SELECT s.id, s.hostname, s.ip_address, s.group_id, s.status, s.os, \
     s.cpu_cores, s.memory_gb, s.disk_gb, s.location, s.description, \
     s.created_at, s.updated_at, \
     g.name AS group_name, g.description AS group_description \
     FROM servers s LEFT JOIN server_groups g ON s.group_id = g.id";

/// Optional list filters; all of them combine with AND.
#[derive(Debug, Default, Clone)]
pub struct ServerFilter {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub group_id: Option<i64>,
}

pub struct ServerStore {
    pool: PgPool,
}

impl ServerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &ServerFilter,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<ServerRow>, i64), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM servers s WHERE 1=1");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(SELECT_SERVER);
        query.push(" WHERE 1=1");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY s.id DESC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(super::offset(page, page_size));

        let rows = query.build_query_as::<ServerRow>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ServerRow>, DatabaseError> {
        let sql = format!("{SELECT_SERVER} WHERE s.id = $1");
        let row = sqlx::query_as::<_, ServerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, server: &NewServer) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO servers (hostname, ip_address, group_id, status, os, cpu_cores, \
             memory_gb, disk_gb, location, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(&server.hostname)
        .bind(&server.ip_address)
        .bind(server.group_id)
        .bind(server.status.as_deref().unwrap_or("offline"))
        .bind(&server.os)
        .bind(server.cpu_cores)
        .bind(server.memory_gb)
        .bind(server.disk_gb)
        .bind(&server.location)
        .bind(&server.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Apply only the fields present in `changes`. Unknown ids are a silent
    /// no-op at this layer.
    pub async fn update(&self, id: i64, changes: &ServerUpdate) -> Result<(), DatabaseError> {
        let Some(mut query) = build_update(id, changes) else {
            return Ok(());
        };
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    /// Idempotent: deleting an unknown id is not an error.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM servers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<ServerStats, DatabaseError> {
        let stats = sqlx::query_as::<_, ServerStats>(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE status = 'online') AS online, \
             COUNT(*) FILTER (WHERE status = 'offline') AS offline, \
             COUNT(*) FILTER (WHERE status = 'maintenance') AS maintenance \
             FROM servers",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn groups(&self) -> Result<Vec<ServerGroup>, DatabaseError> {
        let rows = sqlx::query_as::<_, ServerGroup>(
            "SELECT g.id, g.name, g.description, COUNT(s.id) AS server_count, g.created_at \
             FROM server_groups g \
             LEFT JOIN servers s ON s.group_id = g.id \
             GROUP BY g.id, g.name, g.description, g.created_at \
             ORDER BY g.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_group(&self, group: &NewServerGroup) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO server_groups (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&group.name)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn delete_group(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM server_groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn push_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a ServerFilter) {
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        query
            .push(" AND (s.hostname ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.ip_address ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = &filter.status {
        query.push(" AND s.status = ").push_bind(status);
    }
    if let Some(group_id) = filter.group_id {
        query.push(" AND s.group_id = ").push_bind(group_id);
    }
}

fn build_update<'a>(id: i64, changes: &'a ServerUpdate) -> Option<QueryBuilder<'a, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE servers SET ");
    let mut set = qb.separated(", ");
    if let Some(hostname) = &changes.hostname {
        set.push("hostname = ").push_bind_unseparated(hostname);
    }
    if let Some(ip_address) = &changes.ip_address {
        set.push("ip_address = ").push_bind_unseparated(ip_address);
    }
    if let Some(group_id) = changes.group_id {
        set.push("group_id = ").push_bind_unseparated(group_id);
    }
    if let Some(status) = &changes.status {
        set.push("status = ").push_bind_unseparated(status);
    }
    if let Some(os) = &changes.os {
        set.push("os = ").push_bind_unseparated(os);
    }
    if let Some(cpu_cores) = changes.cpu_cores {
        set.push("cpu_cores = ").push_bind_unseparated(cpu_cores);
    }
    if let Some(memory_gb) = changes.memory_gb {
        set.push("memory_gb = ").push_bind_unseparated(memory_gb);
    }
    if let Some(disk_gb) = changes.disk_gb {
        set.push("disk_gb = ").push_bind_unseparated(disk_gb);
    }
    if let Some(location) = &changes.location {
        set.push("location = ").push_bind_unseparated(location);
    }
    if let Some(description) = &changes.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    set.push("updated_at = NOW()");
    qb.push(" WHERE id = ").push_bind(id);
    Some(qb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_builds_nothing() {
        assert!(build_update(3, &ServerUpdate::default()).is_none());
    }

    #[test]
    fn update_only_touches_present_fields() {
        let changes = ServerUpdate {
            status: Some("maintenance".into()),
            location: Some("Rack A-12".into()),
            ..Default::default()
        };
        let sql = build_update(3, &changes).unwrap().into_sql();
        assert!(sql.contains("status = "));
        assert!(sql.contains("location = "));
        assert!(!sql.contains("hostname"));
        assert!(!sql.contains("ip_address"));
        assert!(!sql.contains("cpu_cores"));
    }

    #[test]
    fn keyword_filter_matches_hostname_and_ip() {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM servers s WHERE 1=1");
        let filter = ServerFilter {
            keyword: Some("web".into()),
            status: Some("online".into()),
            group_id: None,
        };
        push_filters(&mut qb, &filter);
        let sql = qb.into_sql();
        assert!(sql.contains("s.hostname ILIKE "));
        assert!(sql.contains("s.ip_address ILIKE "));
        assert!(sql.contains("s.status = "));
        assert!(!sql.contains("s.group_id"));
    }
}
