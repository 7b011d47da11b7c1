use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::asset::{Asset, AssetStats, AssetUpdate, NewAsset};
use crate::database::DatabaseError;

const SELECT_ASSET: &str = "SELECT id, name, type AS asset_type, status, value, description, \
     location, server_id, created_at, updated_at FROM assets";

/// Optional list filters; all of them combine with AND.
#[derive(Debug, Default, Clone)]
pub struct AssetFilter {
    pub asset_type: Option<String>,
    pub status: Option<String>,
    pub keyword: Option<String>,
}

pub struct AssetStore {
    pool: PgPool,
}

impl AssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &AssetFilter,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Asset>, i64), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM assets WHERE 1=1");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(SELECT_ASSET);
        query.push(" WHERE 1=1");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(super::offset(page, page_size));

        let rows = query.build_query_as::<Asset>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Asset>, DatabaseError> {
        let sql = format!("{SELECT_ASSET} WHERE id = $1");
        let row = sqlx::query_as::<_, Asset>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, asset: &NewAsset) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO assets (name, type, status, value, description, location, server_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&asset.name)
        .bind(&asset.asset_type)
        .bind(asset.status.as_deref().unwrap_or("available"))
        .bind(&asset.value)
        .bind(&asset.description)
        .bind(&asset.location)
        .bind(asset.server_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Apply only the fields present in `changes`. Unknown ids are a silent
    /// no-op at this layer.
    pub async fn update(&self, id: i64, changes: &AssetUpdate) -> Result<(), DatabaseError> {
        let Some(mut query) = build_update(id, changes) else {
            return Ok(());
        };
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<AssetStats, DatabaseError> {
        let stats = sqlx::query_as::<_, AssetStats>(
            "SELECT COUNT(*) FILTER (WHERE type = 'rack') AS racks, \
             COUNT(*) FILTER (WHERE type = 'ip') AS ips, \
             COUNT(*) FILTER (WHERE type = 'bandwidth') AS bandwidth, \
             COUNT(*) FILTER (WHERE type = 'hardware') AS hardware \
             FROM assets",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}

fn push_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a AssetFilter) {
    if let Some(asset_type) = &filter.asset_type {
        query.push(" AND type = ").push_bind(asset_type);
    }
    if let Some(status) = &filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn build_update<'a>(id: i64, changes: &'a AssetUpdate) -> Option<QueryBuilder<'a, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE assets SET ");
    let mut set = qb.separated(", ");
    if let Some(name) = &changes.name {
        set.push("name = ").push_bind_unseparated(name);
    }
    if let Some(asset_type) = &changes.asset_type {
        set.push("type = ").push_bind_unseparated(asset_type);
    }
    if let Some(status) = &changes.status {
        set.push("status = ").push_bind_unseparated(status);
    }
    if let Some(value) = &changes.value {
        set.push("value = ").push_bind_unseparated(value);
    }
    if let Some(description) = &changes.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    if let Some(location) = &changes.location {
        set.push("location = ").push_bind_unseparated(location);
    }
    if let Some(server_id) = changes.server_id {
        set.push("server_id = ").push_bind_unseparated(server_id);
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
        assert!(build_update(1, &AssetUpdate::default()).is_none());
    }

    #[test]
    fn update_only_touches_present_fields() {
        let changes = AssetUpdate {
            status: Some("in_use".into()),
            server_id: Some(4),
            ..Default::default()
        };
        let sql = build_update(1, &changes).unwrap().into_sql();
        assert!(sql.contains("status = "));
        assert!(sql.contains("server_id = "));
        assert!(!sql.contains("name"));
        assert!(!sql.contains("location"));
    }
}
