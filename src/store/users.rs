use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::user::{NewUser, Permission, UserRecord, UserUpdate};
use crate::database::DatabaseError;

const SELECT_USER: &str = "SELECT u.id, u.username, u.email, u.password_hash, u.role_id, \
     u.status, u.last_login, u.created_at, u.updated_at, \
     r.name AS role_name, r.description AS role_description \
     FROM users u LEFT JOIN roles r ON u.role_id = r.id";

pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, DatabaseError> {
        let sql = format!("{SELECT_USER} WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let sql = format!("{SELECT_USER} WHERE u.username = $1");
        let row = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, user: &NewUser) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash, role_id, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(&user.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Apply only the fields present in `changes`. Unknown ids are a silent
    /// no-op at this layer.
    pub async fn update(&self, id: i64, changes: &UserUpdate) -> Result<(), DatabaseError> {
        let Some(mut query) = build_update(id, changes) else {
            return Ok(());
        };
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    /// Best-effort: callers log failures instead of surfacing them.
    pub async fn touch_last_login(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn permissions(&self, user_id: i64) -> Result<Vec<Permission>, DatabaseError> {
        let rows = sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.resource, p.action, p.description \
             FROM permissions p \
             INNER JOIN role_permissions rp ON rp.permission_id = p.id \
             INNER JOIN users u ON u.role_id = rp.role_id \
             WHERE u.id = $1 \
             ORDER BY p.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn build_update<'a>(id: i64, changes: &'a UserUpdate) -> Option<QueryBuilder<'a, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE users SET ");
    let mut set = qb.separated(", ");
    if let Some(email) = &changes.email {
        set.push("email = ").push_bind_unseparated(email);
    }
    if let Some(role_id) = changes.role_id {
        set.push("role_id = ").push_bind_unseparated(role_id);
    }
    if let Some(status) = &changes.status {
        set.push("status = ").push_bind_unseparated(status);
    }
    if let Some(hash) = &changes.password_hash {
        set.push("password_hash = ").push_bind_unseparated(hash);
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
        assert!(build_update(1, &UserUpdate::default()).is_none());
    }

    #[test]
    fn update_only_touches_present_fields() {
        let changes = UserUpdate {
            email: Some("new@example.com".into()),
            ..Default::default()
        };
        let sql = build_update(1, &changes).unwrap().into_sql();
        assert!(sql.contains("email = "));
        assert!(!sql.contains("role_id"));
        assert!(!sql.contains("status"));
        assert!(!sql.contains("password_hash"));
        assert!(sql.contains("WHERE id = "));
    }
}
