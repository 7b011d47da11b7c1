use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::ticket::{NewTicket, Ticket, TicketComment, TicketStats, TicketUpdate};
use crate::database::DatabaseError;

const SELECT_TICKET: &str = "SELECT t.id, t.title, t.description, t.type AS ticket_type, \
     t.priority, t.status, t.requester_id, t.assignee_id, t.resolution, \
     t.created_at, t.updated_at, t.resolved_at, \
     req.username AS requester_name, asg.username AS assignee_name \
     FROM tickets t \
     LEFT JOIN users req ON t.requester_id = req.id \
     LEFT JOIN users asg ON t.assignee_id = asg.id";

/// Optional list filters; all of them combine with AND.
#[derive(Debug, Default, Clone)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub ticket_type: Option<String>,
    pub keyword: Option<String>,
}

pub struct TicketStore {
    pool: PgPool,
}

impl TicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &TicketFilter,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Ticket>, i64), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM tickets t WHERE 1=1");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(SELECT_TICKET);
        query.push(" WHERE 1=1");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY t.id DESC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(super::offset(page, page_size));

        let rows = query.build_query_as::<Ticket>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Ticket>, DatabaseError> {
        let sql = format!("{SELECT_TICKET} WHERE t.id = $1");
        let row = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, ticket: &NewTicket, requester_id: i64) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO tickets (title, description, type, priority, status, requester_id, assignee_id) \
             VALUES ($1, $2, $3, $4, 'open', $5, $6) RETURNING id",
        )
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(&ticket.ticket_type)
        .bind(&ticket.priority)
        .bind(requester_id)
        .bind(ticket.assignee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Apply only the fields present in `changes`. Unknown ids are a silent
    /// no-op at this layer.
    pub async fn update(&self, id: i64, changes: &TicketUpdate) -> Result<(), DatabaseError> {
        let Some(mut query) = build_update(id, changes) else {
            return Ok(());
        };
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn assign(&self, id: i64, assignee_id: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE tickets SET assignee_id = $2, status = 'assigned', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(assignee_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn start(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE tickets SET status = 'in_progress', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn resolve(&self, id: i64, resolution: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE tickets SET status = 'resolved', resolution = $2, resolved_at = NOW(), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(resolution)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn close(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE tickets SET status = 'closed', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, DatabaseError> {
        let rows = sqlx::query_as::<_, TicketComment>(
            "SELECT c.id, c.ticket_id, c.user_id, c.content, c.created_at, u.username \
             FROM ticket_comments c \
             LEFT JOIN users u ON c.user_id = u.id \
             WHERE c.ticket_id = $1 \
             ORDER BY c.created_at",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn add_comment(
        &self,
        ticket_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO ticket_comments (ticket_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn find_comment(&self, id: i64) -> Result<Option<TicketComment>, DatabaseError> {
        let row = sqlx::query_as::<_, TicketComment>(
            "SELECT c.id, c.ticket_id, c.user_id, c.content, c.created_at, u.username \
             FROM ticket_comments c \
             LEFT JOIN users u ON c.user_id = u.id \
             WHERE c.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn stats(&self) -> Result<TicketStats, DatabaseError> {
        let stats = sqlx::query_as::<_, TicketStats>(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE status IN ('open', 'assigned', 'in_progress')) AS open, \
             COUNT(*) FILTER (WHERE priority = 'urgent' \
                 AND status IN ('open', 'assigned', 'in_progress')) AS urgent \
             FROM tickets",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}

fn push_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a TicketFilter) {
    if let Some(status) = &filter.status {
        query.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = &filter.priority {
        query.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(ticket_type) = &filter.ticket_type {
        query.push(" AND t.type = ").push_bind(ticket_type);
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        query
            .push(" AND (t.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn build_update<'a>(id: i64, changes: &'a TicketUpdate) -> Option<QueryBuilder<'a, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE tickets SET ");
    let mut set = qb.separated(", ");
    if let Some(title) = &changes.title {
        set.push("title = ").push_bind_unseparated(title);
    }
    if let Some(description) = &changes.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    if let Some(ticket_type) = &changes.ticket_type {
        set.push("type = ").push_bind_unseparated(ticket_type);
    }
    if let Some(priority) = &changes.priority {
        set.push("priority = ").push_bind_unseparated(priority);
    }
    if let Some(assignee_id) = changes.assignee_id {
        set.push("assignee_id = ").push_bind_unseparated(assignee_id);
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
        assert!(build_update(1, &TicketUpdate::default()).is_none());
    }

    #[test]
    fn update_only_touches_present_fields() {
        let changes = TicketUpdate {
            priority: Some("urgent".into()),
            ..Default::default()
        };
        let sql = build_update(1, &changes).unwrap().into_sql();
        assert!(sql.contains("priority = "));
        assert!(!sql.contains("title"));
        assert!(!sql.contains("assignee_id"));
    }

    #[test]
    fn keyword_filter_searches_title_and_description() {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tickets t WHERE 1=1");
        let filter = TicketFilter {
            keyword: Some("disk".into()),
            ..Default::default()
        };
        push_filters(&mut qb, &filter);
        let sql = qb.into_sql();
        assert!(sql.contains("t.title ILIKE "));
        assert!(sql.contains("t.description ILIKE "));
    }
}
