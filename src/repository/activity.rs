//! Activity log repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        activity::{actions, local_day_start, ActivityEntry, ActivityQuery, ActivitySummary, ClientInfo, NewActivity},
        pagination::Pagination,
    },
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<Postgres>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &NewActivity<'_>, client: &ClientInfo) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log
                (user_id, action, table_affected, record_id, description, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.table_affected)
        .bind(entry.record_id)
        .bind(&entry.description)
        .bind(&client.ip_address)
        .bind(&client.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Search the log, newest first; date bounds are inclusive
    pub async fn search(&self, query: &ActivityQuery, pagination: Pagination) -> AppResult<(Vec<ActivityEntry>, i64)> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));
        let (created_from, created_until) = query.created_range();
        let action = query
            .action
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let filter = r#"
            WHERE ($1::TEXT IS NULL
                   OR LOWER(a.action) LIKE $1
                   OR LOWER(a.description) LIKE $1
                   OR LOWER(u.username) LIKE $1
                   OR LOWER(u.full_name) LIKE $1)
              AND ($2::INT IS NULL OR a.user_id = $2)
              AND ($3::TEXT IS NULL OR a.action = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR a.created_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR a.created_at < $5)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM activity_log a LEFT JOIN users u ON u.id = a.user_id {}",
            filter
        ))
        .bind(&pattern)
        .bind(query.user_id)
        .bind(action)
        .bind(created_from)
        .bind(created_until)
        .fetch_one(&self.pool)
        .await?;

        let entries = sqlx::query_as::<_, ActivityEntry>(&format!(
            r#"
            SELECT a.id, a.user_id, u.username, u.full_name, a.action, a.table_affected,
                   a.record_id, a.description, a.ip_address, a.user_agent, a.created_at
            FROM activity_log a
            LEFT JOIN users u ON u.id = a.user_id
            {}
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $6 OFFSET $7
            "#,
            filter
        ))
        .bind(&pattern)
        .bind(query.user_id)
        .bind(action)
        .bind(created_from)
        .bind(created_until)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }

    pub async fn distinct_actions(&self) -> AppResult<Vec<String>> {
        let actions: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT action FROM activity_log ORDER BY action")
                .fetch_all(&self.pool)
                .await?;
        Ok(actions)
    }

    pub async fn summary(&self, today: NaiveDate) -> AppResult<ActivitySummary> {
        let day_start = local_day_start(today);
        let day_end = today.succ_opt().map(local_day_start);
        let (activities_today, active_users, failed_logins): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE created_at >= $1 AND ($2::TIMESTAMPTZ IS NULL OR created_at < $2)),
                   COUNT(DISTINCT user_id),
                   COUNT(*) FILTER (WHERE action = $3)
            FROM activity_log
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .bind(actions::LOGIN_FAILED)
        .fetch_one(&self.pool)
        .await?;

        Ok(ActivitySummary {
            activities_today,
            active_users,
            failed_logins,
        })
    }
}
