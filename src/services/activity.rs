//! Activity log service

use crate::{
    error::AppResult,
    models::{
        activity::{ActivityEntry, ActivityQuery, ActivitySummary, ClientInfo, NewActivity},
        pagination::Pagination,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Write an activity entry. Failures are logged and swallowed.
    pub async fn record(
        &self,
        user_id: Option<i32>,
        client: &ClientInfo,
        action: &str,
        table_affected: Option<&str>,
        record_id: Option<i32>,
        description: impl Into<String>,
    ) {
        let entry = NewActivity {
            user_id,
            action,
            table_affected,
            record_id,
            description: description.into(),
        };

        if let Err(e) = self.repository.activity.insert(&entry, client).await {
            tracing::warn!(
                action = entry.action,
                user_id = ?entry.user_id,
                "Failed to write activity log: {}",
                e
            );
        }
    }

    pub async fn search(&self, query: &ActivityQuery, pagination: Pagination) -> AppResult<(Vec<ActivityEntry>, i64)> {
        self.repository.activity.search(query, pagination).await
    }

    pub async fn actions(&self) -> AppResult<Vec<String>> {
        self.repository.activity.distinct_actions().await
    }

    pub async fn summary(&self) -> AppResult<ActivitySummary> {
        self.repository.activity.summary(super::today()).await
    }
}
