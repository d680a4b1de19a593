//! Activity log endpoints (administrators only)

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        activity::{ActivityEntry, ActivityQuery, ActivitySummary},
        pagination::PaginatedResponse,
    },
    AppState,
};

use super::{pagination, AuthenticatedUser};

#[utoipa::path(
    get,
    path = "/activity",
    tag = "activity",
    security(("bearer_auth" = [])),
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity log entries", body = PaginatedResponse<ActivityEntry>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_activity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<ActivityEntry>>> {
    claims.require_admin()?;

    let pagination = pagination(&state, query.page, query.per_page);
    let (entries, total) = state.services.activity.search(&query, pagination).await?;

    Ok(Json(PaginatedResponse::new(entries, total, pagination)))
}

/// Distinct action names, for filter dropdowns
#[utoipa::path(
    get,
    path = "/activity/actions",
    tag = "activity",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Action names", body = Vec<String>)
    )
)]
pub async fn list_actions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    claims.require_admin()?;
    Ok(Json(state.services.activity.actions().await?))
}

#[utoipa::path(
    get,
    path = "/activity/summary",
    tag = "activity",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Activity counters", body = ActivitySummary)
    )
)]
pub async fn activity_summary(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ActivitySummary>> {
    claims.require_admin()?;
    Ok(Json(state.services.activity.summary().await?))
}
