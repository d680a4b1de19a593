//! Return endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        activity::ClientInfo,
        category::SearchQuery,
        pagination::PaginatedResponse,
        return_record::{CreateReturn, ReturnDetails, ReturnReceipt, ReturnSummary},
    },
    AppState,
};

use super::{pagination, AuthenticatedUser};

/// List returns, most recent first; members only see their own
#[utoipa::path(
    get,
    path = "/returns",
    tag = "returns",
    security(("bearer_auth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "List of returns", body = PaginatedResponse<ReturnDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_returns(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PaginatedResponse<ReturnDetails>>> {
    let pagination = pagination(&state, query.page, query.per_page);
    let (returns, total) = state
        .services
        .returns
        .search_returns(query.search.as_deref(), &claims, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(returns, total, pagination)))
}

#[utoipa::path(
    get,
    path = "/returns/{id}",
    tag = "returns",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Return ID")),
    responses(
        (status = 200, description = "Return details", body = ReturnDetails),
        (status = 404, description = "Return not found")
    )
)]
pub async fn get_return(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnDetails>> {
    Ok(Json(state.services.returns.get_return(id, &claims).await?))
}

/// Record the return of a borrowed item
#[utoipa::path(
    post,
    path = "/returns",
    tag = "returns",
    security(("bearer_auth" = [])),
    request_body = CreateReturn,
    responses(
        (status = 201, description = "Return recorded", body = ReturnReceipt),
        (status = 400, description = "Return date before loan date"),
        (status = 404, description = "Loan not found or already returned")
    )
)]
pub async fn create_return(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    client: ClientInfo,
    Json(request): Json<CreateReturn>,
) -> AppResult<(StatusCode, Json<ReturnReceipt>)> {
    claims.require_staff()?;

    let receipt = state.services.returns.create_return(request, &claims, &client).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Return counters and collected fines
#[utoipa::path(
    get,
    path = "/returns/summary",
    tag = "returns",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Return summary", body = ReturnSummary),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn returns_summary(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReturnSummary>> {
    claims.require_staff()?;
    Ok(Json(state.services.returns.summary().await?))
}
