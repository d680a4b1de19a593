//! Supplier endpoints (administrators only)

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
        supplier::{Supplier, SupplierInput},
    },
    AppState,
};

use super::{pagination, AuthenticatedUser};

#[utoipa::path(
    get,
    path = "/suppliers",
    tag = "suppliers",
    security(("bearer_auth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "List of suppliers", body = PaginatedResponse<Supplier>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PaginatedResponse<Supplier>>> {
    claims.require_admin()?;

    let pagination = pagination(&state, query.page, query.per_page);
    let (suppliers, total) = state
        .services
        .suppliers
        .list(query.search.as_deref(), pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(suppliers, total, pagination)))
}

#[utoipa::path(
    get,
    path = "/suppliers/{id}",
    tag = "suppliers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier details", body = Supplier),
        (status = 404, description = "Supplier not found")
    )
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Supplier>> {
    claims.require_admin()?;
    Ok(Json(state.services.suppliers.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/suppliers",
    tag = "suppliers",
    security(("bearer_auth" = [])),
    request_body = SupplierInput,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    client: ClientInfo,
    Json(data): Json<SupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    claims.require_admin()?;

    let supplier = state.services.suppliers.create(data, &claims, &client).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    put,
    path = "/suppliers/{id}",
    tag = "suppliers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supplier ID")),
    request_body = SupplierInput,
    responses(
        (status = 200, description = "Supplier updated", body = Supplier),
        (status = 404, description = "Supplier not found")
    )
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    client: ClientInfo,
    Path(id): Path<i32>,
    Json(data): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    claims.require_admin()?;

    let supplier = state.services.suppliers.update(id, data, &claims, &client).await?;
    Ok(Json(supplier))
}

#[utoipa::path(
    delete,
    path = "/suppliers/{id}",
    tag = "suppliers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found"),
        (status = 409, description = "Supplier still referenced by books")
    )
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    client: ClientInfo,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.suppliers.delete(id, &claims, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}
