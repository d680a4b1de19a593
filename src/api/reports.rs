//! Dashboard and report endpoints (staff)

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::report::{
        BookReportRow, Dashboard, LoanReport, ReportPeriodQuery, ReportSummary, ReturnReport,
        UserReportRow,
    },
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters and lists", body = Dashboard),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Dashboard>> {
    claims.require_staff()?;
    Ok(Json(state.services.reports.dashboard().await?))
}

/// Totals, rankings and distributions over a period
#[utoipa::path(
    get,
    path = "/reports/summary",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportPeriodQuery),
    responses(
        (status = 200, description = "Report summary", body = ReportSummary),
        (status = 400, description = "date_from after date_to")
    )
)]
pub async fn summary_report(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReportPeriodQuery>,
) -> AppResult<Json<ReportSummary>> {
    claims.require_staff()?;
    Ok(Json(state.services.reports.summary(&query).await?))
}

#[utoipa::path(
    get,
    path = "/reports/loans",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportPeriodQuery),
    responses(
        (status = 200, description = "Loans issued in the period", body = LoanReport),
        (status = 400, description = "date_from after date_to")
    )
)]
pub async fn loan_report(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReportPeriodQuery>,
) -> AppResult<Json<LoanReport>> {
    claims.require_staff()?;
    Ok(Json(state.services.reports.loans(&query).await?))
}

#[utoipa::path(
    get,
    path = "/reports/returns",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportPeriodQuery),
    responses(
        (status = 200, description = "Returns recorded in the period", body = ReturnReport),
        (status = 400, description = "date_from after date_to")
    )
)]
pub async fn return_report(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReportPeriodQuery>,
) -> AppResult<Json<ReturnReport>> {
    claims.require_staff()?;
    Ok(Json(state.services.reports.returns(&query).await?))
}

#[utoipa::path(
    get,
    path = "/reports/books",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active books with loan counts", body = Vec<BookReportRow>)
    )
)]
pub async fn book_report(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookReportRow>>> {
    claims.require_staff()?;
    Ok(Json(state.services.reports.books().await?))
}

#[utoipa::path(
    get,
    path = "/reports/users",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users with loan counts", body = Vec<UserReportRow>)
    )
)]
pub async fn user_report(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserReportRow>>> {
    claims.require_staff()?;
    Ok(Json(state.services.reports.users().await?))
}
