//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    activity, auth, categories, health, items, loans, reports, returns, suppliers, users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pustaka API",
        version = "1.0.0",
        description = "Library inventory and loan management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        auth::update_profile,
        auth::register,
        auth::request_password_reset,
        auth::confirm_password_reset,
        // Users
        users::list_users,
        users::list_roles,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Suppliers
        suppliers::list_suppliers,
        suppliers::get_supplier,
        suppliers::create_supplier,
        suppliers::update_supplier,
        suppliers::delete_supplier,
        // Items
        items::list_items,
        items::get_item,
        items::item_loans,
        items::create_item,
        items::update_item,
        items::delete_item,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::create_loan,
        loans::update_loan,
        loans::delete_loan,
        // Returns
        returns::list_returns,
        returns::get_return,
        returns::create_return,
        returns::returns_summary,
        // Activity
        activity::list_activity,
        activity::list_actions,
        activity::activity_summary,
        // Dashboard and reports
        reports::dashboard,
        reports::summary_report,
        reports::loan_report,
        reports::return_report,
        reports::book_report,
        reports::user_report,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::Role,
            crate::models::enums::LoanStatus,
            crate::models::enums::ItemCondition,
            crate::models::enums::ReturnCondition,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::PasswordResetRequest,
            auth::PasswordResetConfirm,
            auth::MessageResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateProfile,
            crate::models::user::RegisterUser,
            crate::models::user::RoleInfo,
            // Catalog
            crate::models::category::Category,
            crate::models::category::CategoryInput,
            crate::models::supplier::Supplier,
            crate::models::supplier::SupplierInput,
            crate::models::item::Item,
            crate::models::item::ItemShort,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            // Loans and returns
            crate::models::loan::LoanDetails,
            crate::models::loan::CreateLoan,
            crate::models::loan::UpdateLoan,
            crate::models::return_record::ReturnDetails,
            crate::models::return_record::CreateReturn,
            crate::models::return_record::ReturnReceipt,
            crate::models::return_record::ReturnSummary,
            // Activity
            crate::models::activity::ActivityEntry,
            crate::models::activity::ActivitySummary,
            // Reports
            crate::models::report::DailyCount,
            crate::models::report::Dashboard,
            crate::models::report::ReportPeriod,
            crate::models::report::ReportTotals,
            crate::models::report::StatusCount,
            crate::models::report::BookLoanCount,
            crate::models::report::BorrowerLoanCount,
            crate::models::report::MonthlyCount,
            crate::models::report::CategoryCount,
            crate::models::report::ReportSummary,
            crate::models::report::LoanReport,
            crate::models::report::ReturnReport,
            crate::models::report::BookReportRow,
            crate::models::report::UserReportRow,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and own profile"),
        (name = "users", description = "User management"),
        (name = "categories", description = "Book categories"),
        (name = "suppliers", description = "Suppliers"),
        (name = "items", description = "Book inventory"),
        (name = "loans", description = "Loan management"),
        (name = "returns", description = "Returns and fines"),
        (name = "activity", description = "Activity log"),
        (name = "reports", description = "Dashboard and reports")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
