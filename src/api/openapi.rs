//! OpenAPI documentation

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, books, health, loans};

/// Registers the Basic authentication scheme referenced by the paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Circulation API",
        version = "1.0.0",
        description = "Library book loan REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Administration
        admin::list_users,
        admin::create_user,
        admin::list_books,
        admin::create_book,
        admin::get_book,
        admin::update_book,
        admin::delete_book,
        // Catalog
        books::list_available,
        // Loans
        loans::get_user_loans,
        loans::borrow_book,
        loans::return_book,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::models::BookInput,
            crate::models::BookStatus,
            crate::models::User,
            crate::models::UserInput,
            crate::models::Role,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Catalog and member administration"),
        (name = "books", description = "Catalog browsing"),
        (name = "loans", description = "Borrowing and returning")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
