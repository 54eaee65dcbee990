//! API handlers for the circulation REST endpoints

pub mod admin;
pub mod auth;
pub mod books;
pub mod extract;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::CorsConfig, AppState};

pub use auth::{AccountRegistry, AuthenticatedUser};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Administration
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/admin/books", get(admin::list_books).post(admin::create_book))
        .route(
            "/admin/books/:id",
            get(admin::get_book)
                .put(admin::update_book)
                .delete(admin::delete_book),
        )
        // Catalog
        .route("/books/available", get(books::list_available))
        // Loans
        .route("/users/:user_id/loans", get(loans::get_user_loans))
        .route("/users/:user_id/loans/:book_id", post(loans::borrow_book))
        .route("/users/:user_id/returns/:book_id", post(loans::return_book))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
