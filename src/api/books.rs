//! Public catalog browsing

use axum::{extract::State, Json};

use crate::{error::AppResult, models::Book, AppState};

use super::AuthenticatedUser;

/// List books that can be borrowed right now
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Available books", body = Vec<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_available(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    account.require_patron()?;

    let books = state.services.books.list_available().await?;
    Ok(Json(books))
}
