//! Catalog and member administration endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput, User, UserInput},
    AppState,
};

use super::{
    extract::{AppJson, AppPath, AppQuery},
    AuthenticatedUser,
};

/// Delete options
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteBookParams {
    /// Delete even if the book is on loan, releasing the loan
    pub force: Option<bool>,
}

/// List all members
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "All members", body = Vec<User>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    account.require_admin()?;

    let users = state.services.admin.list_users().await?;
    Ok(Json(users))
}

/// Register a member
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    security(("basic_auth" = [])),
    request_body = UserInput,
    responses(
        (status = 201, description = "Member registered", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppJson(input): AppJson<UserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    account.require_admin()?;

    let user = state.services.admin.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List the whole catalog
#[utoipa::path(
    get,
    path = "/admin/books",
    tag = "admin",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    account.require_admin()?;

    let books = state.services.admin.list_books().await?;
    Ok(Json(books))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "admin",
    security(("basic_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppJson(input): AppJson<BookInput>,
) -> AppResult<(StatusCode, Json<Book>)> {
    account.require_admin()?;

    let book = state.services.admin.register_book(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Get one book
#[utoipa::path(
    get,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("basic_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Book>> {
    account.require_admin()?;

    let book = state
        .services
        .admin
        .find_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
    Ok(Json(book))
}

/// Update a book's descriptive fields and status
#[utoipa::path(
    put,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("basic_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Status change on a lent book", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppPath(id): AppPath<i32>,
    AppJson(input): AppJson<BookInput>,
) -> AppResult<Json<Book>> {
    account.require_admin()?;

    let book = state
        .services
        .admin
        .update_book(id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
    Ok(Json(book))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("basic_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        DeleteBookParams
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppPath(id): AppPath<i32>,
    AppQuery(params): AppQuery<DeleteBookParams>,
) -> AppResult<StatusCode> {
    account.require_admin()?;

    if !state
        .services
        .admin
        .delete_book(id, params.force.unwrap_or(false))
        .await?
    {
        return Err(AppError::NotFound(format!("Book {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
