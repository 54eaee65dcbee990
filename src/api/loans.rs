//! Borrowing and returning endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::Book,
    AppState,
};

use super::{extract::AppPath, AuthenticatedUser};

/// Books currently held by a member
#[utoipa::path(
    get,
    path = "/users/{user_id}/loans",
    tag = "loans",
    security(("basic_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Books on loan to the member", body = Vec<Book>),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppPath(user_id): AppPath<i32>,
) -> AppResult<Json<Vec<Book>>> {
    account.require_patron()?;

    let books = state.services.users.loans_of(user_id).await?;
    Ok(Json(books))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/users/{user_id}/loans/{book_id}",
    tag = "loans",
    security(("basic_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "Member ID"),
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Book lent", body = Book),
        (status = 400, description = "Loan refused", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppPath((user_id, book_id)): AppPath<(i32, i32)>,
) -> AppResult<(StatusCode, Json<Book>)> {
    account.require_patron()?;

    match state.services.loans.borrow(user_id, book_id).await? {
        Some(book) => Ok((StatusCode::CREATED, Json(book))),
        None => Err(AppError::BadRequest(format!(
            "Book {} could not be borrowed by user {}",
            book_id, user_id
        ))),
    }
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/users/{user_id}/returns/{book_id}",
    tag = "loans",
    security(("basic_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "Member ID"),
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = Book),
        (status = 400, description = "Return refused", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    AppPath((user_id, book_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Book>> {
    account.require_patron()?;

    state
        .services
        .loans
        .return_book(user_id, book_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Book {} could not be returned by user {}",
                book_id, user_id
            ))
        })
}
