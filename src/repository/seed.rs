//! Starter content for an empty Postgres database
//!
//! Everything runs in one transaction. A failure leaves both tables empty,
//! so the next start tries again.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::{books::BooksRepository, loans::LoansRepository, users::UsersRepository, SeedData};
use crate::error::{AppError, AppResult};

pub async fn load(pool: &Pool<Postgres>, data: &SeedData) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    // Two instances starting together must not both see empty tables
    sqlx::query("LOCK TABLE users, books IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let populated: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users) OR EXISTS(SELECT 1 FROM books)",
    )
    .fetch_one(&mut *tx)
    .await?;
    if populated {
        return Ok(false);
    }

    let mut user_ids = Vec::with_capacity(data.users.len());
    for input in &data.users {
        user_ids.push(UsersRepository::insert(&mut *tx, input).await?.id);
    }

    let mut book_ids = Vec::with_capacity(data.books.len());
    for input in &data.books {
        book_ids.push(BooksRepository::insert(&mut *tx, input).await?.id);
    }

    let now = Utc::now();
    for &loan in &data.loans {
        let (user_id, book_id) = SeedData::loan_ids(&user_ids, &book_ids, loan)?;
        let mut book = LoansRepository::lock_book(&mut tx, book_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Seed book {} vanished", book_id)))?;

        book.check_borrowable().map_err(|reason| {
            AppError::Internal(format!("Seed loan of book {} refused: {}", book_id, reason))
        })?;
        book.lend_to(user_id, now);
        LoansRepository::store_loan_state(&mut tx, &book).await?;
    }

    tx.commit().await?;
    Ok(true)
}
