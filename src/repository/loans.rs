//! Loans repository: borrow and return transitions on Postgres
//!
//! The holder link is the `books.holder_id` column, so updating that one row
//! moves both sides of the association. The book row is locked with
//! `FOR UPDATE` before its status is checked; a second borrower of the same
//! book waits for the first transaction and then sees BORROWED.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, LoanOutcome, LoanRejection},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lend an available book to a user
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome> {
        let mut tx = self.pool.begin().await?;

        if !Self::user_exists(&mut tx, user_id).await? {
            return Ok(LoanOutcome::Rejected(LoanRejection::UnknownUser));
        }

        let Some(mut book) = Self::lock_book(&mut tx, book_id).await? else {
            return Ok(LoanOutcome::Rejected(LoanRejection::UnknownBook));
        };

        if let Err(rejection) = book.check_borrowable() {
            return Ok(LoanOutcome::Rejected(rejection));
        }

        book.lend_to(user_id, Utc::now());
        let book = Self::store_loan_state(&mut tx, &book).await?;

        tx.commit().await?;
        Ok(LoanOutcome::Completed(book))
    }

    /// Take a book back from its current holder
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome> {
        let mut tx = self.pool.begin().await?;

        if !Self::user_exists(&mut tx, user_id).await? {
            return Ok(LoanOutcome::Rejected(LoanRejection::UnknownUser));
        }

        let Some(mut book) = Self::lock_book(&mut tx, book_id).await? else {
            return Ok(LoanOutcome::Rejected(LoanRejection::UnknownBook));
        };

        if let Err(rejection) = book.check_returnable(user_id) {
            return Ok(LoanOutcome::Rejected(rejection));
        }

        book.give_back();
        let book = Self::store_loan_state(&mut tx, &book).await?;

        tx.commit().await?;
        Ok(LoanOutcome::Completed(book))
    }

    async fn user_exists(tx: &mut sqlx::Transaction<'_, Postgres>, user_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(exists)
    }

    pub(super) async fn lock_book(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: i32,
    ) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(book)
    }

    pub(super) async fn store_loan_state(tx: &mut sqlx::Transaction<'_, Postgres>, book: &Book) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET status = $1, holder_id = $2, borrowed_at = $3
            WHERE id = $4
            RETURNING id, title, author, isbn, publication_year, publisher,
                      status, holder_id, borrowed_at, created_at
            "#,
        )
        .bind(book.status)
        .bind(book.holder_id)
        .bind(book.borrowed_at)
        .bind(book.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(book)
    }
}
