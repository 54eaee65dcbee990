//! Books repository for database operations

use sqlx::{PgExecutor, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BookInput, BookStatus},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new book; the database assigns the id
    pub async fn create(&self, input: &BookInput) -> AppResult<Book> {
        Self::insert(&self.pool, input).await
    }

    pub(super) async fn insert<'e>(executor: impl PgExecutor<'e>, input: &BookInput) -> AppResult<Book> {
        Book::check_creatable(input)?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, publication_year, publisher, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, author, isbn, publication_year, publisher,
                      status, holder_id, borrowed_at, created_at
            "#,
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.isbn)
        .bind(input.publication_year)
        .bind(&input.publisher)
        .bind(input.status.unwrap_or_default())
        .fetch_one(executor)
        .await?;

        Ok(book)
    }

    /// Full catalog, by id
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    pub async fn list_by_status(&self, status: BookStatus) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            WHERE status = $1
            ORDER BY id
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Books currently lent to a user
    pub async fn list_by_holder(&self, user_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            WHERE holder_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Update a book under a row lock so the status guard and the write
    /// see the same row.
    pub async fn update(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut book) = existing else {
            return Ok(None);
        };

        book.check_catalog_update(input)?;
        book.apply_update(input);

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, isbn = $3, publication_year = $4,
                publisher = $5, status = $6
            WHERE id = $7
            RETURNING id, title, author, isbn, publication_year, publisher,
                      status, holder_id, borrowed_at, created_at
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(&book.publisher)
        .bind(book.status)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Delete a book. The loan association lives on the book row, so removing
    /// the row also ends any loan.
    pub async fn delete(&self, id: i32, force: bool) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, isbn, publication_year, publisher,
                   status, holder_id, borrowed_at, created_at
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book) = existing else {
            return Ok(false);
        };

        book.check_deletable(force)?;
        if let Some(holder_id) = book.holder_id {
            tracing::warn!("Force-deleting book {} lent to user {}", id, holder_id);
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
