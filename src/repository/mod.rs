//! Repository layer: the storage port and its adapters
//!
//! Every adapter must apply a loan transition (book side and member side)
//! as one unit, and must serialize concurrent transitions on the same book.

pub mod books;
pub mod loans;
pub mod memory;
pub mod seed;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput, BookStatus, LoanOutcome, User, UserInput},
};

pub use memory::MemoryStore;

/// Starter content written by [`LibraryStore::seed`] as one unit
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub users: Vec<UserInput>,
    pub books: Vec<BookInput>,
    /// `(user, book)` positions in `users` and `books`, lent after insertion
    pub loans: Vec<(usize, usize)>,
}

impl SeedData {
    /// Map a loan's positions to the ids the store assigned
    pub(crate) fn loan_ids(
        user_ids: &[i32],
        book_ids: &[i32],
        (user, book): (usize, usize),
    ) -> AppResult<(i32, i32)> {
        match (user_ids.get(user), book_ids.get(book)) {
            (Some(user_id), Some(book_id)) => Ok((*user_id, *book_id)),
            _ => Err(AppError::Internal(format!(
                "Seed loan ({}, {}) points outside the seed data",
                user, book
            ))),
        }
    }
}

/// Storage port shared by every service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Insert a book with a fresh id. The input id is never used.
    async fn create_book(&self, input: &BookInput) -> AppResult<Book>;

    async fn list_books(&self) -> AppResult<Vec<Book>>;

    async fn list_books_by_status(&self, status: BookStatus) -> AppResult<Vec<Book>>;

    async fn find_book(&self, id: i32) -> AppResult<Option<Book>>;

    /// Replace descriptive fields, and status when given. `None` if absent.
    async fn update_book(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>>;

    /// `false` if no such book. A lent book is removed only with `force`,
    /// which also drops it from its holder's loans.
    async fn delete_book(&self, id: i32, force: bool) -> AppResult<bool>;

    /// Insert a user with a fresh id. The input id is never used.
    async fn create_user(&self, input: &UserInput) -> AppResult<User>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn find_user(&self, id: i32) -> AppResult<Option<User>>;

    async fn books_held_by(&self, user_id: i32) -> AppResult<Vec<Book>>;

    async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome>;

    async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome>;

    /// Write `data` if the store holds no users and no books. Either all of
    /// it lands or none of it does. Returns whether anything was written.
    async fn seed(&self, data: &SeedData) -> AppResult<bool>;

    /// Cheap liveness probe
    async fn ping(&self) -> AppResult<()>;
}

/// Store handle passed to services
pub type SharedStore = Arc<dyn LibraryStore>;

/// Postgres-backed store holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl LibraryStore for Repository {
    async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        self.books.create(input).await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    async fn list_books_by_status(&self, status: BookStatus) -> AppResult<Vec<Book>> {
        self.books.list_by_status(status).await
    }

    async fn find_book(&self, id: i32) -> AppResult<Option<Book>> {
        self.books.get_by_id(id).await
    }

    async fn update_book(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>> {
        self.books.update(id, input).await
    }

    async fn delete_book(&self, id: i32, force: bool) -> AppResult<bool> {
        self.books.delete(id, force).await
    }

    async fn create_user(&self, input: &UserInput) -> AppResult<User> {
        self.users.create(input).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    async fn find_user(&self, id: i32) -> AppResult<Option<User>> {
        self.users.get_by_id(id).await
    }

    async fn books_held_by(&self, user_id: i32) -> AppResult<Vec<Book>> {
        self.books.list_by_holder(user_id).await
    }

    async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome> {
        self.loans.borrow(user_id, book_id).await
    }

    async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome> {
        self.loans.return_book(user_id, book_id).await
    }

    async fn seed(&self, data: &SeedData) -> AppResult<bool> {
        seed::load(&self.pool, data).await
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
