//! Administrative operations on members and the catalog

use crate::{
    error::AppResult,
    models::{Book, BookInput, User, UserInput},
};

use super::{books::BooksService, users::UsersService};

#[derive(Clone)]
pub struct AdminService {
    books: BooksService,
    users: UsersService,
}

impl AdminService {
    pub fn new(books: BooksService, users: UsersService) -> Self {
        Self { books, users }
    }

    /// Register a member. Any client-supplied id is discarded first.
    pub async fn register_user(&self, mut input: UserInput) -> AppResult<User> {
        if let Some(id) = input.id.take() {
            tracing::debug!("Ignoring client-supplied user id {}", id);
        }
        self.users.register(input).await
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    /// Register a book. Any client-supplied id is discarded first and the
    /// status defaults to AVAILABLE.
    pub async fn register_book(&self, mut input: BookInput) -> AppResult<Book> {
        if let Some(id) = input.id.take() {
            tracing::debug!("Ignoring client-supplied book id {}", id);
        }
        self.books.create(input).await
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    pub async fn find_book(&self, id: i32) -> AppResult<Option<Book>> {
        self.books.find(id).await
    }

    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<Option<Book>> {
        self.books.update(id, input).await
    }

    pub async fn delete_book(&self, id: i32, force: bool) -> AppResult<bool> {
        self.books.delete(id, force).await
    }
}
