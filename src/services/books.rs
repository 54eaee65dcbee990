//! Book catalog service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{Book, BookInput, BookStatus},
    repository::SharedStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: SharedStore,
}

impl BooksService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Add a book to the catalog. Status defaults to AVAILABLE; a new book
    /// cannot start out lent.
    pub async fn create(&self, input: BookInput) -> AppResult<Book> {
        input.validate()?;
        Book::check_creatable(&input)?;

        let book = self.store.create_book(&input).await?;
        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(book)
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.store.list_books().await
    }

    /// Books that can be borrowed right now
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        self.store.list_books_by_status(BookStatus::Available).await
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<Book>> {
        self.store.find_book(id).await
    }

    /// Replace a book's descriptive fields; `None` if it does not exist
    pub async fn update(&self, id: i32, input: BookInput) -> AppResult<Option<Book>> {
        input.validate()?;
        let updated = self.store.update_book(id, &input).await?;
        if updated.is_some() {
            tracing::info!("Updated book {}", id);
        }
        Ok(updated)
    }

    /// Remove a book; `false` if it does not exist
    pub async fn delete(&self, id: i32, force: bool) -> AppResult<bool> {
        let deleted = self.store.delete_book(id, force).await?;
        if deleted {
            tracing::info!("Deleted book {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::AppError,
        repository::{MemoryStore, MockLibraryStore},
    };

    fn service() -> BooksService {
        BooksService::new(Arc::new(MemoryStore::new()))
    }

    fn input(title: &str) -> BookInput {
        BookInput {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_is_empty_initially() {
        assert!(service().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_borrowed_and_blank_title() {
        let books = service();

        let mut lent = input("DDD");
        lent.status = Some(BookStatus::Borrowed);
        assert!(matches!(books.create(lent).await, Err(AppError::Validation(_))));
        assert!(matches!(books.create(input("")).await, Err(AppError::Validation(_))));
        assert!(books.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_list_available() {
        let books = service();
        let first = books.create(input("Clean Code")).await.unwrap();
        let second = books.create(input("Spring in Action")).await.unwrap();

        let mut reserve = input("Spring in Action");
        reserve.status = Some(BookStatus::Reserved);
        let updated = books.update(second.id, reserve).await.unwrap().unwrap();
        assert_eq!(updated.status, BookStatus::Reserved);

        let available = books.list_available().await.unwrap();
        assert_eq!(available, vec![first]);
        assert!(books.update(404, input("Missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_from_listing() {
        let books = service();
        let book = books.create(input("Clean Code")).await.unwrap();

        assert!(books.delete(book.id, false).await.unwrap());
        assert!(books.list().await.unwrap().is_empty());
        assert!(!books.delete(book.id, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let mut store = MockLibraryStore::new();
        store
            .expect_list_books()
            .returning(|| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let books = BooksService::new(Arc::new(store));
        assert!(matches!(books.list().await, Err(AppError::Database(_))));
    }
}
