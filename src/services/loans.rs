//! Loan management service
//!
//! Borrow and return are total over (user, book): a missing record or a
//! book in the wrong state yields `Ok(None)` and changes nothing. Only
//! storage failures come back as errors.

use crate::{
    error::AppResult,
    models::{Book, LoanOutcome},
    repository::SharedStore,
};

#[derive(Clone)]
pub struct LoansService {
    store: SharedStore,
}

impl LoansService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Lend an AVAILABLE book to a user
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<Option<Book>> {
        let outcome = self.store.borrow(user_id, book_id).await?;
        match &outcome {
            LoanOutcome::Completed(_) => {
                tracing::info!("User {} borrowed book {}", user_id, book_id)
            }
            LoanOutcome::Rejected(reason) => {
                tracing::debug!("Borrow of book {} by user {} refused: {}", book_id, user_id, reason)
            }
        }
        Ok(outcome.into_book())
    }

    /// Give a book back; only its current holder may do so
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<Option<Book>> {
        let outcome = self.store.return_book(user_id, book_id).await?;
        match &outcome {
            LoanOutcome::Completed(_) => {
                tracing::info!("User {} returned book {}", user_id, book_id)
            }
            LoanOutcome::Rejected(reason) => {
                tracing::debug!("Return of book {} by user {} refused: {}", book_id, user_id, reason)
            }
        }
        Ok(outcome.into_book())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::AppError,
        models::{BookInput, BookStatus, Role, UserInput},
        repository::{LibraryStore, MemoryStore, MockLibraryStore},
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        loans: LoansService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let loans = LoansService::new(store.clone());
            Self { store, loans }
        }

        async fn user(&self, name: &str) -> i32 {
            let input = UserInput {
                id: None,
                name: name.to_string(),
                role: Role::Student,
            };
            self.store.create_user(&input).await.unwrap().id
        }

        async fn book(&self, title: &str, status: BookStatus) -> i32 {
            let input = BookInput {
                title: title.to_string(),
                status: Some(status),
                ..Default::default()
            };
            self.store.create_book(&input).await.unwrap().id
        }

        async fn book_state(&self, id: i32) -> Book {
            self.store.find_book(id).await.unwrap().unwrap()
        }

        async fn held_by(&self, user_id: i32) -> Vec<i32> {
            self.store.find_user(user_id).await.unwrap().unwrap().borrowed_books
        }
    }

    #[tokio::test]
    async fn test_borrow_available_book() {
        let fx = Fixture::new();
        let user = fx.user("Alumna").await;
        let book = fx.book("Clean Code", BookStatus::Available).await;

        let lent = fx.loans.borrow(user, book).await.unwrap().unwrap();
        assert_eq!(lent.status, BookStatus::Borrowed);
        assert_eq!(lent.holder_id, Some(user));
        assert_eq!(fx.held_by(user).await, vec![book]);
    }

    #[tokio::test]
    async fn test_borrow_unavailable_changes_nothing() {
        let fx = Fixture::new();
        let user = fx.user("Alumna").await;
        let reserved = fx.book("Spring in Action", BookStatus::Reserved).await;

        let before = fx.book_state(reserved).await;
        assert_eq!(fx.loans.borrow(user, reserved).await.unwrap(), None);
        assert_eq!(fx.book_state(reserved).await, before);
        assert!(fx.held_by(user).await.is_empty());
    }

    #[tokio::test]
    async fn test_borrow_unknown_ids() {
        let fx = Fixture::new();
        let user = fx.user("Alumna").await;
        let book = fx.book("Clean Code", BookStatus::Available).await;

        assert_eq!(fx.loans.borrow(user + 100, book).await.unwrap(), None);
        assert_eq!(fx.loans.borrow(user, book + 100).await.unwrap(), None);
        assert_eq!(fx.book_state(book).await.status, BookStatus::Available);
        assert_eq!(fx.loans.return_book(user + 100, book).await.unwrap(), None);
        assert_eq!(fx.loans.return_book(user, book + 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_return_requires_holder() {
        let fx = Fixture::new();
        let user = fx.user("Alumna").await;
        let book = fx.book("Clean Code", BookStatus::Available).await;

        // never lent
        assert_eq!(fx.loans.return_book(user, book).await.unwrap(), None);
        assert_eq!(fx.book_state(book).await.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn test_borrow_then_return_restores_book() {
        let fx = Fixture::new();
        let user = fx.user("Alumna").await;
        let book = fx.book("Clean Code", BookStatus::Available).await;
        let before = fx.book_state(book).await;

        fx.loans.borrow(user, book).await.unwrap().unwrap();
        let returned = fx.loans.return_book(user, book).await.unwrap().unwrap();

        assert_eq!(returned, before);
        assert!(fx.held_by(user).await.is_empty());
    }

    #[tokio::test]
    async fn test_two_reader_scenario() {
        let fx = Fixture::new();
        let u1 = fx.user("U1").await;
        let u2 = fx.user("U2").await;
        let b1 = fx.book("B1", BookStatus::Available).await;

        let lent = fx.loans.borrow(u1, b1).await.unwrap().unwrap();
        assert_eq!(lent.status, BookStatus::Borrowed);
        assert_eq!(lent.holder_id, Some(u1));

        assert_eq!(fx.loans.borrow(u2, b1).await.unwrap(), None);
        assert_eq!(fx.book_state(b1).await, lent);

        assert_eq!(fx.loans.return_book(u2, b1).await.unwrap(), None);
        assert_eq!(fx.book_state(b1).await, lent);

        let back = fx.loans.return_book(u1, b1).await.unwrap().unwrap();
        assert_eq!(back.status, BookStatus::Available);
        assert_eq!(back.holder_id, None);
        assert!(fx.held_by(u1).await.is_empty());
        assert!(fx.held_by(u2).await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_swallowed() {
        let mut store = MockLibraryStore::new();
        store
            .expect_borrow()
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolClosed)));

        let loans = LoansService::new(Arc::new(store));
        let result = loans.borrow(1, 1).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
