//! Business logic services

pub mod admin;
pub mod books;
pub mod loans;
pub mod seed;
pub mod users;

use crate::{error::AppResult, repository::SharedStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub loans: loans::LoansService,
    pub admin: admin::AdminService,
    store: SharedStore,
}

impl Services {
    /// Create all services around one store
    pub fn new(store: SharedStore) -> Self {
        let books = books::BooksService::new(store.clone());
        let users = users::UsersService::new(store.clone());

        Self {
            admin: admin::AdminService::new(books.clone(), users.clone()),
            loans: loans::LoansService::new(store.clone()),
            books,
            users,
            store,
        }
    }

    /// Check that the store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    /// Load demo data into an empty store
    pub async fn seed(&self) -> AppResult<bool> {
        seed::seed_if_empty(&self.store).await
    }
}
