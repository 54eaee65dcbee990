//! Library member service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, User, UserInput},
    repository::SharedStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: SharedStore,
}

impl UsersService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Register a member with a fresh id
    pub async fn register(&self, input: UserInput) -> AppResult<User> {
        input.validate()?;
        let user = self.store.create_user(&input).await?;
        tracing::info!("Registered user {} ({}, {})", user.id, user.name, user.role);
        Ok(user)
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<User>> {
        self.store.find_user(id).await
    }

    /// Books currently lent to a member
    pub async fn loans_of(&self, user_id: i32) -> AppResult<Vec<Book>> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        self.store.books_held_by(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{models::Role, repository::MemoryStore};

    #[tokio::test]
    async fn test_register_and_list() {
        let users = UsersService::new(Arc::new(MemoryStore::new()));
        assert!(users.list().await.unwrap().is_empty());

        let created = users
            .register(UserInput {
                id: Some(12),
                name: "Profesorado".to_string(),
                role: Role::Teacher,
            })
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert!(created.borrowed_books.is_empty());
        assert_eq!(users.list().await.unwrap(), vec![created.clone()]);
        assert_eq!(users.find(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let users = UsersService::new(Arc::new(MemoryStore::new()));
        let result = users
            .register(UserInput {
                id: None,
                name: String::new(),
                role: Role::Student,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_loans_of_unknown_user() {
        let users = UsersService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(users.loans_of(3).await, Err(AppError::NotFound(_))));
    }
}
