//! HTTP Basic authentication against the configured accounts

use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};

use crate::{
    config::AccountConfig,
    error::{AppError, AppResult},
    models::{Account, AccountRole},
    AppState,
};

struct StoredAccount {
    password_hash: String,
    role: AccountRole,
}

/// Configured logins with their passwords hashed once at startup
pub struct AccountRegistry {
    accounts: HashMap<String, StoredAccount>,
}

impl AccountRegistry {
    pub fn from_config(accounts: &[AccountConfig]) -> AppResult<Self> {
        let argon2 = Argon2::default();
        let mut registry = HashMap::with_capacity(accounts.len());

        for account in accounts {
            let salt = SaltString::generate(&mut OsRng);
            let hash = argon2
                .hash_password(account.password.as_bytes(), &salt)
                .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

            if registry
                .insert(
                    account.username.clone(),
                    StoredAccount {
                        password_hash: hash.to_string(),
                        role: account.role,
                    },
                )
                .is_some()
            {
                tracing::warn!("Account {} configured twice, keeping the last one", account.username);
            }
        }

        tracing::info!("Loaded {} API accounts", registry.len());
        Ok(Self { accounts: registry })
    }

    /// Check a username/password pair
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<Account> {
        let invalid = || AppError::Authentication("Invalid username or password".to_string());

        let stored = self.accounts.get(username).ok_or_else(invalid)?;
        let parsed_hash = PasswordHash::new(&stored.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| invalid())?;

        Ok(Account {
            username: username.to_string(),
            role: stored.role,
        })
    }
}

/// Extractor for the account behind a Basic authorization header
pub struct AuthenticatedUser(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(credentials)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing or malformed authorization header".to_string()))?;

        let account = state
            .accounts
            .authenticate(credentials.username(), credentials.password())?;

        tracing::debug!("Request authenticated as {}", account.username);
        Ok(AuthenticatedUser(account))
    }
}
