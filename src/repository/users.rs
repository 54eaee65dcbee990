//! Users repository for database operations

use sqlx::{PgExecutor, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{User, UserInput},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register a user; the database assigns the id
    pub async fn create(&self, input: &UserInput) -> AppResult<User> {
        Self::insert(&self.pool, input).await
    }

    pub(super) async fn insert<'e>(executor: impl PgExecutor<'e>, input: &UserInput) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, role)
            VALUES ($1, $2)
            RETURNING id, name, role, created_at, ARRAY[]::INTEGER[] AS borrowed_books
            "#,
        )
        .bind(&input.name)
        .bind(input.role)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// All users with the ids of the books they hold
    pub async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.role, u.created_at,
                   COALESCE(
                       array_agg(b.id ORDER BY b.id) FILTER (WHERE b.id IS NOT NULL),
                       ARRAY[]::INTEGER[]
                   ) AS borrowed_books
            FROM users u
            LEFT JOIN books b ON b.holder_id = u.id
            GROUP BY u.id
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.role, u.created_at,
                   COALESCE(
                       array_agg(b.id ORDER BY b.id) FILTER (WHERE b.id IS NOT NULL),
                       ARRAY[]::INTEGER[]
                   ) AS borrowed_books
            FROM users u
            LEFT JOIN books b ON b.holder_id = u.id
            WHERE u.id = $1
            GROUP BY u.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
