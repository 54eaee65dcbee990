//! In-process store
//!
//! All tables sit behind a single `RwLock`. Each mutation takes the write lock
//! once and finishes before releasing it, so readers never see a book marked
//! BORROWED that is missing from its holder's loans (or the reverse).

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{LibraryStore, SeedData};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput, BookStatus, LoanOutcome, LoanRejection, Role, User, UserInput},
};

#[derive(Debug, Clone)]
struct Member {
    name: String,
    role: Role,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    /// Book side of the association lives in `Book::holder_id`
    books: BTreeMap<i32, Book>,
    members: BTreeMap<i32, Member>,
    /// Member side: user id -> ids of the books they hold
    loans: BTreeMap<i32, BTreeSet<i32>>,
    last_book_id: i32,
    last_user_id: i32,
}

impl Tables {
    fn insert_book(&mut self, input: &BookInput, now: DateTime<Utc>) -> AppResult<Book> {
        Book::check_creatable(input)?;

        self.last_book_id += 1;
        let book = Book::from_input(self.last_book_id, input, now);
        self.books.insert(book.id, book.clone());
        Ok(book)
    }

    fn insert_member(&mut self, input: &UserInput, now: DateTime<Utc>) -> User {
        self.last_user_id += 1;
        self.members.insert(
            self.last_user_id,
            Member {
                name: input.name.clone(),
                role: input.role,
                created_at: now,
            },
        );

        User {
            id: self.last_user_id,
            name: input.name.clone(),
            role: input.role,
            borrowed_books: Vec::new(),
            created_at: now,
        }
    }

    fn user(&self, id: i32) -> Option<User> {
        self.members.get(&id).map(|member| User {
            id,
            name: member.name.clone(),
            role: member.role,
            borrowed_books: self
                .loans
                .get(&id)
                .map(|held| held.iter().copied().collect())
                .unwrap_or_default(),
            created_at: member.created_at,
        })
    }

    fn lend(&mut self, user_id: i32, book_id: i32, now: DateTime<Utc>) -> Result<Book, LoanRejection> {
        if !self.members.contains_key(&user_id) {
            return Err(LoanRejection::UnknownUser);
        }
        let book = self.books.get_mut(&book_id).ok_or(LoanRejection::UnknownBook)?;
        book.check_borrowable()?;

        book.lend_to(user_id, now);
        self.loans.entry(user_id).or_default().insert(book_id);
        Ok(book.clone())
    }

    fn take_back(&mut self, user_id: i32, book_id: i32) -> Result<Book, LoanRejection> {
        if !self.members.contains_key(&user_id) {
            return Err(LoanRejection::UnknownUser);
        }
        let book = self.books.get_mut(&book_id).ok_or(LoanRejection::UnknownBook)?;
        book.check_returnable(user_id)?;

        book.give_back();
        if let Some(held) = self.loans.get_mut(&user_id) {
            held.remove(&book_id);
            if held.is_empty() {
                self.loans.remove(&user_id);
            }
        }
        Ok(book.clone())
    }
}

/// Store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        tables.insert_book(input, Utc::now())
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.values().cloned().collect())
    }

    async fn list_books_by_status(&self, status: BookStatus) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|book| book.status == status)
            .cloned()
            .collect())
    }

    async fn find_book(&self, id: i32) -> AppResult<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.get(&id).cloned())
    }

    async fn update_book(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        let Some(book) = tables.books.get_mut(&id) else {
            return Ok(None);
        };

        book.check_catalog_update(input)?;
        book.apply_update(input);
        Ok(Some(book.clone()))
    }

    async fn delete_book(&self, id: i32, force: bool) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(book) = tables.books.get(&id) else {
            return Ok(false);
        };

        book.check_deletable(force)?;
        let holder_id = book.holder_id;

        tables.books.remove(&id);
        if let Some(holder_id) = holder_id {
            tracing::warn!("Force-deleting book {} lent to user {}", id, holder_id);
            if let Some(held) = tables.loans.get_mut(&holder_id) {
                held.remove(&id);
                if held.is_empty() {
                    tables.loans.remove(&holder_id);
                }
            }
        }
        Ok(true)
    }

    async fn create_user(&self, input: &UserInput) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_member(input, Utc::now()))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .keys()
            .filter_map(|id| tables.user(*id))
            .collect())
    }

    async fn find_user(&self, id: i32) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.user(id))
    }

    async fn books_held_by(&self, user_id: i32) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .loans
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|book_id| tables.books.get(book_id).cloned())
            .collect())
    }

    async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome> {
        let mut tables = self.tables.write().await;
        Ok(tables.lend(user_id, book_id, Utc::now()).into())
    }

    async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<LoanOutcome> {
        let mut tables = self.tables.write().await;
        Ok(tables.take_back(user_id, book_id).into())
    }

    async fn seed(&self, data: &SeedData) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.books.is_empty() || !tables.members.is_empty() {
            return Ok(false);
        }

        // Built aside and swapped in whole, so a bad seed leaves nothing behind
        let mut staged = Tables {
            last_book_id: tables.last_book_id,
            last_user_id: tables.last_user_id,
            ..Tables::default()
        };
        let now = Utc::now();

        let user_ids: Vec<i32> = data
            .users
            .iter()
            .map(|input| staged.insert_member(input, now).id)
            .collect();
        let mut book_ids = Vec::with_capacity(data.books.len());
        for input in &data.books {
            book_ids.push(staged.insert_book(input, now)?.id);
        }

        for &loan in &data.loans {
            let (user_id, book_id) = SeedData::loan_ids(&user_ids, &book_ids, loan)?;
            staged.lend(user_id, book_id, now).map_err(|reason| {
                AppError::Internal(format!("Seed loan of book {} refused: {}", book_id, reason))
            })?;
        }

        *tables = staged;
        Ok(true)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn book_input(title: &str) -> BookInput {
        BookInput {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn user_input(name: &str) -> UserInput {
        UserInput {
            id: None,
            name: name.to_string(),
            role: Role::Student,
        }
    }

    /// Book side and member side must always describe the same loans.
    async fn assert_consistent(store: &MemoryStore) {
        let books = store.list_books().await.unwrap();
        let users = store.list_users().await.unwrap();

        for book in &books {
            assert_eq!(book.status == BookStatus::Borrowed, book.holder_id.is_some());
            if let Some(holder) = book.holder_id {
                let user = users.iter().find(|u| u.id == holder).unwrap();
                assert!(user.borrowed_books.contains(&book.id));
            }
        }
        for user in &users {
            for book_id in &user.borrowed_books {
                let book = books.iter().find(|b| b.id == *book_id).unwrap();
                assert_eq!(book.holder_id, Some(user.id));
            }
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_client_id_ignored() {
        let store = MemoryStore::new();
        let mut input = book_input("Clean Code");
        input.id = Some(99);

        let first = store.create_book(&input).await.unwrap();
        let second = store.create_book(&input).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let mut user = user_input("Alumna");
        user.id = Some(99);
        assert_eq!(store.create_user(&user).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_create_refuses_borrowed_without_holder() {
        let store = MemoryStore::new();
        let mut input = book_input("DDD");
        input.status = Some(BookStatus::Borrowed);

        assert!(matches!(
            store.create_book(&input).await,
            Err(AppError::Validation(_))
        ));
        assert!(store.list_books().await.unwrap().is_empty());

        // the refused insert did not consume an id
        assert_eq!(store.create_book(&book_input("DDD")).await.unwrap().id, 1);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_failed_seed_writes_nothing() {
        let store = MemoryStore::new();
        let mut reserved = book_input("Spring in Action");
        reserved.status = Some(BookStatus::Reserved);

        let data = SeedData {
            users: vec![user_input("Alumna")],
            books: vec![book_input("Clean Code"), reserved],
            loans: vec![(0, 1)],
        };
        assert!(matches!(store.seed(&data).await, Err(AppError::Internal(_))));
        assert!(store.list_books().await.unwrap().is_empty());
        assert!(store.list_users().await.unwrap().is_empty());

        let out_of_range = SeedData {
            loans: vec![(0, 5)],
            ..data.clone()
        };
        assert!(matches!(store.seed(&out_of_range).await, Err(AppError::Internal(_))));
        assert!(store.list_books().await.unwrap().is_empty());

        // a sound seed still goes through afterwards, exactly once
        let sound = SeedData {
            loans: vec![(0, 0)],
            ..data
        };
        assert!(store.seed(&sound).await.unwrap());
        assert!(!store.seed(&sound).await.unwrap());
        let user = store.find_user(1).await.unwrap().unwrap();
        assert_eq!(user.borrowed_books, vec![1]);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_borrow_updates_both_sides() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_input("Alumna")).await.unwrap();
        let book = store.create_book(&book_input("DDD")).await.unwrap();

        let outcome = store.borrow(user.id, book.id).await.unwrap();
        let lent = outcome.into_book().unwrap();
        assert_eq!(lent.holder_id, Some(user.id));

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.borrowed_books, vec![book.id]);
        assert_eq!(store.books_held_by(user.id).await.unwrap(), vec![lent]);
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_force_delete_releases_loan() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_input("Alumna")).await.unwrap();
        let book = store.create_book(&book_input("DDD")).await.unwrap();
        store.borrow(user.id, book.id).await.unwrap();

        let refused = store.delete_book(book.id, false).await;
        assert!(matches!(refused, Err(AppError::Conflict(_))));
        assert!(store.find_book(book.id).await.unwrap().is_some());

        assert!(store.delete_book(book.id, true).await.unwrap());
        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert!(user.borrowed_books.is_empty());
        assert!(!store.delete_book(book.id, true).await.unwrap());
        assert_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_concurrent_borrows_have_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let book_id = store.create_book(&book_input("Clean Code")).await.unwrap().id;
        let mut user_ids = Vec::new();
        for i in 0..16 {
            let user = store.create_user(&user_input(&format!("reader {}", i))).await.unwrap();
            user_ids.push(user.id);
        }

        let handles: Vec<_> = user_ids
            .into_iter()
            .map(|user_id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.borrow(user_id, book_id).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if let LoanOutcome::Completed(_) = handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_consistent(&store).await;
    }
}
