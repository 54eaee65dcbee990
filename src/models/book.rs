//! Book model and the per-book loan guards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::loan::LoanRejection;
use crate::error::{AppError, AppResult};

/// Circulation status of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
    /// Set and cleared by librarians only; never borrowable.
    Reserved,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "AVAILABLE",
            BookStatus::Borrowed => "BORROWED",
            BookStatus::Reserved => "RESERVED",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => Ok(BookStatus::Available),
            "BORROWED" => Ok(BookStatus::Borrowed),
            "RESERVED" => Ok(BookStatus::Reserved),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Book record
///
/// `holder_id` and `borrowed_at` are set exactly when `status` is
/// [`BookStatus::Borrowed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub status: BookStatus,
    /// User currently holding the book
    pub holder_id: Option<i32>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Build a fresh catalog record from validated input
    pub fn from_input(id: i32, input: &BookInput, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title.clone(),
            author: input.author.clone(),
            isbn: input.isbn.clone(),
            publication_year: input.publication_year,
            publisher: input.publisher.clone(),
            status: input.status.unwrap_or_default(),
            holder_id: None,
            borrowed_at: None,
            created_at,
        }
    }

    /// A new record never starts out lent; BORROWED needs a holder.
    pub fn check_creatable(input: &BookInput) -> AppResult<()> {
        if input.status == Some(BookStatus::Borrowed) {
            return Err(AppError::Validation(
                "A new book cannot be created as BORROWED".to_string(),
            ));
        }
        Ok(())
    }

    /// Only an available book can be lent.
    pub fn check_borrowable(&self) -> Result<(), LoanRejection> {
        match self.status {
            BookStatus::Available => Ok(()),
            status => Err(LoanRejection::NotAvailable(status)),
        }
    }

    /// Only the current holder can give a book back.
    pub fn check_returnable(&self, user_id: i32) -> Result<(), LoanRejection> {
        match self.holder_id {
            Some(holder) if holder == user_id => Ok(()),
            _ => Err(LoanRejection::NotHolder),
        }
    }

    pub fn lend_to(&mut self, user_id: i32, now: DateTime<Utc>) {
        self.status = BookStatus::Borrowed;
        self.holder_id = Some(user_id);
        self.borrowed_at = Some(now);
    }

    pub fn give_back(&mut self) {
        self.status = BookStatus::Available;
        self.holder_id = None;
        self.borrowed_at = None;
    }

    /// Catalog edits may not create or dissolve a loan: BORROWED is reachable
    /// only through lending, and a lent book keeps its status until returned.
    pub fn check_catalog_update(&self, input: &BookInput) -> AppResult<()> {
        match input.status {
            Some(BookStatus::Borrowed) if self.status != BookStatus::Borrowed => {
                Err(AppError::Validation(
                    "Status BORROWED can only be reached by lending the book".to_string(),
                ))
            }
            Some(status) if self.status == BookStatus::Borrowed && status != BookStatus::Borrowed => {
                Err(AppError::Conflict(format!(
                    "Book {} is on loan; it must be returned before its status changes",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }

    /// A lent book is only removed when the caller forces it.
    pub fn check_deletable(&self, force: bool) -> AppResult<()> {
        if self.status == BookStatus::Borrowed && !force {
            return Err(AppError::Conflict(format!(
                "Book {} is on loan; return it first or delete with force",
                self.id
            )));
        }
        Ok(())
    }

    /// Apply a catalog update. Descriptive fields are replaced as given;
    /// status only when the input carries one.
    pub fn apply_update(&mut self, input: &BookInput) {
        self.title = input.title.clone();
        self.author = input.author.clone();
        self.isbn = input.isbn.clone();
        self.publication_year = input.publication_year;
        self.publisher = input.publisher.clone();
        if let Some(status) = input.status {
            self.status = status;
        }
    }
}

/// Create / update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    /// Ignored: identifiers are assigned by the server
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,
    pub author: Option<String>,
    /// ISBN-10 or ISBN-13, hyphens and spaces allowed
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Publication year out of range"))]
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    /// Defaults to AVAILABLE on creation, left unchanged on update
    pub status: Option<BookStatus>,
}

/// Strip hyphens and spaces from an ISBN
fn normalize_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let normalized: Vec<char> = normalize_isbn(isbn).to_uppercase().chars().collect();

    let valid = match normalized.split_last() {
        Some((last, body)) if normalized.len() == 10 || normalized.len() == 13 => {
            body.iter().all(char::is_ascii_digit)
                && (last.is_ascii_digit() || (*last == 'X' && normalized.len() == 10))
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("isbn");
        error.message = Some("ISBN must have 10 or 13 digits".into());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(status: BookStatus) -> Book {
        let input = BookInput {
            title: "Clean Code".to_string(),
            status: Some(status),
            ..Default::default()
        };
        Book::from_input(1, &input, Utc::now())
    }

    #[test]
    fn test_status_defaults_to_available() {
        let input = BookInput {
            title: "Refactoring".to_string(),
            ..Default::default()
        };
        let book = Book::from_input(7, &input, Utc::now());
        assert_eq!(book.status, BookStatus::Available);
        assert_eq!(book.holder_id, None);
    }

    #[test]
    fn test_only_available_is_borrowable() {
        assert!(book(BookStatus::Available).check_borrowable().is_ok());
        assert_eq!(
            book(BookStatus::Borrowed).check_borrowable(),
            Err(LoanRejection::NotAvailable(BookStatus::Borrowed))
        );
        assert_eq!(
            book(BookStatus::Reserved).check_borrowable(),
            Err(LoanRejection::NotAvailable(BookStatus::Reserved))
        );
    }

    #[test]
    fn test_lend_and_give_back() {
        let mut b = book(BookStatus::Available);
        b.lend_to(3, Utc::now());
        assert_eq!(b.status, BookStatus::Borrowed);
        assert_eq!(b.holder_id, Some(3));
        assert!(b.borrowed_at.is_some());

        assert_eq!(b.check_returnable(4), Err(LoanRejection::NotHolder));
        assert!(b.check_returnable(3).is_ok());

        b.give_back();
        assert_eq!(b.status, BookStatus::Available);
        assert_eq!(b.holder_id, None);
        assert_eq!(b.borrowed_at, None);
        assert_eq!(b.check_returnable(3), Err(LoanRejection::NotHolder));
    }

    #[test]
    fn test_apply_update_keeps_status_when_absent() {
        let mut b = book(BookStatus::Reserved);
        let input = BookInput {
            title: "Clean Code, 2nd ed.".to_string(),
            author: Some("Robert C. Martin".to_string()),
            ..Default::default()
        };
        b.apply_update(&input);
        assert_eq!(b.title, "Clean Code, 2nd ed.");
        assert_eq!(b.author.as_deref(), Some("Robert C. Martin"));
        assert_eq!(b.status, BookStatus::Reserved);
    }

    #[test]
    fn test_catalog_update_guards() {
        let available = book(BookStatus::Available);
        let to_borrowed = BookInput {
            title: "x".to_string(),
            status: Some(BookStatus::Borrowed),
            ..Default::default()
        };
        assert!(matches!(
            available.check_catalog_update(&to_borrowed),
            Err(AppError::Validation(_))
        ));

        let mut lent = book(BookStatus::Available);
        lent.lend_to(2, Utc::now());
        let to_reserved = BookInput {
            title: "x".to_string(),
            status: Some(BookStatus::Reserved),
            ..Default::default()
        };
        assert!(matches!(
            lent.check_catalog_update(&to_reserved),
            Err(AppError::Conflict(_))
        ));
        assert!(lent.check_catalog_update(&to_borrowed).is_ok());
        assert!(available.check_catalog_update(&to_reserved).is_ok());
    }

    #[test]
    fn test_new_book_cannot_start_lent() {
        let lent = BookInput {
            title: "Clean Code".to_string(),
            status: Some(BookStatus::Borrowed),
            ..Default::default()
        };
        assert!(matches!(
            Book::check_creatable(&lent),
            Err(AppError::Validation(_))
        ));

        for status in [None, Some(BookStatus::Available), Some(BookStatus::Reserved)] {
            let input = BookInput {
                title: "Clean Code".to_string(),
                status,
                ..Default::default()
            };
            assert!(Book::check_creatable(&input).is_ok());
        }
    }

    #[test]
    fn test_check_deletable() {
        let mut b = book(BookStatus::Available);
        assert!(b.check_deletable(false).is_ok());
        b.lend_to(1, Utc::now());
        assert!(matches!(b.check_deletable(false), Err(AppError::Conflict(_))));
        assert!(b.check_deletable(true).is_ok());
    }

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("978-0132350884").is_ok());
        assert!(validate_isbn("0-321-12521-5").is_ok());
        assert!(validate_isbn("0 8044 2957 X").is_ok());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("978013235088A").is_err());

        // only hyphens and spaces are separators
        assert!(validate_isbn("978/0132350884").is_err());
        assert!(validate_isbn("978.013.235.0884").is_err());
        assert!(validate_isbn("978_0132350884").is_err());
        assert!(validate_isbn("978\u{00a0}0132350884").is_err());
        assert!(validate_isbn("978013235088\u{00e9}").is_err());
        assert!(validate_isbn("978013235088X").is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&BookStatus::Reserved).unwrap(),
            "\"RESERVED\""
        );
        let parsed: BookStatus = "borrowed".parse().unwrap();
        assert_eq!(parsed, BookStatus::Borrowed);
    }
}
