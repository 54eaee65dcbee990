//! Loan transition results

use super::book::{Book, BookStatus};

/// Why a borrow or return was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanRejection {
    UnknownUser,
    UnknownBook,
    NotAvailable(BookStatus),
    NotHolder,
}

impl std::fmt::Display for LoanRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanRejection::UnknownUser => write!(f, "user does not exist"),
            LoanRejection::UnknownBook => write!(f, "book does not exist"),
            LoanRejection::NotAvailable(status) => write!(f, "book is {}", status),
            LoanRejection::NotHolder => write!(f, "book is not held by this user"),
        }
    }
}

/// Result of a guarded loan transition. A rejected transition leaves every
/// record untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanOutcome {
    Completed(Book),
    Rejected(LoanRejection),
}

impl LoanOutcome {
    pub fn into_book(self) -> Option<Book> {
        match self {
            LoanOutcome::Completed(book) => Some(book),
            LoanOutcome::Rejected(_) => None,
        }
    }
}

impl From<Result<Book, LoanRejection>> for LoanOutcome {
    fn from(result: Result<Book, LoanRejection>) -> Self {
        match result {
            Ok(book) => LoanOutcome::Completed(book),
            Err(rejection) => LoanOutcome::Rejected(rejection),
        }
    }
}
