//! Data models for the circulation server

pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookInput, BookStatus};
pub use loan::{LoanOutcome, LoanRejection};
pub use user::{Account, AccountRole, Role, User, UserInput};
