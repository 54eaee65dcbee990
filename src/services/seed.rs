//! Demo data loaded into an empty store at startup

use crate::{
    error::AppResult,
    models::{BookInput, BookStatus, Role, UserInput},
    repository::{SeedData, SharedStore},
};

/// Load three members and three books when both tables are empty.
/// Returns whether anything was written.
pub async fn seed_if_empty(store: &SharedStore) -> AppResult<bool> {
    let seeded = store.seed(&demo_catalog()).await?;
    if seeded {
        tracing::info!("Seeded demo catalog (3 users, 3 books)");
    } else {
        tracing::debug!("Store already holds data, skipping seed");
    }
    Ok(seeded)
}

fn demo_catalog() -> SeedData {
    let member = |name: &str, role| UserInput {
        id: None,
        name: name.to_string(),
        role,
    };

    SeedData {
        users: vec![
            member("Administradora", Role::Admin),
            member("Profesorado", Role::Teacher),
            member("Alumna", Role::Student),
        ],
        books: vec![
            BookInput {
                id: None,
                title: "Clean Code".to_string(),
                author: Some("Robert C. Martin".to_string()),
                isbn: Some("978-0132350884".to_string()),
                publication_year: Some(2008),
                publisher: Some("Prentice Hall".to_string()),
                status: Some(BookStatus::Available),
            },
            BookInput {
                id: None,
                title: "Domain-Driven Design".to_string(),
                author: Some("Eric Evans".to_string()),
                isbn: Some("978-0321125217".to_string()),
                publication_year: Some(2003),
                publisher: Some("Addison-Wesley".to_string()),
                status: Some(BookStatus::Available),
            },
            // Reserved books have no holder
            BookInput {
                id: None,
                title: "Spring in Action".to_string(),
                author: Some("Craig Walls".to_string()),
                isbn: Some("978-1617294945".to_string()),
                publication_year: Some(2018),
                publisher: Some("Manning".to_string()),
                status: Some(BookStatus::Reserved),
            },
        ],
        // Alumna holds Domain-Driven Design
        loans: vec![(2, 1)],
    }
}
