//! Book catalog interface
//!
//! The catalog service owns book records and their derived status; the
//! engine reads books and writes status transitions through this boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{EngineError, EngineResult},
    models::{book::Book, enums::BookStatus},
};

/// External book catalog service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Fetch a book snapshot by id
    async fn get_book(&self, id: i64) -> EngineResult<Book>;

    /// Persist a derived status transition
    async fn set_book_status(&self, id: i64, status: BookStatus) -> EngineResult<()>;
}

/// In-memory catalog for tests and embedded deployments
#[derive(Default)]
pub struct InMemoryCatalog {
    books: RwLock<HashMap<i64, Book>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a book with the given status
    pub async fn add_book(&self, id: i64, title: &str, status: BookStatus) {
        self.books.write().await.insert(
            id,
            Book {
                id,
                title: title.to_string(),
                status,
            },
        );
    }
}

#[async_trait]
impl BookCatalog for InMemoryCatalog {
    async fn get_book(&self, id: i64) -> EngineResult<Book> {
        self.books
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn set_book_status(&self, id: i64, status: BookStatus) -> EngineResult<()> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("Book with id {} not found", id)))?;
        book.status = status;
        Ok(())
    }
}
