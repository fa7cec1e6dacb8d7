//! Book snapshot as served by the catalog

use serde::{Deserialize, Serialize};

use super::enums::BookStatus;

/// Catalog view of a book
///
/// The catalog service owns the full record; the engine only reads the id,
/// title and derived status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub status: BookStatus,
}
