//! Loan record store interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::EngineResult,
    models::loan::{Loan, NewLoan},
};

/// Durable storage for loan records
///
/// Implementations report unknown ids as `NotFound` and infrastructure
/// failures as `Transport`; business rules live in the services layer.
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Get loan by ID
    async fn get_by_id(&self, id: i64) -> EngineResult<Loan>;

    /// Persist a new ACTIVE loan, assigning its id
    async fn insert(&self, loan: NewLoan) -> EngineResult<Loan>;

    /// Persist a mutated loan record
    async fn update(&self, loan: &Loan) -> EngineResult<Loan>;

    /// Remove a loan record (rollback path only)
    async fn delete(&self, id: i64) -> EngineResult<()>;

    /// The ACTIVE loan on a book, if any
    async fn active_by_book(&self, book_id: i64) -> EngineResult<Option<Loan>>;

    /// The reader's ACTIVE loan on a book, if any
    async fn active_by_book_and_reader(
        &self,
        book_id: i64,
        reader_id: i64,
    ) -> EngineResult<Option<Loan>>;

    /// All loans of a reader, newest first
    async fn by_reader(&self, reader_id: i64) -> EngineResult<Vec<Loan>>;

    /// Count ACTIVE loans
    async fn count_active(&self) -> EngineResult<i64>;

    /// Count ACTIVE loans past their due date
    async fn count_overdue(&self, now: DateTime<Utc>) -> EngineResult<i64>;
}
