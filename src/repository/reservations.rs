//! Reservation record store interface

use async_trait::async_trait;

use crate::{
    error::EngineResult,
    models::reservation::{NewReservation, Reservation},
};

/// Durable storage for reservation records
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Get reservation by ID
    async fn get_by_id(&self, id: i64) -> EngineResult<Reservation>;

    /// Persist a new PENDING reservation, assigning its id
    async fn insert(&self, reservation: NewReservation) -> EngineResult<Reservation>;

    /// Persist a mutated reservation record
    async fn update(&self, reservation: &Reservation) -> EngineResult<Reservation>;

    /// Remove a reservation record (rollback path only)
    async fn delete(&self, id: i64) -> EngineResult<()>;

    /// All reservations of a reader, oldest first
    async fn by_reader(&self, reader_id: i64) -> EngineResult<Vec<Reservation>>;

    /// PENDING and READY claims on a book, by queue position
    async fn active_by_book(&self, book_id: i64) -> EngineResult<Vec<Reservation>>;

    /// The reader's PENDING or READY claim on a book, if any
    async fn active_by_book_and_reader(
        &self,
        book_id: i64,
        reader_id: i64,
    ) -> EngineResult<Option<Reservation>>;

    /// PENDING claims on a book, by queue position then creation time
    async fn pending_by_book(&self, book_id: i64) -> EngineResult<Vec<Reservation>>;

    /// The single READY claim on a book, if any
    async fn ready_by_book(&self, book_id: i64) -> EngineResult<Option<Reservation>>;

    /// Count PENDING and READY claims on a book
    async fn count_active_by_book(&self, book_id: i64) -> EngineResult<i64>;
}
