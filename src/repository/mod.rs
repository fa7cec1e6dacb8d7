//! Persistence layer for loan and reservation records
//!
//! The engine is the sole writer of both record types; an embedder provides
//! durable implementations of the traits below, keyed by book, reader or id.
//! The in-memory implementations in [`memory`] back the test suite and small
//! deployments.

pub mod loans;
pub mod memory;
pub mod reservations;

use std::sync::Arc;

pub use loans::LoanRepository;
pub use reservations::ReservationRepository;

/// Main repository struct holding the record stores
#[derive(Clone)]
pub struct Repository {
    pub loans: Arc<dyn LoanRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
}

impl Repository {
    /// Create a repository over the given stores
    pub fn new(
        loans: Arc<dyn LoanRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            loans,
            reservations,
        }
    }

    /// Repository backed by in-memory stores
    pub fn in_memory() -> Self {
        Self {
            loans: Arc::new(memory::InMemoryLoanRepository::new()),
            reservations: Arc::new(memory::InMemoryReservationRepository::new()),
        }
    }
}
