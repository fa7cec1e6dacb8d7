//! Circulation lifecycle engine
//!
//! Composes the loan and reservation stores, the eligibility rules, the
//! clock and the book catalog into the reader-facing operations, and
//! enforces the invariants that span both stores:
//!
//! - at most one ACTIVE loan per book
//! - at most one READY claim per book, any number of PENDING behind it
//! - the book's catalog status always reflects the aggregate loan and
//!   reservation state
//!
//! Every mutating operation runs under a per-book async mutex, so two
//! readers racing for the same book get exactly one winner; the loser
//! receives a precise error. Multi-store writes are pre-validated and
//! rolled back if a later step fails, so a collaborator failure never
//! leaves half a transaction behind.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{EngineError, EngineResult},
    models::{
        book::Book,
        enums::{BookStatus, ReservationStatus},
        loan::{Loan, LoanDetails},
        reservation::Reservation,
        user::Principal,
    },
    repository::Repository,
};

use super::{
    clock::Clock,
    eligibility,
    catalog::BookCatalog,
    loans::LoansService,
    reservations::ReservationsService,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    catalog: Arc<dyn BookCatalog>,
    clock: Arc<dyn Clock>,
    loans: LoansService,
    reservations: ReservationsService,
    book_locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl CirculationService {
    pub fn new(
        repository: Repository,
        catalog: Arc<dyn BookCatalog>,
        clock: Arc<dyn Clock>,
        loans: LoansService,
        reservations: ReservationsService,
    ) -> Self {
        Self {
            repository,
            catalog,
            clock,
            loans,
            reservations,
            book_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Serialize mutations per book
    async fn lock_book(&self, book_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.book_locks.lock().await;
            locks
                .entry(book_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Borrow a book directly
    ///
    /// A book held RESERVED can only be borrowed by the reader whose claim
    /// is READY; borrowing it completes that reservation in the same
    /// transaction. Everyone else gets a conflict.
    pub async fn borrow_book(&self, principal: &Principal, book_id: i64) -> EngineResult<Loan> {
        principal.require_reader()?;
        let _guard = self.lock_book(book_id).await;

        let book = self.catalog.get_book(book_id).await?;
        match book.status {
            BookStatus::Lost => Err(EngineError::Conflict(
                "Book is reported lost and cannot be borrowed".to_string(),
            )),
            BookStatus::Borrowed => Err(EngineError::Conflict(
                "Book is already borrowed".to_string(),
            )),
            BookStatus::Reserved => {
                match self.repository.reservations.ready_by_book(book_id).await? {
                    Some(claim) if claim.reader_id == principal.reader_id => {
                        let (_, loan) = self.complete_and_borrow(&claim).await?;
                        Ok(loan)
                    }
                    _ => Err(EngineError::Conflict(
                        "Book is reserved for another reader".to_string(),
                    )),
                }
            }
            BookStatus::Available => {
                let loan = self.loans.borrow(book_id, principal.reader_id).await?;
                if let Err(err) = self
                    .catalog
                    .set_book_status(book_id, BookStatus::Borrowed)
                    .await
                {
                    self.roll_back_loan(loan.id).await;
                    return Err(err);
                }
                Ok(loan)
            }
        }
    }

    /// Reserve a book
    ///
    /// Only AVAILABLE and RESERVED books can be reserved; reserving an
    /// AVAILABLE book promotes the new claim to READY immediately.
    pub async fn reserve_book(
        &self,
        principal: &Principal,
        book_id: i64,
    ) -> EngineResult<Reservation> {
        principal.require_reader()?;
        let _guard = self.lock_book(book_id).await;

        let book = self.catalog.get_book(book_id).await?;
        match book.status {
            BookStatus::Borrowed => {
                return Err(EngineError::Conflict(
                    "Book is currently borrowed and cannot be reserved".to_string(),
                ));
            }
            BookStatus::Lost => {
                return Err(EngineError::Conflict(
                    "Book is reported lost and cannot be reserved".to_string(),
                ));
            }
            BookStatus::Available | BookStatus::Reserved => {}
        }

        let reservation = self
            .reservations
            .reserve(book_id, principal.reader_id)
            .await?;

        if book.status == BookStatus::Available {
            let promoted = self.reservations.promote(reservation.id).await?;
            if let Err(err) = self
                .catalog
                .set_book_status(book_id, BookStatus::Reserved)
                .await
            {
                self.roll_back_reservation_insert(promoted.id).await;
                return Err(err);
            }
            return Ok(promoted);
        }

        Ok(reservation)
    }

    /// Pick up a READY reservation: completes it and creates the loan as
    /// one logical transaction
    pub async fn complete_reservation(
        &self,
        principal: &Principal,
        reservation_id: i64,
    ) -> EngineResult<(Reservation, Loan)> {
        principal.require_reader()?;

        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        self.require_owner(principal, reservation.reader_id)?;

        let _guard = self.lock_book(reservation.book_id).await;

        // re-read under the lock, the claim may have moved while waiting
        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        if reservation.status != ReservationStatus::Ready {
            return Err(EngineError::InvalidState(
                "Reservation is not ready for completion".to_string(),
            ));
        }

        self.complete_and_borrow(&reservation).await
    }

    /// Cancel a reservation
    ///
    /// Cancelling the READY claim hands the book to the next PENDING
    /// reservation, or releases it when the queue is empty.
    pub async fn cancel_reservation(
        &self,
        principal: &Principal,
        reservation_id: i64,
    ) -> EngineResult<Reservation> {
        principal.require_reader()?;

        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        self.require_owner(principal, reservation.reader_id)?;

        let _guard = self.lock_book(reservation.book_id).await;

        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        let was_ready = reservation.status == ReservationStatus::Ready;

        let cancelled = self.reservations.cancel(reservation_id).await?;

        if was_ready {
            if let Err(err) = self.hand_over_claim(cancelled.book_id).await {
                self.restore_reservation(&reservation).await;
                return Err(err);
            }
        }
        self.reservations.renumber_queue(cancelled.book_id).await?;

        Ok(cancelled)
    }

    /// Extend a loan's due date
    pub async fn extend_loan(&self, principal: &Principal, loan_id: i64) -> EngineResult<Loan> {
        principal.require_reader()?;

        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.require_owner(principal, loan.reader_id)?;

        let _guard = self.lock_book(loan.book_id).await;

        let reserved_by_other = self
            .reservations
            .is_reserved_by_other(loan.book_id, principal.reader_id)
            .await?;
        self.loans.extend(loan_id, reserved_by_other).await
    }

    /// Extend a READY reservation's pickup window
    pub async fn extend_reservation(
        &self,
        principal: &Principal,
        reservation_id: i64,
    ) -> EngineResult<Reservation> {
        principal.require_reader()?;

        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        self.require_owner(principal, reservation.reader_id)?;

        let _guard = self.lock_book(reservation.book_id).await;
        self.reservations.extend(reservation_id).await
    }

    /// Return a borrowed book
    ///
    /// Frees the book to the oldest PENDING reservation (promoted to
    /// READY) or makes it AVAILABLE.
    pub async fn return_book(&self, principal: &Principal, loan_id: i64) -> EngineResult<Loan> {
        principal.require_reader()?;

        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.require_owner(principal, loan.reader_id)?;

        let _guard = self.lock_book(loan.book_id).await;

        let before = self.repository.loans.get_by_id(loan_id).await?;
        let returned = self.loans.return_loan(loan_id).await?;

        if let Err(err) = self.hand_over_claim(returned.book_id).await {
            self.restore_loan(&before).await;
            return Err(err);
        }
        self.reservations.renumber_queue(returned.book_id).await?;

        Ok(returned)
    }

    /// Mark a borrowed book as lost
    ///
    /// The book goes LOST, not AVAILABLE; pending reservations stay queued
    /// until the loss is administratively resolved outside this engine.
    pub async fn mark_book_lost(
        &self,
        principal: &Principal,
        loan_id: i64,
        notes: Option<String>,
    ) -> EngineResult<Loan> {
        principal.require_reader()?;

        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.require_owner(principal, loan.reader_id)?;

        let _guard = self.lock_book(loan.book_id).await;

        let before = self.repository.loans.get_by_id(loan_id).await?;
        let lost = self.loans.mark_lost(loan_id, notes).await?;

        if let Err(err) = self
            .catalog
            .set_book_status(lost.book_id, BookStatus::Lost)
            .await
        {
            self.restore_loan(&before).await;
            return Err(err);
        }

        Ok(lost)
    }

    /// The caller's active loans
    pub async fn reader_loans(&self, principal: &Principal) -> EngineResult<Vec<LoanDetails>> {
        principal.require_reader()?;
        self.loans.get_reader_loans(principal.reader_id).await
    }

    /// All of the caller's reservations, after the expiry sweep
    pub async fn reader_reservations(
        &self,
        principal: &Principal,
    ) -> EngineResult<Vec<Reservation>> {
        principal.require_reader()?;
        self.sweep_reader(principal.reader_id).await?;
        self.reservations
            .get_reader_reservations(principal.reader_id)
            .await
    }

    /// The caller's PENDING and READY reservations, after the expiry sweep
    pub async fn active_reservations(
        &self,
        principal: &Principal,
    ) -> EngineResult<Vec<Reservation>> {
        principal.require_reader()?;
        self.sweep_reader(principal.reader_id).await?;
        self.reservations
            .get_active_reader_reservations(principal.reader_id)
            .await
    }

    /// Lazy expiry sweep over one reader's reservations
    ///
    /// A READY reservation whose pickup window has passed is expired and
    /// its book handed to the next PENDING claim (or released). Staleness
    /// is only corrected here, on read; there is no background timer.
    async fn sweep_reader(&self, reader_id: i64) -> EngineResult<()> {
        let now = self.clock.now();
        let stale: Vec<Reservation> = self
            .reservations
            .get_reader_reservations(reader_id)
            .await?
            .into_iter()
            .filter(|r| eligibility::is_reservation_stale(r, now))
            .collect();

        for reservation in stale {
            let _guard = self.lock_book(reservation.book_id).await;

            // re-read under the lock, another call may have swept it
            let current = self
                .repository
                .reservations
                .get_by_id(reservation.id)
                .await?;
            if !eligibility::is_reservation_stale(&current, self.clock.now()) {
                continue;
            }

            self.reservations.expire(current.id).await?;
            if let Err(err) = self.hand_over_claim(current.book_id).await {
                self.restore_reservation(&current).await;
                return Err(err);
            }
            self.reservations.renumber_queue(current.book_id).await?;
        }
        Ok(())
    }

    /// Count of active loans (for the embedding layer's dashboards)
    pub async fn count_active_loans(&self) -> EngineResult<i64> {
        self.loans.count_active().await
    }

    /// Count of overdue loans
    pub async fn count_overdue_loans(&self) -> EngineResult<i64> {
        self.loans.count_overdue().await
    }

    // -----------------------------------------------------------------
    // internals
    // -----------------------------------------------------------------

    fn require_owner(&self, principal: &Principal, owner_id: i64) -> EngineResult<()> {
        if principal.reader_id == owner_id {
            Ok(())
        } else {
            Err(EngineError::Forbidden(
                "Record belongs to another reader".to_string(),
            ))
        }
    }

    /// Complete a READY claim and create its loan as one transaction
    ///
    /// Caller holds the book lock and has verified the claim is READY and
    /// owned by the borrower.
    async fn complete_and_borrow(
        &self,
        claim: &Reservation,
    ) -> EngineResult<(Reservation, Loan)> {
        // pre-validate before mutating either store
        if let Some(active) = self.repository.loans.active_by_book(claim.book_id).await? {
            return Err(EngineError::Conflict(format!(
                "Book {} already has an active loan ({})",
                claim.book_id, active.id
            )));
        }

        let completed = self.reservations.complete(claim.id).await?;

        let loan = match self.loans.borrow(claim.book_id, claim.reader_id).await {
            Ok(loan) => loan,
            Err(err) => {
                self.restore_reservation(claim).await;
                return Err(err);
            }
        };

        if let Err(err) = self
            .catalog
            .set_book_status(claim.book_id, BookStatus::Borrowed)
            .await
        {
            self.roll_back_loan(loan.id).await;
            self.restore_reservation(claim).await;
            return Err(err);
        }

        Ok((completed, loan))
    }

    /// Hand a freed book to the next PENDING claim, or release it
    ///
    /// Caller holds the book lock. Promotes the oldest PENDING reservation
    /// to READY (book stays RESERVED) or sets the book AVAILABLE.
    async fn hand_over_claim(&self, book_id: i64) -> EngineResult<()> {
        match self.reservations.first_pending(book_id).await? {
            Some(next) => {
                self.reservations.promote(next.id).await?;
                if let Err(err) = self
                    .catalog
                    .set_book_status(book_id, BookStatus::Reserved)
                    .await
                {
                    // demote back to the pre-promotion snapshot
                    self.restore_reservation(&next).await;
                    return Err(err);
                }
                Ok(())
            }
            None => {
                self.catalog
                    .set_book_status(book_id, BookStatus::Available)
                    .await
            }
        }
    }

    async fn restore_reservation(&self, original: &Reservation) {
        if let Err(err) = self.repository.reservations.update(original).await {
            tracing::error!(
                reservation_id = original.id,
                error = %err,
                "failed to roll back reservation"
            );
        }
    }

    async fn restore_loan(&self, original: &Loan) {
        if let Err(err) = self.repository.loans.update(original).await {
            tracing::error!(loan_id = original.id, error = %err, "failed to roll back loan");
        }
    }

    async fn roll_back_loan(&self, loan_id: i64) {
        if let Err(err) = self.repository.loans.delete(loan_id).await {
            tracing::error!(loan_id, error = %err, "failed to roll back loan insert");
        }
    }

    async fn roll_back_reservation_insert(&self, reservation_id: i64) {
        if let Err(err) = self.repository.reservations.delete(reservation_id).await {
            tracing::error!(
                reservation_id,
                error = %err,
                "failed to roll back reservation insert"
            );
        }
    }

    /// Catalog snapshot of a book (read-only passthrough)
    pub async fn get_book(&self, book_id: i64) -> EngineResult<Book> {
        self.catalog.get_book(book_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CirculationConfig,
        services::{catalog::MockBookCatalog, clock::SystemClock, Services},
    };

    fn service_with_catalog(catalog: MockBookCatalog) -> CirculationService {
        Services::new(
            Repository::in_memory(),
            Arc::new(catalog),
            Arc::new(SystemClock),
            CirculationConfig::default(),
        )
        .circulation
    }

    #[tokio::test]
    async fn test_catalog_transport_error_propagates() {
        let mut catalog = MockBookCatalog::new();
        catalog
            .expect_get_book()
            .returning(|_| Err(EngineError::Transport("catalog unreachable".to_string())));

        let circulation = service_with_catalog(catalog);
        let err = circulation
            .borrow_book(&Principal::reader(1), 1)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_non_reader_rejected_before_any_catalog_call() {
        // no expectations set: any catalog call would panic the mock
        let catalog = MockBookCatalog::new();
        let circulation = service_with_catalog(catalog);

        let librarian = Principal {
            reader_id: 1,
            account_type: crate::models::user::AccountTypeSlug::Librarian,
        };
        let err = circulation.borrow_book(&librarian, 1).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }
}
