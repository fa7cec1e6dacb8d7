//! Loan store service
//!
//! Source of truth for borrow, extend, return and mark-lost transitions.
//! Cross-entity concerns (reservation conflicts, book status, locking) are
//! handled by the circulation service on top.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    config::LoanPolicy,
    error::{EngineError, EngineResult},
    models::{
        enums::LoanStatus,
        loan::{Loan, LoanDetails, NewLoan},
    },
    repository::Repository,
};

use super::{
    clock::Clock,
    eligibility::{self, ExtendLoanDenial},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    policy: LoanPolicy,
}

impl LoansService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, policy: LoanPolicy) -> Self {
        Self {
            repository,
            clock,
            policy,
        }
    }

    /// Create a new ACTIVE loan (borrow a book)
    pub async fn borrow(&self, book_id: i64, reader_id: i64) -> EngineResult<Loan> {
        if let Some(existing) = self.repository.loans.active_by_book(book_id).await? {
            return Err(EngineError::Conflict(format!(
                "Book {} is already borrowed (loan {})",
                book_id, existing.id
            )));
        }

        let now = self.clock.now();
        let loan = self
            .repository
            .loans
            .insert(NewLoan {
                book_id,
                reader_id,
                due_date: now + Duration::days(self.policy.period_days),
                created_at: now,
            })
            .await?;

        tracing::info!(loan_id = loan.id, book_id, reader_id, "loan created");
        Ok(loan)
    }

    /// Extend a loan's due date
    ///
    /// `reserved_by_other` is computed by the caller from the reservation
    /// store; the loan store itself only knows loans.
    pub async fn extend(&self, loan_id: i64, reserved_by_other: bool) -> EngineResult<Loan> {
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        if loan.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "Cannot extend a {} loan",
                loan.status
            )));
        }

        let now = self.clock.now();
        if let Some(denial) =
            eligibility::extend_loan_denial(&loan, reserved_by_other, now, &self.policy)
        {
            return Err(match denial {
                ExtendLoanDenial::ReservedByOther => EngineError::NotAllowed(
                    "Book is reserved by another reader".to_string(),
                ),
                ExtendLoanDenial::MaxExtensionsReached => EngineError::NotAllowed(format!(
                    "Maximum extensions reached ({}/{})",
                    loan.extension_count, self.policy.max_extensions
                )),
                ExtendLoanDenial::OutsideWindow => EngineError::NotAllowed(format!(
                    "Loan can only be extended within {} days of the due date",
                    self.policy.extension_window_days
                )),
            });
        }

        loan.extension_count += 1;
        loan.due_date = loan.due_date + Duration::days(self.policy.extension_days);
        let loan = self.repository.loans.update(&loan).await?;

        tracing::info!(
            loan_id = loan.id,
            extension_count = loan.extension_count,
            due_date = %loan.due_date,
            "loan extended"
        );
        Ok(loan)
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, loan_id: i64) -> EngineResult<Loan> {
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        if loan.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "Cannot return a {} loan",
                loan.status
            )));
        }

        loan.status = LoanStatus::Returned;
        loan.returned_at = Some(self.clock.now());
        let loan = self.repository.loans.update(&loan).await?;

        tracing::info!(loan_id = loan.id, book_id = loan.book_id, "loan returned");
        Ok(loan)
    }

    /// Mark an active loan's book as lost
    pub async fn mark_lost(&self, loan_id: i64, notes: Option<String>) -> EngineResult<Loan> {
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        if loan.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "Only active loans can be marked lost, this one is {}",
                loan.status
            )));
        }

        loan.status = LoanStatus::Lost;
        loan.notes = notes;
        let loan = self.repository.loans.update(&loan).await?;

        tracing::warn!(loan_id = loan.id, book_id = loan.book_id, "loan marked lost");
        Ok(loan)
    }

    /// Active loans of a reader, soonest due first
    pub async fn get_reader_loans(&self, reader_id: i64) -> EngineResult<Vec<LoanDetails>> {
        let now = self.clock.now();
        let mut loans: Vec<Loan> = self
            .repository
            .loans
            .by_reader(reader_id)
            .await?
            .into_iter()
            .filter(|l| !l.status.is_terminal())
            .collect();
        loans.sort_by(|a, b| a.due_date.cmp(&b.due_date));

        Ok(loans
            .iter()
            .map(|l| LoanDetails::from_loan(l, now))
            .collect())
    }

    /// Whether the reader currently holds the book
    pub async fn is_book_borrowed_by_reader(
        &self,
        book_id: i64,
        reader_id: i64,
    ) -> EngineResult<bool> {
        Ok(self
            .repository
            .loans
            .active_by_book_and_reader(book_id, reader_id)
            .await?
            .is_some())
    }

    /// Count active loans
    pub async fn count_active(&self) -> EngineResult<i64> {
        self.repository.loans.count_active().await
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> EngineResult<i64> {
        self.repository.loans.count_overdue(self.clock.now()).await
    }
}
