//! In-memory record stores
//!
//! Reference implementations of the repository traits, used by the test
//! suite and by embedders that do not need durable storage. Ids are assigned
//! from a monotonic counter, like the serial columns of the SQL-backed
//! deployment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::{EngineError, EngineResult},
    models::{
        enums::{LoanStatus, ReservationStatus},
        loan::{Loan, NewLoan},
        reservation::{NewReservation, Reservation},
    },
};

use super::{LoanRepository, ReservationRepository};

/// In-memory loan store
#[derive(Default)]
pub struct InMemoryLoanRepository {
    records: RwLock<HashMap<i64, Loan>>,
    next_id: AtomicI64,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanRepository for InMemoryLoanRepository {
    async fn get_by_id(&self, id: i64) -> EngineResult<Loan> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn insert(&self, loan: NewLoan) -> EngineResult<Loan> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = Loan {
            id,
            book_id: loan.book_id,
            reader_id: loan.reader_id,
            status: LoanStatus::Active,
            due_date: loan.due_date,
            extension_count: 0,
            notes: None,
            created_at: loan.created_at,
            returned_at: None,
        };
        self.records.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, loan: &Loan) -> EngineResult<Loan> {
        let mut records = self.records.write().await;
        if !records.contains_key(&loan.id) {
            return Err(EngineError::NotFound(format!(
                "Loan with id {} not found",
                loan.id
            )));
        }
        records.insert(loan.id, loan.clone());
        Ok(loan.clone())
    }

    async fn delete(&self, id: i64) -> EngineResult<()> {
        self.records
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn active_by_book(&self, book_id: i64) -> EngineResult<Option<Loan>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|l| l.book_id == book_id && l.status == LoanStatus::Active)
            .cloned())
    }

    async fn active_by_book_and_reader(
        &self,
        book_id: i64,
        reader_id: i64,
    ) -> EngineResult<Option<Loan>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|l| {
                l.book_id == book_id
                    && l.reader_id == reader_id
                    && l.status == LoanStatus::Active
            })
            .cloned())
    }

    async fn by_reader(&self, reader_id: i64) -> EngineResult<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .records
            .read()
            .await
            .values()
            .filter(|l| l.reader_id == reader_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(loans)
    }

    async fn count_active(&self) -> EngineResult<i64> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|l| l.status == LoanStatus::Active)
            .count() as i64)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> EngineResult<i64> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|l| l.status == LoanStatus::Active && l.due_date < now)
            .count() as i64)
    }
}

/// In-memory reservation store
#[derive(Default)]
pub struct InMemoryReservationRepository {
    records: RwLock<HashMap<i64, Reservation>>,
    next_id: AtomicI64,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn get_by_id(&self, id: i64) -> EngineResult<Reservation> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Reservation with id {} not found", id)))
    }

    async fn insert(&self, reservation: NewReservation) -> EngineResult<Reservation> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = Reservation {
            id,
            book_id: reservation.book_id,
            reader_id: reservation.reader_id,
            status: ReservationStatus::Pending,
            queue_position: reservation.queue_position,
            expires_at: reservation.expires_at,
            created_at: reservation.created_at,
            updated_at: reservation.created_at,
        };
        self.records.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, reservation: &Reservation) -> EngineResult<Reservation> {
        let mut records = self.records.write().await;
        if !records.contains_key(&reservation.id) {
            return Err(EngineError::NotFound(format!(
                "Reservation with id {} not found",
                reservation.id
            )));
        }
        records.insert(reservation.id, reservation.clone());
        Ok(reservation.clone())
    }

    async fn delete(&self, id: i64) -> EngineResult<()> {
        self.records
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("Reservation with id {} not found", id)))
    }

    async fn by_reader(&self, reader_id: i64) -> EngineResult<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.reader_id == reader_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(reservations)
    }

    async fn active_by_book(&self, book_id: i64) -> EngineResult<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.book_id == book_id && r.status.is_active())
            .cloned()
            .collect();
        reservations.sort_by(|a, b| {
            a.queue_position
                .cmp(&b.queue_position)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(reservations)
    }

    async fn active_by_book_and_reader(
        &self,
        book_id: i64,
        reader_id: i64,
    ) -> EngineResult<Option<Reservation>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.book_id == book_id && r.reader_id == reader_id && r.status.is_active())
            .cloned())
    }

    async fn pending_by_book(&self, book_id: i64) -> EngineResult<Vec<Reservation>> {
        let mut pending: Vec<Reservation> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.book_id == book_id && r.status == ReservationStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            a.queue_position
                .cmp(&b.queue_position)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(pending)
    }

    async fn ready_by_book(&self, book_id: i64) -> EngineResult<Option<Reservation>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.book_id == book_id && r.status == ReservationStatus::Ready)
            .cloned())
    }

    async fn count_active_by_book(&self, book_id: i64) -> EngineResult<i64> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.book_id == book_id && r.status.is_active())
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_loan(book_id: i64, reader_id: i64) -> NewLoan {
        let now = Utc::now();
        NewLoan {
            book_id,
            reader_id,
            due_date: now + Duration::days(7),
            created_at: now,
        }
    }

    #[test]
    fn test_loan_insert_assigns_sequential_ids() {
        tokio_test::block_on(async {
            let repo = InMemoryLoanRepository::new();
            let a = repo.insert(new_loan(1, 10)).await.unwrap();
            let b = repo.insert(new_loan(2, 10)).await.unwrap();
            assert!(b.id > a.id);
            assert_eq!(a.status, LoanStatus::Active);
            assert_eq!(a.extension_count, 0);
        });
    }

    #[test]
    fn test_loan_get_unknown_id() {
        tokio_test::block_on(async {
            let repo = InMemoryLoanRepository::new();
            let err = repo.get_by_id(99).await.unwrap_err();
            assert!(matches!(err, EngineError::NotFound(_)));
        });
    }

    #[test]
    fn test_active_by_book_ignores_returned() {
        tokio_test::block_on(async {
            let repo = InMemoryLoanRepository::new();
            let mut loan = repo.insert(new_loan(1, 10)).await.unwrap();
            assert!(repo.active_by_book(1).await.unwrap().is_some());

            loan.status = LoanStatus::Returned;
            loan.returned_at = Some(Utc::now());
            repo.update(&loan).await.unwrap();
            assert!(repo.active_by_book(1).await.unwrap().is_none());
        });
    }

    #[test]
    fn test_pending_by_book_ordered_by_queue_position() {
        tokio_test::block_on(async {
            let repo = InMemoryReservationRepository::new();
            let now = Utc::now();
            for (pos, reader) in [(2, 21), (1, 20), (3, 22)] {
                repo.insert(NewReservation {
                    book_id: 5,
                    reader_id: reader,
                    queue_position: pos,
                    expires_at: None,
                    created_at: now,
                })
                .await
                .unwrap();
            }
            let pending = repo.pending_by_book(5).await.unwrap();
            let positions: Vec<i32> = pending.iter().map(|r| r.queue_position).collect();
            assert_eq!(positions, vec![1, 2, 3]);
        });
    }
}
