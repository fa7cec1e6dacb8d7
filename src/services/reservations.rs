//! Reservation store service
//!
//! Source of truth for reserve, promote, complete, cancel, extend and
//! expire transitions, plus queue-position maintenance. Promotion decisions
//! and book status updates belong to the circulation service.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    config::ReservationPolicy,
    error::{EngineError, EngineResult},
    models::{
        enums::ReservationStatus,
        reservation::{NewReservation, Reservation},
    },
    repository::Repository,
};

use super::{
    clock::Clock,
    eligibility::{self, ExtendReservationDenial},
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    policy: ReservationPolicy,
}

impl ReservationsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, policy: ReservationPolicy) -> Self {
        Self {
            repository,
            clock,
            policy,
        }
    }

    pub(crate) fn ready_window(&self) -> Duration {
        Duration::days(self.policy.ready_window_days)
    }

    /// Create a PENDING reservation at the back of the book's queue
    pub async fn reserve(&self, book_id: i64, reader_id: i64) -> EngineResult<Reservation> {
        if let Some(existing) = self
            .repository
            .reservations
            .active_by_book_and_reader(book_id, reader_id)
            .await?
        {
            return Err(EngineError::Conflict(format!(
                "Reader already has an active reservation for this book ({})",
                existing.status
            )));
        }

        let now = self.clock.now();
        let queue_position =
            self.repository.reservations.count_active_by_book(book_id).await? as i32 + 1;

        let reservation = self
            .repository
            .reservations
            .insert(NewReservation {
                book_id,
                reader_id,
                queue_position,
                expires_at: Some(now + Duration::days(self.policy.pending_expiry_days)),
                created_at: now,
            })
            .await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id,
            reader_id,
            queue_position,
            "reservation created"
        );
        Ok(reservation)
    }

    /// Promote a PENDING reservation to READY and arm its pickup window
    pub async fn promote(&self, reservation_id: i64) -> EngineResult<Reservation> {
        let mut reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        if reservation.status != ReservationStatus::Pending {
            return Err(EngineError::InvalidState(format!(
                "Only PENDING reservations can be promoted, this one is {}",
                reservation.status
            )));
        }

        let now = self.clock.now();
        reservation.status = ReservationStatus::Ready;
        reservation.expires_at = Some(now + self.ready_window());
        reservation.updated_at = now;
        let reservation = self.repository.reservations.update(&reservation).await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id = reservation.book_id,
            reader_id = reservation.reader_id,
            "reservation ready for pickup"
        );
        Ok(reservation)
    }

    /// Complete a READY reservation
    ///
    /// The circulation service always pairs this with a borrow so a
    /// COMPLETED reservation never exists without its loan.
    pub async fn complete(&self, reservation_id: i64) -> EngineResult<Reservation> {
        let mut reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        if reservation.status != ReservationStatus::Ready {
            return Err(EngineError::InvalidState(
                "Reservation is not ready for completion".to_string(),
            ));
        }

        let now = self.clock.now();
        reservation.status = ReservationStatus::Completed;
        reservation.updated_at = now;
        let reservation = self.repository.reservations.update(&reservation).await?;

        tracing::info!(reservation_id = reservation.id, "reservation completed");
        Ok(reservation)
    }

    /// Cancel an active reservation
    ///
    /// A second cancel is a reported error, not a silent no-op.
    pub async fn cancel(&self, reservation_id: i64) -> EngineResult<Reservation> {
        let mut reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        if reservation.status == ReservationStatus::Cancelled {
            return Err(EngineError::InvalidState(
                "Reservation is already cancelled".to_string(),
            ));
        }
        if reservation.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "Cannot cancel a {} reservation",
                reservation.status
            )));
        }

        let now = self.clock.now();
        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = now;
        let reservation = self.repository.reservations.update(&reservation).await?;

        tracing::info!(reservation_id = reservation.id, "reservation cancelled");
        Ok(reservation)
    }

    /// Push a READY reservation's pickup window forward
    pub async fn extend(&self, reservation_id: i64) -> EngineResult<Reservation> {
        let mut reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        let now = self.clock.now();
        if let Some(denial) = eligibility::extend_reservation_denial(&reservation, now, &self.policy)
        {
            return Err(match denial {
                ExtendReservationDenial::NotReady => EngineError::NotAllowed(format!(
                    "Only READY reservations can be extended, this one is {}",
                    reservation.status
                )),
                ExtendReservationDenial::NoExpiry => EngineError::NotAllowed(
                    "Cannot extend a reservation without an expiration date".to_string(),
                ),
                ExtendReservationDenial::OutsideWindow => EngineError::NotAllowed(format!(
                    "Reservation can only be extended within {} days of expiry",
                    self.policy.extension_window_days
                )),
            });
        }

        // denial check guarantees the expiry is present
        let expires_at = reservation.expires_at.ok_or_else(|| {
            EngineError::InvalidState("Reservation lost its expiration date".to_string())
        })?;
        reservation.expires_at = Some(expires_at + Duration::days(self.policy.extension_days));
        reservation.updated_at = now;
        let reservation = self.repository.reservations.update(&reservation).await?;

        tracing::info!(
            reservation_id = reservation.id,
            expires_at = ?reservation.expires_at,
            "reservation extended"
        );
        Ok(reservation)
    }

    /// Transition a reservation to EXPIRED
    ///
    /// Only the circulation sweep calls this; it does not re-check the
    /// current status.
    pub async fn expire(&self, reservation_id: i64) -> EngineResult<Reservation> {
        let mut reservation = self.repository.reservations.get_by_id(reservation_id).await?;

        let now = self.clock.now();
        reservation.status = ReservationStatus::Expired;
        reservation.updated_at = now;
        let reservation = self.repository.reservations.update(&reservation).await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id = reservation.book_id,
            "reservation expired"
        );
        Ok(reservation)
    }

    /// Renumber the book's PENDING queue from 1, preserving order
    pub async fn renumber_queue(&self, book_id: i64) -> EngineResult<()> {
        let pending = self.repository.reservations.pending_by_book(book_id).await?;
        let now = self.clock.now();

        for (index, reservation) in pending.into_iter().enumerate() {
            let position = index as i32 + 1;
            if reservation.queue_position != position {
                let mut updated = reservation;
                updated.queue_position = position;
                updated.updated_at = now;
                self.repository.reservations.update(&updated).await?;
            }
        }
        Ok(())
    }

    /// Next PENDING claim on a book, if any
    pub async fn first_pending(&self, book_id: i64) -> EngineResult<Option<Reservation>> {
        Ok(self
            .repository
            .reservations
            .pending_by_book(book_id)
            .await?
            .into_iter()
            .next())
    }

    /// All reservations of a reader, oldest first
    pub async fn get_reader_reservations(&self, reader_id: i64) -> EngineResult<Vec<Reservation>> {
        self.repository.reservations.by_reader(reader_id).await
    }

    /// PENDING and READY reservations of a reader
    pub async fn get_active_reader_reservations(
        &self,
        reader_id: i64,
    ) -> EngineResult<Vec<Reservation>> {
        Ok(self
            .repository
            .reservations
            .by_reader(reader_id)
            .await?
            .into_iter()
            .filter(Reservation::is_active)
            .collect())
    }

    /// Active claims on a book, by queue position
    pub async fn get_active_book_reservations(
        &self,
        book_id: i64,
    ) -> EngineResult<Vec<Reservation>> {
        self.repository.reservations.active_by_book(book_id).await
    }

    /// Whether another reader holds an active claim on the book
    pub async fn is_reserved_by_other(&self, book_id: i64, reader_id: i64) -> EngineResult<bool> {
        Ok(self
            .repository
            .reservations
            .active_by_book(book_id)
            .await?
            .iter()
            .any(|r| r.reader_id != reader_id))
    }
}
