//! Reservation model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ReservationStatus;

/// Reservation record
///
/// `queue_position` orders the PENDING claims on a book, renumbered from 1
/// whenever a reservation leaves the active set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub book_id: i64,
    pub reader_id: i64,
    pub status: ReservationStatus,
    pub queue_position: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// PENDING or READY
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Fields of a reservation not assigned by the store
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub book_id: i64,
    pub reader_id: i64,
    pub queue_position: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
