//! Shared domain enums

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Derived availability of a book
///
/// The catalog owns the book record; the engine keeps this status consistent
/// with the aggregate state of the book's loans and reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum BookStatus {
    Available = 0,
    Reserved = 1,
    Borrowed = 2,
    Lost = 3,
}

impl From<i16> for BookStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => BookStatus::Reserved,
            2 => BookStatus::Borrowed,
            3 => BookStatus::Lost,
            _ => BookStatus::Available,
        }
    }
}

impl From<BookStatus> for i16 {
    fn from(s: BookStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookStatus::Available => "AVAILABLE",
            BookStatus::Reserved => "RESERVED",
            BookStatus::Borrowed => "BORROWED",
            BookStatus::Lost => "LOST",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => Ok(BookStatus::Available),
            "RESERVED" => Ok(BookStatus::Reserved),
            "BORROWED" => Ok(BookStatus::Borrowed),
            "LOST" => Ok(BookStatus::Lost),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Status of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum LoanStatus {
    Active = 0,
    Returned = 1,
    Lost = 2,
}

impl LoanStatus {
    /// RETURNED and LOST are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Returned | LoanStatus::Lost)
    }
}

impl From<i16> for LoanStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => LoanStatus::Returned,
            2 => LoanStatus::Lost,
            _ => LoanStatus::Active,
        }
    }
}

impl From<LoanStatus> for i16 {
    fn from(s: LoanStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Lost => "LOST",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// ReservationStatus
// ---------------------------------------------------------------------------

/// Status of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum ReservationStatus {
    /// Queued behind other claims on the book
    Pending = 0,
    /// Book is held for this reader with a pickup countdown
    Ready = 1,
    /// Reader picked the book up
    Completed = 2,
    /// Cancelled by the reader
    Cancelled = 3,
    /// Pickup window passed without completion
    Expired = 4,
}

impl ReservationStatus {
    /// PENDING and READY reservations claim the book
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Ready)
    }

    /// COMPLETED, CANCELLED and EXPIRED are terminal
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl From<i16> for ReservationStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => ReservationStatus::Ready,
            2 => ReservationStatus::Completed,
            3 => ReservationStatus::Cancelled,
            4 => ReservationStatus::Expired,
            _ => ReservationStatus::Pending,
        }
    }
}

impl From<ReservationStatus> for i16 {
    fn from(s: ReservationStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Ready => "READY",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Expired => "EXPIRED",
        };
        write!(f, "{}", label)
    }
}
