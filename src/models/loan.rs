//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::LoanStatus;

/// Loan record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub reader_id: i64,
    pub status: LoanStatus,
    pub due_date: DateTime<Utc>,
    pub extension_count: i16,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// An active loan past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Active && self.due_date < now
    }
}

/// Loan with derived fields for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDetails {
    pub id: i64,
    pub book_id: i64,
    pub status: LoanStatus,
    pub due_date: DateTime<Utc>,
    pub extension_count: i16,
    pub created_at: DateTime<Utc>,
    pub is_overdue: bool,
}

impl LoanDetails {
    pub fn from_loan(loan: &Loan, now: DateTime<Utc>) -> Self {
        Self {
            id: loan.id,
            book_id: loan.book_id,
            status: loan.status,
            due_date: loan.due_date,
            extension_count: loan.extension_count,
            created_at: loan.created_at,
            is_overdue: loan.is_overdue(now),
        }
    }
}

/// Fields of a loan not assigned by the store
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub book_id: i64,
    pub reader_id: i64,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
