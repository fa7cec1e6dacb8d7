//! Data models for the circulation engine

pub mod book;
pub mod enums;
pub mod loan;
pub mod reservation;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use enums::{BookStatus, LoanStatus, ReservationStatus};
pub use loan::{Loan, LoanDetails};
pub use reservation::Reservation;
pub use user::{AccountTypeSlug, Principal};
