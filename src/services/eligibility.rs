//! Eligibility rules for loan and reservation extensions
//!
//! Pure functions over entity snapshots and a supplied `now`. The stores
//! call these before mutating anything; the same predicates back the
//! "can I extend?" queries of the presentation layer.

use chrono::{DateTime, Utc};

use crate::{
    config::{LoanPolicy, ReservationPolicy},
    models::{
        enums::ReservationStatus,
        loan::Loan,
        reservation::Reservation,
    },
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `now` until `when`, rounded up
///
/// Negative once `when` has passed.
pub fn days_until(when: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (when - now)
        .num_seconds()
        .saturating_add(SECONDS_PER_DAY - 1)
        .div_euclid(SECONDS_PER_DAY)
}

/// Why a loan extension is denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendLoanDenial {
    /// Another reader holds an active claim on the book
    ReservedByOther,
    /// The extension cap has been reached
    MaxExtensionsReached,
    /// The due date is still outside the extension window
    OutsideWindow,
}

/// First reason the loan cannot be extended, if any
///
/// Overdue loans (negative days remaining) still fall inside the window;
/// that permissiveness is deliberate and pinned by tests.
pub fn extend_loan_denial(
    loan: &Loan,
    reserved_by_other: bool,
    now: DateTime<Utc>,
    policy: &LoanPolicy,
) -> Option<ExtendLoanDenial> {
    if reserved_by_other {
        return Some(ExtendLoanDenial::ReservedByOther);
    }
    if loan.extension_count >= policy.max_extensions {
        return Some(ExtendLoanDenial::MaxExtensionsReached);
    }
    if days_until(loan.due_date, now) > policy.extension_window_days {
        return Some(ExtendLoanDenial::OutsideWindow);
    }
    None
}

pub fn can_extend_loan(
    loan: &Loan,
    reserved_by_other: bool,
    now: DateTime<Utc>,
    policy: &LoanPolicy,
) -> bool {
    extend_loan_denial(loan, reserved_by_other, now, policy).is_none()
}

/// Why a reservation extension is denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendReservationDenial {
    /// Only READY reservations have a pickup window to extend
    NotReady,
    /// No expiry date to push forward
    NoExpiry,
    /// Too early; the pickup window has more than the allowed days left
    OutsideWindow,
}

/// First reason the reservation cannot be extended, if any
///
/// An already expired READY reservation (negative days remaining) still
/// passes the window check, matching the loan rule above.
pub fn extend_reservation_denial(
    reservation: &Reservation,
    now: DateTime<Utc>,
    policy: &ReservationPolicy,
) -> Option<ExtendReservationDenial> {
    if reservation.status != ReservationStatus::Ready {
        return Some(ExtendReservationDenial::NotReady);
    }
    let expires_at = match reservation.expires_at {
        Some(expires_at) => expires_at,
        None => return Some(ExtendReservationDenial::NoExpiry),
    };
    if days_until(expires_at, now) > policy.extension_window_days {
        return Some(ExtendReservationDenial::OutsideWindow);
    }
    None
}

pub fn can_extend_reservation(
    reservation: &Reservation,
    now: DateTime<Utc>,
    policy: &ReservationPolicy,
) -> bool {
    extend_reservation_denial(reservation, now, policy).is_none()
}

/// A READY reservation whose pickup window has passed
pub fn is_reservation_stale(reservation: &Reservation, now: DateTime<Utc>) -> bool {
    reservation.status == ReservationStatus::Ready
        && reservation.expires_at.is_some_and(|expires_at| expires_at < now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::LoanStatus;
    use chrono::Duration;

    fn loan(due_in: Duration, extension_count: i16, now: DateTime<Utc>) -> Loan {
        Loan {
            id: 1,
            book_id: 1,
            reader_id: 1,
            status: LoanStatus::Active,
            due_date: now + due_in,
            extension_count,
            notes: None,
            created_at: now - Duration::days(7),
            returned_at: None,
        }
    }

    fn ready_reservation(expires_in: Option<Duration>, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id: 1,
            book_id: 1,
            reader_id: 1,
            status: ReservationStatus::Ready,
            queue_position: 1,
            expires_at: expires_in.map(|d| now + d),
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        }
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_until(now + Duration::days(10), now), 10);
        assert_eq!(days_until(now + Duration::hours(1), now), 1);
        assert_eq!(days_until(now, now), 0);
        assert_eq!(days_until(now - Duration::hours(1), now), 0);
        assert_eq!(days_until(now - Duration::hours(25), now), -1);
    }

    #[test]
    fn test_can_extend_loan_inside_window() {
        let now = Utc::now();
        let policy = LoanPolicy::default();
        assert!(can_extend_loan(&loan(Duration::days(10), 2, now), false, now, &policy));
    }

    #[test]
    fn test_cannot_extend_loan_at_cap() {
        let now = Utc::now();
        let policy = LoanPolicy::default();
        // cap wins regardless of due date
        assert_eq!(
            extend_loan_denial(&loan(Duration::days(10), 3, now), false, now, &policy),
            Some(ExtendLoanDenial::MaxExtensionsReached)
        );
        assert_eq!(
            extend_loan_denial(&loan(Duration::days(-5), 3, now), false, now, &policy),
            Some(ExtendLoanDenial::MaxExtensionsReached)
        );
    }

    #[test]
    fn test_cannot_extend_loan_outside_window() {
        let now = Utc::now();
        let policy = LoanPolicy::default();
        assert_eq!(
            extend_loan_denial(&loan(Duration::days(15), 0, now), false, now, &policy),
            Some(ExtendLoanDenial::OutsideWindow)
        );
        // boundary: exactly 14 days is allowed
        assert!(can_extend_loan(&loan(Duration::days(14), 0, now), false, now, &policy));
    }

    #[test]
    fn test_reservation_conflict_blocks_extension() {
        let now = Utc::now();
        let policy = LoanPolicy::default();
        assert_eq!(
            extend_loan_denial(&loan(Duration::days(10), 0, now), true, now, &policy),
            Some(ExtendLoanDenial::ReservedByOther)
        );
    }

    #[test]
    fn test_overdue_loan_still_extendable() {
        // negative days remaining satisfy the window check
        let now = Utc::now();
        let policy = LoanPolicy::default();
        assert!(can_extend_loan(&loan(Duration::days(-30), 1, now), false, now, &policy));
    }

    #[test]
    fn test_can_extend_reservation_close_to_expiry() {
        let now = Utc::now();
        let policy = ReservationPolicy::default();
        assert!(can_extend_reservation(&ready_reservation(Some(Duration::days(2)), now), now, &policy));
    }

    #[test]
    fn test_cannot_extend_reservation_too_early() {
        let now = Utc::now();
        let policy = ReservationPolicy::default();
        assert_eq!(
            extend_reservation_denial(&ready_reservation(Some(Duration::days(5)), now), now, &policy),
            Some(ExtendReservationDenial::OutsideWindow)
        );
    }

    #[test]
    fn test_expired_reservation_still_extendable() {
        // negative days remaining satisfy the window check
        let now = Utc::now();
        let policy = ReservationPolicy::default();
        assert!(can_extend_reservation(&ready_reservation(Some(Duration::hours(-12)), now), now, &policy));
    }

    #[test]
    fn test_pending_reservation_not_extendable() {
        let now = Utc::now();
        let policy = ReservationPolicy::default();
        let mut reservation = ready_reservation(Some(Duration::days(2)), now);
        reservation.status = ReservationStatus::Pending;
        assert_eq!(
            extend_reservation_denial(&reservation, now, &policy),
            Some(ExtendReservationDenial::NotReady)
        );
    }

    #[test]
    fn test_missing_expiry_never_extendable() {
        let now = Utc::now();
        let policy = ReservationPolicy::default();
        assert_eq!(
            extend_reservation_denial(&ready_reservation(None, now), now, &policy),
            Some(ExtendReservationDenial::NoExpiry)
        );
    }

    #[test]
    fn test_stale_detection() {
        let now = Utc::now();
        assert!(is_reservation_stale(&ready_reservation(Some(Duration::hours(-1)), now), now));
        assert!(!is_reservation_stale(&ready_reservation(Some(Duration::hours(1)), now), now));
        assert!(!is_reservation_stale(&ready_reservation(None, now), now));

        let mut pending = ready_reservation(Some(Duration::hours(-1)), now);
        pending.status = ReservationStatus::Pending;
        assert!(!is_reservation_stale(&pending, now));
    }
}
