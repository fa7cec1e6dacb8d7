//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod clock;
pub mod eligibility;
pub mod loans;
pub mod reservations;

use std::sync::Arc;

use crate::{config::CirculationConfig, repository::Repository};

pub use catalog::BookCatalog;
pub use clock::Clock;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub loans: loans::LoansService,
    pub reservations: reservations::ReservationsService,
    pub circulation: circulation::CirculationService,
}

impl Services {
    /// Create all services with the given repository and collaborators
    pub fn new(
        repository: Repository,
        catalog: Arc<dyn BookCatalog>,
        clock: Arc<dyn Clock>,
        config: CirculationConfig,
    ) -> Self {
        let loans = loans::LoansService::new(
            repository.clone(),
            clock.clone(),
            config.loans.clone(),
        );
        let reservations = reservations::ReservationsService::new(
            repository.clone(),
            clock.clone(),
            config.reservations.clone(),
        );
        let circulation = circulation::CirculationService::new(
            repository,
            catalog,
            clock,
            loans.clone(),
            reservations.clone(),
        );

        Self {
            loans,
            reservations,
            circulation,
        }
    }
}
