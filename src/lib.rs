//! Elidune Circulation Engine
//!
//! The loan & reservation lifecycle core of the Elidune library management
//! system: the rules governing how a reader borrows, extends, returns or
//! loses a book, and how a reservation moves between pending, ready,
//! completed, cancelled and expired. The engine is transport-agnostic; a
//! presentation layer maps its operations to endpoints, and persistence and
//! the book catalog are injected behind traits.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::CirculationConfig;
pub use error::{EngineError, EngineResult};

use repository::Repository;
use services::{BookCatalog, Clock, Services};

/// Engine handle shared with the embedding layer
#[derive(Clone)]
pub struct Engine {
    pub config: Arc<CirculationConfig>,
    pub services: Arc<Services>,
}

impl Engine {
    /// Build an engine over the given stores and collaborators
    pub fn new(
        repository: Repository,
        catalog: Arc<dyn BookCatalog>,
        clock: Arc<dyn Clock>,
        config: CirculationConfig,
    ) -> Self {
        let services = Services::new(repository, catalog, clock.clone(), config.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    /// Engine with in-memory stores and the system clock
    pub fn in_memory(catalog: Arc<dyn BookCatalog>, config: CirculationConfig) -> Self {
        Self::new(
            Repository::in_memory(),
            catalog,
            Arc::new(services::clock::SystemClock),
            config,
        )
    }

    /// The circulation lifecycle service
    pub fn circulation(&self) -> &services::circulation::CirculationService {
        &self.services.circulation
    }
}
