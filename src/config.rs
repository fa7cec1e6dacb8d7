//! Configuration for the circulation engine

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Loan policy constants
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoanPolicy {
    /// Days a freshly borrowed book is held before it is due
    pub period_days: i64,
    /// Days added to the due date by one extension
    pub extension_days: i64,
    /// Hard cap on extensions per loan
    pub max_extensions: i16,
    /// An extension is only allowed this many days before the due date
    pub extension_window_days: i64,
}

/// Reservation policy constants
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReservationPolicy {
    /// Days a READY reservation waits for pickup before expiring
    pub ready_window_days: i64,
    /// Days added to the pickup window by one extension
    pub extension_days: i64,
    /// A READY reservation may only be extended this close to expiry
    pub extension_window_days: i64,
    /// Default lifetime of a PENDING reservation
    pub pending_expiry_days: i64,
}

/// Full engine configuration
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CirculationConfig {
    pub loans: LoanPolicy,
    pub reservations: ReservationPolicy,
}

impl CirculationConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load environment variables from .env file
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix ELIDUNE_)
            .add_source(
                Environment::with_prefix("ELIDUNE")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            period_days: 7,
            extension_days: 30,
            max_extensions: 3,
            extension_window_days: 14,
        }
    }
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            ready_window_days: 3,
            extension_days: 5,
            extension_window_days: 3,
            pending_expiry_days: 30,
        }
    }
}
