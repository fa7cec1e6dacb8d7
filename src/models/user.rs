//! Principal model and related types

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Account type slug (string identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountTypeSlug {
    Guest,
    Reader,
    Librarian,
    Admin,
}

impl AccountTypeSlug {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountTypeSlug::Guest => "guest",
            AccountTypeSlug::Reader => "reader",
            AccountTypeSlug::Librarian => "librarian",
            AccountTypeSlug::Admin => "admin",
        }
    }
}

impl std::fmt::Display for AccountTypeSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountTypeSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guest" => Ok(AccountTypeSlug::Guest),
            "reader" => Ok(AccountTypeSlug::Reader),
            "librarian" => Ok(AccountTypeSlug::Librarian),
            "admin" => Ok(AccountTypeSlug::Admin),
            _ => Err(format!("Invalid account type slug: {}", s)),
        }
    }
}

/// Authenticated caller as supplied by the identity service
///
/// The engine only serves readers; token issuance and verification happen
/// upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub reader_id: i64,
    pub account_type: AccountTypeSlug,
}

impl Principal {
    pub fn reader(reader_id: i64) -> Self {
        Self {
            reader_id,
            account_type: AccountTypeSlug::Reader,
        }
    }

    /// Mutating circulation calls are reader-only
    pub fn require_reader(&self) -> Result<(), EngineError> {
        if self.account_type == AccountTypeSlug::Reader {
            Ok(())
        } else {
            Err(EngineError::Forbidden(
                "Circulation operations require a reader account".to_string(),
            ))
        }
    }
}
