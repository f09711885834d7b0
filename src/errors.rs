//! Error types for the freefall outcome engine
//!
//! The root error mirrors the three concerns a caller can hit: configuration,
//! the session/round store, and game rules with their stable machine codes.

use std::fmt;

/// Root error type for all freefall operations
#[derive(Debug)]
pub enum FreefallError {
    /// Configuration related errors
    Configuration(ConfigurationError),

    /// Session/round store errors
    Store(StoreError),

    /// Game rule and lifecycle errors
    Game(GameError),
}

/// Configuration and validation errors
#[derive(Debug)]
pub enum ConfigurationError {
    ValidationFailed(String),
    MissingRequired(String),
    InvalidValue { field: String, value: String, reason: String },
    LoadFailed(String),
    SaveFailed(String),
}

/// Failures of the backing session store
#[derive(Debug)]
pub enum StoreError {
    CorruptedRecord(String),
    DuplicateRound(String),
}

/// Game rule violations and lifecycle conflicts surfaced to callers.
///
/// Every variant maps to a stable code via [`GameError::code`]; callers branch
/// on the code, never on the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Session not found")]
    InvalidSession,

    #[error("Session has ended")]
    SessionExpired,

    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    #[error("Insufficient balance: bet {bet}, balance {balance}")]
    InsufficientBalance { bet: u64, balance: u64 },

    #[error("Round not found")]
    RoundNotFound,

    #[error("Round belongs to a different session")]
    SessionMismatch,

    #[error("Round already completed")]
    RoundCompleted,

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Generic failure; the cause is logged, never returned
    #[error("Internal error")]
    Internal,
}

impl GameError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidSession => "INVALID_SESSION",
            GameError::SessionExpired => "SESSION_EXPIRED",
            GameError::InvalidBet(_) => "INVALID_BET",
            GameError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            GameError::RoundNotFound => "ROUND_NOT_FOUND",
            GameError::SessionMismatch => "SESSION_MISMATCH",
            GameError::RoundCompleted => "ROUND_COMPLETED",
            GameError::InvalidSeed(_) => "INVALID_SEED",
            GameError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for FreefallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreefallError::Configuration(e) => write!(f, "Configuration error: {}", e),
            FreefallError::Store(e) => write!(f, "Store error: {}", e),
            FreefallError::Game(e) => write!(f, "Game error: {}", e),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            ConfigurationError::MissingRequired(field) => write!(f, "Missing required field: {}", field),
            ConfigurationError::InvalidValue { field, value, reason } => {
                write!(f, "Invalid value for {}: '{}' ({})", field, value, reason)
            }
            ConfigurationError::LoadFailed(msg) => write!(f, "Failed to load configuration: {}", msg),
            ConfigurationError::SaveFailed(msg) => write!(f, "Failed to save configuration: {}", msg),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::CorruptedRecord(msg) => write!(f, "Corrupted record: {}", msg),
            StoreError::DuplicateRound(id) => write!(f, "Duplicate round: {}", id),
        }
    }
}

impl std::error::Error for FreefallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FreefallError::Configuration(e) => Some(e),
            FreefallError::Store(e) => Some(e),
            FreefallError::Game(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigurationError {}
impl std::error::Error for StoreError {}

impl From<ConfigurationError> for FreefallError {
    fn from(e: ConfigurationError) -> Self {
        FreefallError::Configuration(e)
    }
}

impl From<StoreError> for FreefallError {
    fn from(e: StoreError) -> Self {
        FreefallError::Store(e)
    }
}

impl From<GameError> for FreefallError {
    fn from(e: GameError) -> Self {
        FreefallError::Game(e)
    }
}

impl From<std::io::Error> for FreefallError {
    fn from(e: std::io::Error) -> Self {
        FreefallError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

// Convenience type alias for Results
pub type FreefallResult<T> = Result<T, FreefallError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let config_error = ConfigurationError::ValidationFailed("weights".to_string());
        let error = FreefallError::Configuration(config_error);

        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("weights"));
    }

    #[test]
    fn test_game_error_codes_are_stable() {
        assert_eq!(GameError::InvalidSession.code(), "INVALID_SESSION");
        assert_eq!(GameError::SessionExpired.code(), "SESSION_EXPIRED");
        assert_eq!(GameError::InvalidBet("step".into()).code(), "INVALID_BET");
        assert_eq!(
            GameError::InsufficientBalance { bet: 2, balance: 1 }.code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(GameError::RoundNotFound.code(), "ROUND_NOT_FOUND");
        assert_eq!(GameError::SessionMismatch.code(), "SESSION_MISMATCH");
        assert_eq!(GameError::RoundCompleted.code(), "ROUND_COMPLETED");
        assert_eq!(GameError::Internal.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_internal_error_hides_details() {
        assert_eq!(GameError::Internal.to_string(), "Internal error");
    }

    #[test]
    fn test_error_conversion_and_source() {
        let error: FreefallError = StoreError::CorruptedRecord("round r1 missing from index".to_string()).into();
        match &error {
            FreefallError::Store(_) => {}
            _ => panic!("Expected store error"),
        }
        assert!(error.source().is_some());
    }
}
