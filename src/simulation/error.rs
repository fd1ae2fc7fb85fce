//! Error types and handling
//!
//! This module contains error types for the turnstile and the simulation driver.

use thiserror::Error;

use crate::types::ConfigValidationError;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// Shutdown was signalled before the caller was admitted
    #[error("Shutdown requested")]
    ShutdownRequested,

    /// A thread panicked while holding the turnstile
    #[error("Turnstile lock poisoned: {0}")]
    LockPoisoned(String),

    /// Shared occupancy state broke one of its invariants
    #[error("Occupancy invariant violated: {0}")]
    InvariantViolation(String),

    /// An actor thread could not be started
    #[error("Failed to spawn actor thread: {0}")]
    SpawnError(String),

    /// An actor thread panicked
    #[error("Actor {0} panicked")]
    ActorPanicked(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a lock poisoning error
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        Self::LockPoisoned(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Only cancellation is expected in a healthy run; everything else means the
    /// synchronization state can no longer be trusted.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::ShutdownRequested => true,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
            SimulationError::ConfigurationError(_) => false,
            SimulationError::LockPoisoned(_) => false,
            SimulationError::InvariantViolation(_) => false,
            SimulationError::SpawnError(_) => false,
            SimulationError::ActorPanicked(_) => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::ShutdownRequested => "Cancellation",
            SimulationError::LockPoisoned(_) => "Synchronization",
            SimulationError::InvariantViolation(_) => "Invariant",
            SimulationError::SpawnError(_) => "Thread",
            SimulationError::ActorPanicked(_) => "Thread",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = SimulationError::configuration_error("bad range");
        assert!(matches!(error, SimulationError::ConfigurationError(_)));
        assert_eq!(error.category(), "Configuration");
        assert!(!error.is_recoverable());

        let error = SimulationError::invariant_violation("both categories inside");
        assert_eq!(error.to_string(), "Occupancy invariant violated: both categories inside");
        assert!(!error.is_recoverable());

        let error = SimulationError::lock_poisoned("turnstile");
        assert_eq!(error.category(), "Synchronization");
    }

    #[test]
    fn test_shutdown_is_recoverable() {
        let error = SimulationError::ShutdownRequested;
        assert!(error.is_recoverable());
        assert_eq!(error.category(), "Cancellation");
    }

    #[test]
    fn test_from_validation_error() {
        let error: SimulationError = ConfigValidationError::InvalidCycleCount(0).into();
        assert!(matches!(error, SimulationError::ConfigurationError(_)));
        assert!(error.to_string().contains("Cycle count"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let error: SimulationError = io.into();
        assert_eq!(error.category(), "IO");
        assert!(error.is_recoverable());
    }
}
