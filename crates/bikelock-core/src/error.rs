use thiserror::Error;

use crate::types::{EnrollmentFailure, StoreFailure};

#[derive(Error, Debug)]
pub enum Error {
    // Sensor errors
    #[error("Sensor fault: {0}")]
    SensorFault(String),

    #[error("Enrollment failed: {0}")]
    Enrollment(EnrollmentFailure),

    #[error("Template store failure: {0}")]
    StorageFault(StoreFailure),

    // Protocol errors
    #[error("Protocol noise: {0}")]
    ProtocolNoise(String),

    #[error("Invalid template ID: {0}")]
    InvalidTemplateId(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<EnrollmentFailure> for Error {
    fn from(failure: EnrollmentFailure) -> Self {
        Self::Enrollment(failure)
    }
}

impl From<StoreFailure> for Error {
    fn from(failure: StoreFailure) -> Self {
        Self::StorageFault(failure)
    }
}

impl Error {
    /// Whether the control loop may simply carry on after this error.
    ///
    /// Every variant except configuration problems is absorbed by the
    /// control cycle; configuration errors only surface at startup.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
