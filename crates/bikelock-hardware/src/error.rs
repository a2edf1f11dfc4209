//! Error types for hardware operations.
//!
//! This module defines error types specific to device operations, covering
//! disconnection, timeouts, serial communication faults and the confirmation
//! codes reported by the fingerprint module.

use crate::types::SensorCode;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The fingerprint module answered with a non-OK confirmation code.
    #[error("Sensor reported {code}")]
    Sensor { code: SensorCode },

    /// Invalid data received from or sent to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new sensor confirmation error.
    pub fn sensor(code: SensorCode) -> Self {
        Self::Sensor { code }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Sensor confirmation code carried by this error, if any.
    pub fn sensor_code(&self) -> Option<SensorCode> {
        match self {
            Self::Sensor { code } => Some(*code),
            _ => None,
        }
    }

    /// Whether this error means the device could not be talked to at all.
    pub fn is_communication_fault(&self) -> bool {
        match self {
            Self::Sensor { code } => *code == SensorCode::PacketReceiveError,
            Self::Disconnected { .. }
            | Self::Timeout { .. }
            | Self::CommunicationError { .. }
            | Self::Io(_) => true,
            Self::InvalidData { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("R503");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: R503");
        assert!(error.is_communication_fault());
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(1000);
        assert_eq!(error.to_string(), "Operation timeout after 1000ms");
        assert!(error.is_communication_fault());
    }

    #[test]
    fn test_sensor_error() {
        let error = HardwareError::sensor(SensorCode::NoFinger);
        assert_eq!(error.sensor_code(), Some(SensorCode::NoFinger));
        assert_eq!(error.to_string(), "Sensor reported no finger on sensor");
        assert!(!error.is_communication_fault());

        let error = HardwareError::sensor(SensorCode::PacketReceiveError);
        assert!(error.is_communication_fault());
    }

    #[test]
    fn test_invalid_data_error() {
        let error = HardwareError::invalid_data("angle 200 out of range");
        assert_eq!(error.sensor_code(), None);
        assert!(!error.is_communication_fault());
    }
}
