//! Common types shared across hardware device implementations.
//!
//! This module defines device information, logic levels, the fingerprint
//! module's feature buffers and its confirmation codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic device information.
///
/// Contains metadata about a hardware device such as name, model
/// and firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "R503", "Mock Fingerprint Sensor").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, PinLevel::High)
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high { PinLevel::High } else { PinLevel::Low }
    }
}

/// Character buffer on the fingerprint module that receives extracted features.
///
/// Identification uses buffer one; enrollment fills both and then merges
/// them into a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureSlot {
    One,
    Two,
}

impl FeatureSlot {
    /// Buffer number as sent on the wire.
    pub fn buffer_id(self) -> u8 {
        match self {
            FeatureSlot::One => 1,
            FeatureSlot::Two => 2,
        }
    }
}

/// Non-OK confirmation codes reported by the fingerprint module.
///
/// Codes follow the R30x/R50x/AS608 family command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SensorCode {
    /// Error receiving the command packet.
    PacketReceiveError,
    /// No finger on the sensor window.
    NoFinger,
    /// Image capture failed.
    ImageFail,
    /// Image too disordered to extract features.
    ImageMess,
    /// Too few feature points.
    FeatureFail,
    /// Search found no matching template.
    NotFound,
    /// The two feature buffers do not belong to the same finger.
    EnrollMismatch,
    /// Template slot outside the module's library.
    BadLocation,
    /// Deleting a template failed.
    DeleteFail,
    /// Clearing the library failed.
    DatabaseClearFail,
    /// No valid primary image in the image buffer.
    InvalidImage,
    /// Writing to flash failed.
    FlashError,
    /// Any other code.
    Unknown(u8),
}

impl SensorCode {
    /// Decode a confirmation byte. Returns `None` for `0x00` (OK).
    pub fn from_confirmation(byte: u8) -> Option<Self> {
        let code = match byte {
            0x00 => return None,
            0x01 => SensorCode::PacketReceiveError,
            0x02 => SensorCode::NoFinger,
            0x03 => SensorCode::ImageFail,
            0x06 => SensorCode::ImageMess,
            0x07 => SensorCode::FeatureFail,
            0x09 => SensorCode::NotFound,
            0x0A => SensorCode::EnrollMismatch,
            0x0B => SensorCode::BadLocation,
            0x10 => SensorCode::DeleteFail,
            0x11 => SensorCode::DatabaseClearFail,
            0x15 => SensorCode::InvalidImage,
            0x18 => SensorCode::FlashError,
            other => SensorCode::Unknown(other),
        };
        Some(code)
    }

    /// Confirmation byte for this code.
    pub fn confirmation(self) -> u8 {
        match self {
            SensorCode::PacketReceiveError => 0x01,
            SensorCode::NoFinger => 0x02,
            SensorCode::ImageFail => 0x03,
            SensorCode::ImageMess => 0x06,
            SensorCode::FeatureFail => 0x07,
            SensorCode::NotFound => 0x09,
            SensorCode::EnrollMismatch => 0x0A,
            SensorCode::BadLocation => 0x0B,
            SensorCode::DeleteFail => 0x10,
            SensorCode::DatabaseClearFail => 0x11,
            SensorCode::InvalidImage => 0x15,
            SensorCode::FlashError => 0x18,
            SensorCode::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for SensorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorCode::PacketReceiveError => write!(f, "packet receive error"),
            SensorCode::NoFinger => write!(f, "no finger on sensor"),
            SensorCode::ImageFail => write!(f, "imaging error"),
            SensorCode::ImageMess => write!(f, "image too messy"),
            SensorCode::FeatureFail => write!(f, "could not find fingerprint features"),
            SensorCode::NotFound => write!(f, "no matching template"),
            SensorCode::EnrollMismatch => write!(f, "fingerprints did not match"),
            SensorCode::BadLocation => write!(f, "bad template location"),
            SensorCode::DeleteFail => write!(f, "delete failed"),
            SensorCode::DatabaseClearFail => write!(f, "database clear failed"),
            SensorCode::InvalidImage => write!(f, "invalid image"),
            SensorCode::FlashError => write!(f, "error writing to flash"),
            SensorCode::Unknown(byte) => write!(f, "unknown code 0x{byte:02X}"),
        }
    }
}
