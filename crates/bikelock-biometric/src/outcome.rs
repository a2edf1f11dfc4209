//! Normalized operation outcomes.
//!
//! The fingerprint module reports dozens of confirmation codes. Callers
//! only care about a handful of outcomes, so every hardware error is folded
//! into [`EnrollmentFailure`] or [`StoreFailure`] here.

use bikelock_core::{EnrollmentFailure, StoreFailure};
use bikelock_hardware::{HardwareError, SensorCode};

/// Result of an enrollment session.
pub type EnrollOutcome = std::result::Result<(), EnrollmentFailure>;

/// Result of a delete or wipe.
pub type StoreOutcome = std::result::Result<(), StoreFailure>;

/// What a failed capture means for a session waiting on a finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaptureFault {
    /// Nothing usable on the window yet; poll again.
    Retry,
    /// Abort the session.
    Abort(EnrollmentFailure),
}

pub(crate) fn capture_fault(error: &HardwareError) -> CaptureFault {
    if error.is_communication_fault() {
        CaptureFault::Abort(EnrollmentFailure::CommFault)
    } else {
        CaptureFault::Retry
    }
}

/// Failure when features cannot be extracted from a captured image.
pub(crate) fn extraction_failure(error: &HardwareError) -> EnrollmentFailure {
    if error.is_communication_fault() {
        EnrollmentFailure::CommFault
    } else {
        EnrollmentFailure::ImageQuality
    }
}

/// Failure when the two feature buffers cannot be merged.
pub(crate) fn model_failure(error: &HardwareError) -> EnrollmentFailure {
    match error.sensor_code() {
        Some(SensorCode::EnrollMismatch) => EnrollmentFailure::Mismatch,
        _ if error.is_communication_fault() => EnrollmentFailure::CommFault,
        _ => EnrollmentFailure::ImageQuality,
    }
}

/// Failure when the merged model cannot be written.
pub(crate) fn commit_failure(error: &HardwareError) -> EnrollmentFailure {
    if error.is_communication_fault() {
        EnrollmentFailure::CommFault
    } else {
        EnrollmentFailure::StorageFault
    }
}

pub(crate) fn store_failure(error: &HardwareError) -> StoreFailure {
    match error.sensor_code() {
        Some(SensorCode::NotFound) => StoreFailure::NotFound,
        _ if error.is_communication_fault() => StoreFailure::CommFault,
        _ => StoreFailure::StorageFault,
    }
}
