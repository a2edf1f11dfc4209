//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware. Each mock is
//! created together with a handle; the device goes to the controller and
//! the handle stays with the test (or simulator) to script inputs and
//! inspect outputs.

pub mod fingerprint;
pub mod pin;
pub mod serial;
pub mod servo;

// Re-export commonly used types
pub use fingerprint::{Capture, FingerId, MockFingerprint, MockFingerprintHandle};
pub use pin::{MockInput, MockInputHandle, MockOutput, MockOutputHandle};
pub use serial::{MockSerial, MockSerialHandle};
pub use servo::{MockServo, MockServoHandle};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared mock state, recovering from a poisoned mutex.
///
/// Mock state stays usable after a panicking test thread so later
/// assertions still see what the device recorded.
pub(crate) fn lock_state<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
