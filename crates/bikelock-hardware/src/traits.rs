//! Hardware device trait definitions.
//!
//! This module defines the contract between the lock controller and the
//! physical peripherals: the fingerprint module, the two wheel-lock servos,
//! the tilt and button inputs, the buzzer and LED outputs, and the serial
//! link to the remote controller. Mock implementations live in
//! [`mock`](crate::mock); real drivers implement the same traits.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.
//!
//! # Object Safety
//!
//! These traits are NOT object-safe because `async fn` methods return
//! `impl Future`. Consumers take them as generic type parameters:
//!
//! ```no_run
//! use bikelock_hardware::traits::BinaryInput;
//! use bikelock_hardware::error::Result;
//!
//! async fn wait_for_press<B: BinaryInput>(button: &mut B) -> Result<()> {
//!     while !button.is_active().await? {}
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)]

use bikelock_core::TemplateId;

use crate::error::Result;
use crate::types::{DeviceInfo, FeatureSlot, PinLevel};

/// Fingerprint module primitives.
///
/// Each method maps to one module command. A non-OK confirmation code is
/// reported as [`HardwareError::Sensor`](crate::HardwareError::Sensor);
/// transport problems as the other error variants. Template bytes never
/// leave the module.
///
/// # Examples
///
/// ```no_run
/// use bikelock_hardware::traits::FingerprintSensor;
/// use bikelock_hardware::types::FeatureSlot;
/// use bikelock_hardware::error::Result;
/// use bikelock_core::TemplateId;
///
/// async fn identify_once<S: FingerprintSensor>(sensor: &mut S) -> Result<TemplateId> {
///     sensor.capture_image().await?;
///     sensor.extract_features(FeatureSlot::One).await?;
///     sensor.search().await
/// }
/// ```
pub trait FingerprintSensor: Send + Sync {
    /// Capture a fingerprint image into the module's image buffer.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { NoFinger }` if nothing is on the window,
    /// `Sensor { ImageFail }` on an imaging error, or a communication error.
    async fn capture_image(&mut self) -> Result<()>;

    /// Extract features from the image buffer into a character buffer.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { ImageMess | FeatureFail | InvalidImage }` when the
    /// image is unusable, or a communication error.
    async fn extract_features(&mut self, slot: FeatureSlot) -> Result<()>;

    /// Search the template library for the features in buffer one.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { NotFound }` if no template matches.
    async fn search(&mut self) -> Result<TemplateId>;

    /// Merge both character buffers into a model.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { EnrollMismatch }` if the buffers hold different fingers.
    async fn create_model(&mut self) -> Result<()>;

    /// Store the merged model into a template slot.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { BadLocation | FlashError }` if the store fails.
    async fn store_model(&mut self, id: TemplateId) -> Result<()>;

    /// Delete the template stored in a slot.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { NotFound }` for an empty slot, or
    /// `Sensor { DeleteFail | BadLocation | FlashError }`.
    async fn delete_model(&mut self, id: TemplateId) -> Result<()>;

    /// Delete every stored template.
    ///
    /// # Errors
    ///
    /// Returns `Sensor { DatabaseClearFail }` or a communication error.
    async fn empty_database(&mut self) -> Result<()>;

    /// Get device information.
    async fn get_device_info(&self) -> Result<DeviceInfo>;
}

/// Positional servo driving one wheel lock.
pub trait ServoDriver: Send + Sync {
    /// Command the servo to an absolute angle (0-180 degrees).
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for an angle above 180, or a communication error.
    async fn write_angle(&mut self, angle: u8) -> Result<()>;
}

/// Debounced binary input such as the tilt sensor or the lock button.
///
/// Polarity and debouncing belong to the implementation; `true` always
/// means "motion detected" or "button pressed".
pub trait BinaryInput: Send + Sync {
    /// Read the current state of the input.
    async fn is_active(&mut self) -> Result<bool>;
}

/// Digital output pin such as an LED or the buzzer.
pub trait DigitalOutput: Send + Sync {
    /// Drive the pin to the given level.
    async fn set_level(&mut self, level: PinLevel) -> Result<()>;
}

/// Byte-oriented link to the remote controller.
///
/// # Examples
///
/// ```no_run
/// use bikelock_hardware::traits::ByteTransport;
/// use bikelock_hardware::error::Result;
///
/// async fn echo<T: ByteTransport>(link: &mut T) -> Result<()> {
///     let mut buf = [0u8; 64];
///     let n = link.try_read(&mut buf).await?;
///     link.write_all(&buf[..n]).await
/// }
/// ```
pub trait ByteTransport: Send + Sync {
    /// Copy whatever bytes are already available into `buf`.
    ///
    /// Never waits for data; returns `Ok(0)` when nothing is pending.
    async fn try_read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write every byte of `data`.
    async fn write_all(&mut self, data: &[u8]) -> Result<()>;
}
