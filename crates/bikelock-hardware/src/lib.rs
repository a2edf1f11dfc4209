//! Hardware device abstraction layer for the bike lock controller.
//!
//! This crate provides trait-based abstractions for the lock's peripherals:
//! the optical fingerprint module, the two wheel-lock servos, the tilt sensor
//! and lock button, the buzzer and LEDs, and the serial link to the remote
//! controller. The control logic only ever sees these traits, so mock
//! implementations (for development and testing) and real drivers are
//! interchangeable.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Generic, not dynamic**: consumers take devices as type parameters.
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//!
//! # Fingerprint Module
//!
//! The [`FingerprintSensor`] trait exposes the module's primitives; the
//! identification and enrollment sequences are built on top of it in
//! `bikelock-biometric`:
//!
//! ```no_run
//! use bikelock_hardware::traits::FingerprintSensor;
//! use bikelock_hardware::types::{FeatureSlot, SensorCode};
//! use bikelock_hardware::error::Result;
//! use bikelock_core::TemplateId;
//!
//! async fn try_identify<S: FingerprintSensor>(sensor: &mut S) -> Result<Option<TemplateId>> {
//!     sensor.capture_image().await?;
//!     sensor.extract_features(FeatureSlot::One).await?;
//!     match sensor.search().await {
//!         Ok(id) => Ok(Some(id)),
//!         Err(e) if e.sensor_code() == Some(SensorCode::NotFound) => Ok(None),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HardwareError`] error type, carrying the module's confirmation code
//! where there is one.
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides scriptable stand-ins for every device.
//!
//! [`FingerprintSensor`]: traits::FingerprintSensor

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{BinaryInput, ByteTransport, DigitalOutput, FingerprintSensor, ServoDriver};
pub use types::{DeviceInfo, FeatureSlot, PinLevel, SensorCode};
