//! Lock actuation and alert outputs.
//!
//! - [`LockActuator`] turns a lock/unlock intent into synchronized motion of
//!   the front and rear wheel-lock servos.
//! - [`AlertPanel`] drives the two status LEDs and the buzzer.

pub mod actuator;
pub mod alert;

pub use actuator::{LockActuator, sweep_positions};
pub use alert::{AlertPanel, BuzzerMode, buzzer_level};
