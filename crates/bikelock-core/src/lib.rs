pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{ActuationStyle, ActuatorConfig, AlertConfig, BuzzerPattern, LockConfig};
pub use error::{Error, Result};
pub use types::*;
