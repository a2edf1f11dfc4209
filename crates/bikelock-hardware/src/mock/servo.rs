//! Mock positional servo.
//!
//! Records every angle written so tests can check final positions and
//! sweep monotonicity.

use crate::{HardwareError, Result, mock::lock_state, traits::ServoDriver};
use bikelock_core::constants::MAX_SERVO_ANGLE;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ServoState {
    history: Vec<u8>,
    fault: bool,
}

/// Mock servo for testing and development.
///
/// # Examples
///
/// ```
/// use bikelock_hardware::mock::MockServo;
/// use bikelock_hardware::traits::ServoDriver;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> bikelock_hardware::Result<()> {
///     let (mut servo, handle) = MockServo::new();
///     servo.write_angle(90).await?;
///     assert_eq!(handle.position(), Some(90));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockServo {
    state: Arc<Mutex<ServoState>>,
}

impl MockServo {
    /// Create a new mock servo and its control handle.
    pub fn new() -> (Self, MockServoHandle) {
        let state = Arc::new(Mutex::new(ServoState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockServoHandle { state },
        )
    }
}

impl Default for MockServo {
    fn default() -> Self {
        Self::new().0
    }
}

impl ServoDriver for MockServo {
    async fn write_angle(&mut self, angle: u8) -> Result<()> {
        let mut state = lock_state(&self.state);
        if state.fault {
            return Err(HardwareError::communication("Servo not responding"));
        }
        if angle > MAX_SERVO_ANGLE {
            return Err(HardwareError::invalid_data(format!(
                "Servo angle must be 0-{MAX_SERVO_ANGLE}, got {angle}"
            )));
        }
        state.history.push(angle);
        Ok(())
    }
}

/// Handle for inspecting a mock servo.
#[derive(Debug, Clone)]
pub struct MockServoHandle {
    state: Arc<Mutex<ServoState>>,
}

impl MockServoHandle {
    /// Last commanded angle, if any write has succeeded.
    pub fn position(&self) -> Option<u8> {
        lock_state(&self.state).history.last().copied()
    }

    /// Every angle written, oldest first.
    pub fn history(&self) -> Vec<u8> {
        lock_state(&self.state).history.clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        lock_state(&self.state).history.len()
    }

    /// Make subsequent writes fail with a communication error.
    pub fn set_fault(&self, fault: bool) {
        lock_state(&self.state).fault = fault;
    }
}
