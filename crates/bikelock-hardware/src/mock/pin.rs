//! Mock digital inputs and outputs.
//!
//! [`MockInput`] stands in for the tilt sensor and the lock button;
//! [`MockOutput`] for the LEDs and the buzzer.

use crate::{
    HardwareError, Result,
    mock::lock_state,
    traits::{BinaryInput, DigitalOutput},
    types::PinLevel,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct InputState {
    held: bool,
    pulses: u32,
    fault: bool,
    reads: u64,
}

/// Mock binary input.
///
/// The input is active while held, or for one read per queued pulse.
///
/// # Examples
///
/// ```
/// use bikelock_hardware::mock::MockInput;
/// use bikelock_hardware::traits::BinaryInput;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> bikelock_hardware::Result<()> {
///     let (mut button, handle) = MockInput::new();
///     handle.pulse();
///     assert!(button.is_active().await?);
///     assert!(!button.is_active().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInput {
    state: Arc<Mutex<InputState>>,
}

impl MockInput {
    /// Create a new inactive input and its control handle.
    pub fn new() -> (Self, MockInputHandle) {
        let state = Arc::new(Mutex::new(InputState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockInputHandle { state },
        )
    }
}

impl Default for MockInput {
    fn default() -> Self {
        Self::new().0
    }
}

impl BinaryInput for MockInput {
    async fn is_active(&mut self) -> Result<bool> {
        let mut state = lock_state(&self.state);
        state.reads += 1;
        if state.fault {
            return Err(HardwareError::communication("Input pin read failed"));
        }
        if state.pulses > 0 {
            state.pulses -= 1;
            return Ok(true);
        }
        Ok(state.held)
    }
}

/// Handle for driving a mock input.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    state: Arc<Mutex<InputState>>,
}

impl MockInputHandle {
    /// Hold the input active (or release it) until changed again.
    pub fn set_active(&self, active: bool) {
        lock_state(&self.state).held = active;
    }

    /// Make the input read active exactly once.
    pub fn pulse(&self) {
        lock_state(&self.state).pulses += 1;
    }

    /// Make subsequent reads fail.
    pub fn set_fault(&self, fault: bool) {
        lock_state(&self.state).fault = fault;
    }

    /// Number of reads the device has served.
    pub fn reads(&self) -> u64 {
        lock_state(&self.state).reads
    }
}

#[derive(Debug)]
struct OutputState {
    level: PinLevel,
    history: Vec<PinLevel>,
    fault: bool,
}

/// Mock digital output recording every level written.
#[derive(Debug)]
pub struct MockOutput {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutput {
    /// Create a new output starting at `initial` and its inspection handle.
    pub fn new(initial: PinLevel) -> (Self, MockOutputHandle) {
        let state = Arc::new(Mutex::new(OutputState {
            level: initial,
            history: Vec::new(),
            fault: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockOutputHandle { state },
        )
    }
}

impl DigitalOutput for MockOutput {
    async fn set_level(&mut self, level: PinLevel) -> Result<()> {
        let mut state = lock_state(&self.state);
        if state.fault {
            return Err(HardwareError::communication("Output pin write failed"));
        }
        state.level = level;
        state.history.push(level);
        Ok(())
    }
}

/// Handle for inspecting a mock output.
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputHandle {
    /// Current pin level.
    pub fn level(&self) -> PinLevel {
        lock_state(&self.state).level
    }

    /// Every level written, oldest first.
    pub fn history(&self) -> Vec<PinLevel> {
        lock_state(&self.state).history.clone()
    }

    /// Number of transitions into `level` recorded in the history.
    pub fn count_transitions_to(&self, level: PinLevel) -> usize {
        let state = lock_state(&self.state);
        let mut previous = None;
        let mut count = 0;
        for current in &state.history {
            if *current == level && previous != Some(*current) {
                count += 1;
            }
            previous = Some(*current);
        }
        count
    }

    /// Forget recorded history, keeping the current level.
    pub fn clear_history(&self) {
        lock_state(&self.state).history.clear();
    }

    /// Make subsequent writes fail.
    pub fn set_fault(&self, fault: bool) {
        lock_state(&self.state).fault = fault;
    }
}
