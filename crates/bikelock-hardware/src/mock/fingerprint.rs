//! Mock fingerprint module for testing and development.
//!
//! This module simulates the command set of an optical/capacitive
//! fingerprint module: an image buffer, two feature buffers, a merged
//! model and a template library keyed by slot. Fingers are plain integers;
//! two captures match when they carry the same [`FingerId`].

use crate::{
    HardwareError, Result,
    mock::lock_state,
    traits::FingerprintSensor,
    types::{DeviceInfo, FeatureSlot, SensorCode},
};
use bikelock_core::TemplateId;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Identity of a simulated finger.
pub type FingerId = u32;

/// Outcome of the next image capture.
///
/// When no capture is queued the sensor behaves as if the window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// A clean image of the given finger.
    Finger(FingerId),
    /// An image was taken but features cannot be extracted.
    Smudged,
    /// The imaging hardware failed.
    ImageFail,
    /// Nothing on the window.
    NoFinger,
    /// The module did not answer the command packet.
    CommFault,
    /// The module never answers; the capture future stays pending.
    Stall,
}

#[derive(Debug, Default)]
struct SensorState {
    captures: VecDeque<Capture>,
    image: Option<Capture>,
    buffers: [Option<FingerId>; 2],
    model: Option<FingerId>,
    library: BTreeMap<TemplateId, FingerId>,
    storage_fault: bool,
    offline: bool,
    captures_taken: u64,
}

impl SensorState {
    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(HardwareError::disconnected("Mock fingerprint sensor offline"));
        }
        Ok(())
    }
}

/// Mock fingerprint sensor.
///
/// # Examples
///
/// ```
/// use bikelock_hardware::mock::MockFingerprint;
/// use bikelock_hardware::traits::FingerprintSensor;
/// use bikelock_hardware::types::FeatureSlot;
/// use bikelock_core::TemplateId;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> bikelock_hardware::Result<()> {
///     let (mut sensor, handle) = MockFingerprint::new();
///     let slot = TemplateId::new(7).unwrap();
///
///     handle.add_template(slot, 42);
///     handle.present_finger(42);
///
///     sensor.capture_image().await?;
///     sensor.extract_features(FeatureSlot::One).await?;
///     assert_eq!(sensor.search().await?, slot);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFingerprint {
    state: Arc<Mutex<SensorState>>,
    name: String,
}

impl MockFingerprint {
    /// Create a new mock sensor with the default name.
    ///
    /// Returns a tuple of (MockFingerprint, MockFingerprintHandle) where the
    /// handle scripts captures and inspects the template library.
    pub fn new() -> (Self, MockFingerprintHandle) {
        Self::with_name("Mock Fingerprint Sensor".to_string())
    }

    /// Create a new mock sensor with a custom name.
    pub fn with_name(name: String) -> (Self, MockFingerprintHandle) {
        let state = Arc::new(Mutex::new(SensorState::default()));
        let sensor = Self {
            state: Arc::clone(&state),
            name,
        };
        (sensor, MockFingerprintHandle { state })
    }
}

impl Default for MockFingerprint {
    fn default() -> Self {
        Self::new().0
    }
}

impl FingerprintSensor for MockFingerprint {
    async fn capture_image(&mut self) -> Result<()> {
        let outcome = {
            let mut state = lock_state(&self.state);
            state.check_online()?;
            state.captures_taken += 1;
            let capture = state.captures.pop_front().unwrap_or(Capture::NoFinger);
            match capture {
                Capture::Stall => None,
                Capture::CommFault => Some(Err(HardwareError::sensor(
                    SensorCode::PacketReceiveError,
                ))),
                Capture::NoFinger => {
                    state.image = None;
                    Some(Err(HardwareError::sensor(SensorCode::NoFinger)))
                }
                Capture::ImageFail => {
                    state.image = None;
                    Some(Err(HardwareError::sensor(SensorCode::ImageFail)))
                }
                Capture::Finger(_) | Capture::Smudged => {
                    state.image = Some(capture);
                    Some(Ok(()))
                }
            }
        };

        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn extract_features(&mut self, slot: FeatureSlot) -> Result<()> {
        let mut state = lock_state(&self.state);
        state.check_online()?;
        let index = usize::from(slot.buffer_id() - 1);
        let image = state.image;
        match image {
            Some(Capture::Finger(finger)) => {
                state.buffers[index] = Some(finger);
                Ok(())
            }
            Some(_) => Err(HardwareError::sensor(SensorCode::ImageMess)),
            None => Err(HardwareError::sensor(SensorCode::InvalidImage)),
        }
    }

    async fn search(&mut self) -> Result<TemplateId> {
        let state = lock_state(&self.state);
        state.check_online()?;
        let finger = state.buffers[0].ok_or(HardwareError::sensor(SensorCode::NotFound))?;
        state
            .library
            .iter()
            .find(|(_, stored)| **stored == finger)
            .map(|(id, _)| *id)
            .ok_or(HardwareError::sensor(SensorCode::NotFound))
    }

    async fn create_model(&mut self) -> Result<()> {
        let mut state = lock_state(&self.state);
        state.check_online()?;
        let buffers = state.buffers;
        match buffers {
            [Some(first), Some(second)] if first == second => {
                state.model = Some(first);
                Ok(())
            }
            _ => {
                state.model = None;
                Err(HardwareError::sensor(SensorCode::EnrollMismatch))
            }
        }
    }

    async fn store_model(&mut self, id: TemplateId) -> Result<()> {
        let mut state = lock_state(&self.state);
        state.check_online()?;
        if state.storage_fault {
            return Err(HardwareError::sensor(SensorCode::FlashError));
        }
        let finger = state
            .model
            .take()
            .ok_or_else(|| HardwareError::invalid_data("No model to store"))?;
        state.library.insert(id, finger);
        Ok(())
    }

    async fn delete_model(&mut self, id: TemplateId) -> Result<()> {
        let mut state = lock_state(&self.state);
        state.check_online()?;
        if state.storage_fault {
            return Err(HardwareError::sensor(SensorCode::DeleteFail));
        }
        state
            .library
            .remove(&id)
            .map(|_| ())
            .ok_or(HardwareError::sensor(SensorCode::NotFound))
    }

    async fn empty_database(&mut self) -> Result<()> {
        let mut state = lock_state(&self.state);
        state.check_online()?;
        if state.storage_fault {
            return Err(HardwareError::sensor(SensorCode::DatabaseClearFail));
        }
        state.library.clear();
        Ok(())
    }

    async fn get_device_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Fingerprint Module v1.0")
            .with_firmware_version("1.0.0"))
    }
}

/// Handle for controlling a mock fingerprint sensor.
///
/// Cloning the handle shares the same simulated module.
#[derive(Debug, Clone)]
pub struct MockFingerprintHandle {
    state: Arc<Mutex<SensorState>>,
}

impl MockFingerprintHandle {
    /// Queue an arbitrary capture outcome.
    pub fn queue_capture(&self, capture: Capture) {
        lock_state(&self.state).captures.push_back(capture);
    }

    /// Simulate a finger placed on the window for the next capture.
    pub fn present_finger(&self, finger: FingerId) {
        self.queue_capture(Capture::Finger(finger));
    }

    /// Simulate the finger being lifted for the next capture.
    pub fn lift_finger(&self) {
        self.queue_capture(Capture::NoFinger);
    }

    /// Script a complete enrollment: first capture, removal, second capture.
    pub fn queue_enrollment(&self, first: FingerId, second: FingerId) {
        let mut state = lock_state(&self.state);
        state.captures.push_back(Capture::Finger(first));
        state.captures.push_back(Capture::NoFinger);
        state.captures.push_back(Capture::Finger(second));
    }

    /// Store a template directly, bypassing enrollment.
    pub fn add_template(&self, id: TemplateId, finger: FingerId) {
        lock_state(&self.state).library.insert(id, finger);
    }

    /// Check whether a slot holds a template.
    pub fn has_template(&self, id: TemplateId) -> bool {
        lock_state(&self.state).library.contains_key(&id)
    }

    /// Finger stored in a slot.
    pub fn template_finger(&self, id: TemplateId) -> Option<FingerId> {
        lock_state(&self.state).library.get(&id).copied()
    }

    /// Get the number of stored templates.
    pub fn template_count(&self) -> usize {
        lock_state(&self.state).library.len()
    }

    /// Make every store, delete and wipe fail with a flash error.
    pub fn set_storage_fault(&self, fault: bool) {
        lock_state(&self.state).storage_fault = fault;
    }

    /// Make every command fail as if the module were unplugged.
    pub fn set_offline(&self, offline: bool) {
        lock_state(&self.state).offline = offline;
    }

    /// Number of scripted captures not yet consumed.
    pub fn pending_captures(&self) -> usize {
        lock_state(&self.state).captures.len()
    }

    /// Number of capture commands the sensor has received.
    pub fn captures_taken(&self) -> u64 {
        lock_state(&self.state).captures_taken
    }
}
