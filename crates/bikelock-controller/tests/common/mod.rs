//! Common test utilities for controller integration tests.
//!
//! [`Rig`] wires a [`LockController`] to a full set of mock devices and keeps
//! every control handle, so a test can play the rider, the operator and the
//! remote controller at once.

#![allow(dead_code)]

use std::time::Duration;

use bikelock_controller::{LockController, Peripherals};
use bikelock_core::{LockConfig, TemplateId};
use bikelock_hardware::PinLevel;
use bikelock_hardware::mock::{
    FingerId, MockFingerprint, MockFingerprintHandle, MockInput, MockInputHandle, MockOutput,
    MockOutputHandle, MockSerial, MockSerialHandle, MockServo, MockServoHandle,
};

/// One control cycle at the default cadence.
pub const CYCLE: Duration = Duration::from_millis(50);

/// Finger enrolled in [`RIDER_SLOT`] by [`Rig::with_rider`].
pub const RIDER: FingerId = 42;
pub const RIDER_SLOT: u16 = 7;

/// A finger the sensor has never seen.
pub const STRANGER: FingerId = 99;

pub type MockController =
    LockController<MockFingerprint, MockServo, MockInput, MockOutput, MockSerial>;

pub struct Rig {
    pub controller: MockController,
    pub sensor: MockFingerprintHandle,
    pub front: MockServoHandle,
    pub rear: MockServoHandle,
    pub tilt: MockInputHandle,
    pub button: MockInputHandle,
    pub locked_led: MockOutputHandle,
    pub unlocked_led: MockOutputHandle,
    pub buzzer: MockOutputHandle,
    pub link: MockSerialHandle,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        let (sensor, sensor_handle) = MockFingerprint::new();
        let (front, front_handle) = MockServo::new();
        let (rear, rear_handle) = MockServo::new();
        let (tilt, tilt_handle) = MockInput::new();
        let (button, button_handle) = MockInput::new();
        let (locked_led, locked_handle) = MockOutput::new(PinLevel::Low);
        let (unlocked_led, unlocked_handle) = MockOutput::new(PinLevel::Low);
        let (buzzer, buzzer_handle) = MockOutput::new(PinLevel::High);
        let (link, link_handle) = MockSerial::new();

        let peripherals = Peripherals {
            sensor,
            front_servo: front,
            rear_servo: rear,
            tilt,
            button,
            locked_led,
            unlocked_led,
            buzzer,
            link,
        };

        Self {
            controller: LockController::new(peripherals, config).unwrap(),
            sensor: sensor_handle,
            front: front_handle,
            rear: rear_handle,
            tilt: tilt_handle,
            button: button_handle,
            locked_led: locked_handle,
            unlocked_led: unlocked_handle,
            buzzer: buzzer_handle,
            link: link_handle,
        }
    }

    /// A rig whose sensor already holds the rider's template.
    pub fn with_rider() -> Self {
        let rig = Self::new();
        rig.sensor.add_template(id(RIDER_SLOT), RIDER);
        rig
    }
}

pub fn id(n: u16) -> TemplateId {
    TemplateId::new(n).unwrap()
}
