//! Mock hardware wiring and the line-based input script.
//!
//! Each stdin line is one of:
//!
//! ```text
//! 205 9             bare integers, sent to the command channel as wire bytes
//! finger 42         present finger 42 for the next capture
//! enroll-finger 42  script a full enrollment with finger 42
//! motion on|off     hold the tilt sensor active or release it
//! button            press the lock button once
//! wait 1500         pause input for 1500 ms
//! quit              stop the controller
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};

use bikelock_controller::{LockController, Peripherals};
use bikelock_core::LockConfig;
use bikelock_hardware::PinLevel;
use bikelock_hardware::mock::{
    FingerId, MockFingerprint, MockFingerprintHandle, MockInput, MockInputHandle, MockOutput,
    MockSerial, MockSerialHandle, MockServo,
};

pub type SimController =
    LockController<MockFingerprint, MockServo, MockInput, MockOutput, MockSerial>;

/// Handles the script drives.
#[derive(Debug, Clone)]
pub struct Devices {
    pub sensor: MockFingerprintHandle,
    pub tilt: MockInputHandle,
    pub button: MockInputHandle,
    pub link: MockSerialHandle,
}

/// Wire a controller to a fresh set of mock devices.
pub fn build(config: LockConfig) -> Result<(SimController, Devices)> {
    let (sensor, sensor_handle) = MockFingerprint::with_name("sim-fingerprint".to_string());
    let (front_servo, _) = MockServo::new();
    let (rear_servo, _) = MockServo::new();
    let (tilt, tilt_handle) = MockInput::new();
    let (button, button_handle) = MockInput::new();
    let (locked_led, _) = MockOutput::new(PinLevel::Low);
    let (unlocked_led, _) = MockOutput::new(PinLevel::Low);
    let (buzzer, _) = MockOutput::new(PinLevel::from(config.alert.buzzer_active_low));
    let (link, link_handle) = MockSerial::new();

    let peripherals = Peripherals {
        sensor,
        front_servo,
        rear_servo,
        tilt,
        button,
        locked_led,
        unlocked_led,
        buzzer,
        link,
    };
    let controller =
        LockController::new(peripherals, config).context("Invalid lock configuration")?;

    Ok((
        controller,
        Devices {
            sensor: sensor_handle,
            tilt: tilt_handle,
            button: button_handle,
            link: link_handle,
        },
    ))
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Wire(String),
    Finger(FingerId),
    EnrollFinger(FingerId),
    Motion(bool),
    Button,
    Wait(Duration),
    Quit,
}

/// Parse one script line; `Ok(None)` for blanks and comments.
pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.iter().all(|w| w.parse::<u32>().is_ok()) {
        return Ok(Some(Input::Wire(words.join(" "))));
    }

    let input = match words.as_slice() {
        ["finger", n] => Input::Finger(parse_finger(n)?),
        ["enroll-finger", n] => Input::EnrollFinger(parse_finger(n)?),
        ["motion", "on"] => Input::Motion(true),
        ["motion", "off"] => Input::Motion(false),
        ["button"] => Input::Button,
        ["wait", ms] => {
            let ms: u64 = ms.parse().with_context(|| format!("Invalid wait: {ms}"))?;
            Input::Wait(Duration::from_millis(ms))
        }
        ["quit"] | ["exit"] => Input::Quit,
        _ => bail!("Unknown input: {line}"),
    };
    Ok(Some(input))
}

fn parse_finger(text: &str) -> Result<FingerId> {
    text.parse()
        .with_context(|| format!("Invalid finger id: {text}"))
}

/// Apply a device-level input. `Wait` and `Quit` are handled by the reader.
pub fn apply(input: &Input, devices: &Devices) {
    match input {
        Input::Wire(tokens) => {
            debug!(%tokens, "Sending to command channel");
            devices.link.send(format!("{tokens}\n").as_bytes());
        }
        Input::Finger(finger) => devices.sensor.present_finger(*finger),
        Input::EnrollFinger(finger) => devices.sensor.queue_enrollment(*finger, *finger),
        Input::Motion(active) => devices.tilt.set_active(*active),
        Input::Button => devices.button.pulse(),
        Input::Wait(_) | Input::Quit => {}
    }
}

/// Read script lines from stdin until `quit` or end of input, then signal
/// shutdown.
pub async fn drive_from_stdin(devices: Devices, shutdown: watch::Sender<bool>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_line(&line) {
                Ok(Some(Input::Quit)) => break,
                Ok(Some(Input::Wait(pause))) => sleep(pause).await,
                Ok(Some(input)) => apply(&input, &devices),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ignoring input line"),
            },
            Ok(None) => {
                info!("Input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }

    if shutdown.send(true).is_err() {
        debug!("Controller already stopped");
    }
}

/// Print whatever the lock sent to the remote controller.
pub async fn relay_outbound(link: MockSerialHandle, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = ticker.tick() => print_outbound(&link),
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    print_outbound(&link);
}

fn print_outbound(link: &MockSerialHandle) {
    let sent = link.take_output();
    for token in String::from_utf8_lossy(&sent).split_whitespace() {
        println!("remote <- {token}");
    }
}
