//! Mock serial link to the remote controller.
//!
//! Bytes pushed through the handle become readable by the device; bytes
//! the device writes are captured for inspection.

use crate::{HardwareError, Result, mock::lock_state, traits::ByteTransport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct SerialState {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    disconnected: bool,
}

/// Mock serial link.
///
/// # Examples
///
/// ```
/// use bikelock_hardware::mock::MockSerial;
/// use bikelock_hardware::traits::ByteTransport;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> bikelock_hardware::Result<()> {
///     let (mut link, handle) = MockSerial::new();
///     handle.send(b"200\n");
///
///     let mut buf = [0u8; 16];
///     let n = link.try_read(&mut buf).await?;
///     assert_eq!(&buf[..n], b"200\n");
///
///     link.write_all(b"500\n").await?;
///     assert_eq!(handle.take_output(), b"500\n");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSerial {
    state: Arc<Mutex<SerialState>>,
}

impl MockSerial {
    /// Create a new link and its control handle.
    pub fn new() -> (Self, MockSerialHandle) {
        let state = Arc::new(Mutex::new(SerialState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockSerialHandle { state },
        )
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new().0
    }
}

impl ByteTransport for MockSerial {
    async fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = lock_state(&self.state);
        if state.disconnected {
            return Err(HardwareError::disconnected("Mock serial link"));
        }
        let n = buf.len().min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut state = lock_state(&self.state);
        if state.disconnected {
            return Err(HardwareError::disconnected("Mock serial link"));
        }
        state.outbound.extend_from_slice(data);
        Ok(())
    }
}

/// Handle for driving a mock serial link.
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    state: Arc<Mutex<SerialState>>,
}

impl MockSerialHandle {
    /// Make bytes available to the device.
    pub fn send(&self, bytes: &[u8]) {
        lock_state(&self.state).inbound.extend(bytes.iter().copied());
    }

    /// Take everything the device has written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut lock_state(&self.state).outbound)
    }

    /// Number of inbound bytes not yet read by the device.
    pub fn pending_input(&self) -> usize {
        lock_state(&self.state).inbound.len()
    }

    /// Simulate the wireless bridge dropping (or restoring) the link.
    pub fn set_disconnected(&self, disconnected: bool) {
        lock_state(&self.state).disconnected = disconnected;
    }
}
