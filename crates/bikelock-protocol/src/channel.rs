//! Remote command channel.
//!
//! [`RemoteChannel`] owns the byte transport to the remote controller. Each
//! control cycle calls [`RemoteChannel::poll`], which drains whatever bytes
//! have arrived, decodes them and hands back at most one command. There is
//! no queue between cycles: when a burst carries several complete commands
//! only the last one is delivered.
//!
//! Transport faults are logged and reported as "no command"; the channel
//! never stops the control loop.

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::Instant;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, info, warn};

use bikelock_core::{Command, LockConfig, Notification};
use bikelock_hardware::{ByteTransport, HardwareError, Result};

use crate::{CommandAssembler, TokenCodec};

/// Bytes read from the transport per `try_read` call.
const READ_CHUNK: usize = 64;

/// Initial capacity for the receive buffer.
const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Command channel over a [`ByteTransport`].
#[derive(Debug)]
pub struct RemoteChannel<T> {
    transport: T,
    codec: TokenCodec,
    assembler: CommandAssembler,
    rx: BytesMut,
    tx: BytesMut,
    last_byte_at: Option<Instant>,
    token_timeout: Duration,
}

impl<T: ByteTransport> RemoteChannel<T> {
    /// Create a channel using the token and argument timeouts from `config`.
    pub fn new(transport: T, config: &LockConfig) -> Self {
        Self {
            transport,
            codec: TokenCodec::new(),
            assembler: CommandAssembler::new(config.argument_timeout()),
            rx: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            tx: BytesMut::new(),
            last_byte_at: None,
            token_timeout: config.token_timeout(),
        }
    }

    /// Poll for at most one command without waiting for data.
    pub async fn poll(&mut self, now: Instant) -> Option<Command> {
        self.fill(now).await;

        let mut latest = None;
        loop {
            match self.codec.decode(&mut self.rx) {
                Ok(Some(token)) => {
                    if let Some(command) = self.assembler.push(token, now) {
                        latest = Some(command);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Discarding undecodable input");
                    self.rx.clear();
                    break;
                }
            }
        }

        if self.trailing_run_expired(now) {
            match self.codec.decode_eof(&mut self.rx) {
                Ok(Some(token)) => {
                    if let Some(command) = self.assembler.push(token, now) {
                        latest = Some(command);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Discarding trailing input"),
            }
        }

        self.assembler.expire(now);

        if let Some(command) = latest {
            debug!(%command, "Remote command received");
        }
        latest
    }

    /// Send a status notification to the remote controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be encoded or the
    /// transport rejected the write.
    pub async fn notify(&mut self, notification: Notification) -> Result<()> {
        self.tx.clear();
        self.codec
            .encode(notification, &mut self.tx)
            .map_err(|e| HardwareError::invalid_data(e.to_string()))?;
        self.transport.write_all(&self.tx).await?;
        info!(?notification, token = notification.token(), "Notification sent");
        Ok(())
    }

    /// Whether an `ENROLL` or `DELETE_SINGLE` opcode is waiting for its ID.
    pub fn is_awaiting_argument(&self) -> bool {
        self.assembler.is_awaiting_argument()
    }

    async fn fill(&mut self, now: Instant) {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.try_read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    self.last_byte_at = Some(now);
                }
                Err(e) => {
                    warn!(error = %e, "Command transport read failed");
                    break;
                }
            }
        }
    }

    fn trailing_run_expired(&self, now: Instant) -> bool {
        if self.rx.is_empty() {
            return false;
        }
        self.last_byte_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.token_timeout)
    }
}
