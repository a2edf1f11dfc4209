//! Turns decoded tokens into commands.
//!
//! Most commands are a single token. `ENROLL` and `DELETE_SINGLE` are
//! followed by a second token carrying the target template slot; the
//! assembler holds the opcode until that argument arrives or the argument
//! timeout lapses.
//!
//! Everything that does not form a valid command is protocol noise and is
//! dropped without any reply to the remote side.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use bikelock_core::constants::{
    TOKEN_ARM, TOKEN_DELETE_ALL, TOKEN_DELETE_SINGLE, TOKEN_DISARM, TOKEN_ENROLL,
};
use bikelock_core::{Command, TemplateId};

#[derive(Debug, Clone, Copy)]
struct PendingOpcode {
    opcode: u32,
    since: Instant,
}

/// Stateful token-to-command assembler.
///
/// # Example
///
/// ```
/// use bikelock_core::{Command, TemplateId};
/// use bikelock_protocol::CommandAssembler;
/// use std::time::Duration;
/// use tokio::time::Instant;
///
/// let mut assembler = CommandAssembler::new(Duration::from_secs(5));
/// let now = Instant::now();
///
/// assert_eq!(assembler.push(205, now), None);
/// assert!(assembler.is_awaiting_argument());
/// assert_eq!(
///     assembler.push(7, now),
///     Some(Command::Enroll(TemplateId::new(7).unwrap()))
/// );
/// ```
#[derive(Debug)]
pub struct CommandAssembler {
    pending: Option<PendingOpcode>,
    argument_timeout: Duration,
}

impl CommandAssembler {
    pub fn new(argument_timeout: Duration) -> Self {
        Self {
            pending: None,
            argument_timeout,
        }
    }

    /// Whether an opcode is waiting for its template ID.
    pub fn is_awaiting_argument(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop a pending opcode whose argument did not arrive in time.
    pub fn expire(&mut self, now: Instant) {
        if let Some(pending) = self.pending
            && now.saturating_duration_since(pending.since) >= self.argument_timeout
        {
            debug!(opcode = pending.opcode, "Argument timed out, dropping command");
            self.pending = None;
        }
    }

    /// Feed one decoded token.
    ///
    /// Returns a command once one is complete.
    pub fn push(&mut self, token: u32, now: Instant) -> Option<Command> {
        self.expire(now);

        if let Some(pending) = self.pending.take() {
            return match TemplateId::from_token(token) {
                Ok(id) if pending.opcode == TOKEN_ENROLL => Some(Command::Enroll(id)),
                Ok(id) => Some(Command::DeleteOne(id)),
                Err(e) => {
                    debug!(opcode = pending.opcode, token, error = %e, "Dropping command with invalid target");
                    None
                }
            };
        }

        match token {
            TOKEN_ARM => Some(Command::Arm),
            TOKEN_DISARM => Some(Command::Disarm),
            TOKEN_DELETE_ALL => Some(Command::DeleteAll),
            TOKEN_ENROLL | TOKEN_DELETE_SINGLE => {
                self.pending = Some(PendingOpcode {
                    opcode: token,
                    since: now,
                });
                None
            }
            other => {
                debug!(token = other, "Ignoring unrecognized token");
                None
            }
        }
    }
}
