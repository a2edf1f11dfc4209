//! Remote command protocol for the bike lock.
//!
//! Three layers, bottom-up:
//!
//! - [`TokenCodec`]: tokio-util codec between raw bytes and decimal tokens.
//! - [`CommandAssembler`]: groups tokens into [`Command`](bikelock_core::Command)s.
//! - [`RemoteChannel`]: non-blocking per-cycle poll over a byte transport,
//!   plus outbound notifications.

pub mod assembler;
pub mod channel;
pub mod codec;

pub use assembler::CommandAssembler;
pub use channel::RemoteChannel;
pub use codec::TokenCodec;
