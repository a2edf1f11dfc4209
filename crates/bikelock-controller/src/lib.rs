//! Bike lock control state machine.
//!
//! This crate ties the collaborators together: the [`tamper`] monitor, the
//! [`state_machine`] that owns the lock state, and the [`controller`] that
//! runs one cooperative pass over every device per cycle.

pub mod controller;
pub mod state_machine;
pub mod tamper;

pub use controller::{CycleReport, LockController, OperatorOutcome, Peripherals};
pub use state_machine::{LockStateMachine, MAX_HISTORY_SIZE, StateTransition, TransitionCause};
pub use tamper::{TamperEvent, TamperMonitor, TamperWindow};
