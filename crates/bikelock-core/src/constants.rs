//! Core constants for the bike lock command protocol and control loop.
//!
//! This module defines the numeric tokens exchanged with the remote
//! controller, the template ID range accepted by the fingerprint module,
//! and the default timing thresholds used when no configuration file is
//! supplied.
//!
//! # Wire Tokens
//!
//! The remote controller (typically a phone app behind a wireless serial
//! bridge) sends one ASCII decimal integer per message:
//!
//! | Token | Direction | Meaning |
//! |-------|-----------|---------|
//! | `200` | inbound   | Arm: force locked |
//! | `201` | inbound   | Disarm: force unlocked |
//! | `205` | inbound   | Enroll, target ID follows |
//! | `206` | inbound   | Delete every template |
//! | `207` | inbound   | Delete one template, target ID follows |
//! | `500` | outbound  | Tamper warning |
//! | `100` | outbound  | Delete-all acknowledged |
//!
//! # Usage
//!
//! ```
//! use bikelock_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(TOKEN_ARM, 200);
//! assert!(DEFAULT_WARN_THRESHOLD_MS < DEFAULT_ALARM_THRESHOLD_MS);
//!
//! let warn_after = Duration::from_millis(DEFAULT_WARN_THRESHOLD_MS);
//! assert_eq!(warn_after.as_secs(), 15);
//! ```

// ============================================================================
// Inbound Command Tokens
// ============================================================================

/// Force the lock into the locked state.
pub const TOKEN_ARM: u32 = 200;

/// Force the lock into the unlocked state without fingerprint authentication.
pub const TOKEN_DISARM: u32 = 201;

/// Begin enrollment; the next token carries the target template ID.
pub const TOKEN_ENROLL: u32 = 205;

/// Wipe the whole template store.
pub const TOKEN_DELETE_ALL: u32 = 206;

/// Delete one template; the next token carries the target template ID.
pub const TOKEN_DELETE_SINGLE: u32 = 207;

// ============================================================================
// Outbound Notification Tokens
// ============================================================================

/// Tamper pre-alarm notice pushed to the remote controller.
pub const TOKEN_WARNING: u32 = 500;

/// Acknowledges a completed delete-all wipe.
pub const TOKEN_DELETE_ALL_ACK: u32 = 100;

/// Terminator appended to every outbound token.
pub const TOKEN_TERMINATOR: u8 = b'\n';

/// Longest digit run accepted before the decoder discards it as noise.
///
/// `u32::MAX` has ten digits; anything longer can never be a valid token.
pub const MAX_TOKEN_DIGITS: usize = 10;

// ============================================================================
// Template Store
// ============================================================================

/// Lowest template slot addressable on the fingerprint module.
pub const MIN_TEMPLATE_ID: u16 = 1;

/// Highest template slot addressable on the fingerprint module.
pub const MAX_TEMPLATE_ID: u16 = 127;

// ============================================================================
// Timing Defaults
// ============================================================================

/// Quiet interval after which the tamper monitor emits a warning (milliseconds).
pub const DEFAULT_WARN_THRESHOLD_MS: u64 = 15_000;

/// Quiet interval after which the tamper monitor raises the alarm (milliseconds).
pub const DEFAULT_ALARM_THRESHOLD_MS: u64 = 20_000;

/// Delay between control cycles in the run loop (milliseconds).
pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 50;

/// Upper bound on one identification pass (milliseconds).
pub const DEFAULT_IDENTIFY_TIMEOUT_MS: u64 = 1_000;

/// Upper bound on a whole enrollment session (milliseconds).
pub const DEFAULT_ENROLL_TIMEOUT_MS: u64 = 30_000;

/// Delay between enrollment polls while waiting on the operator (milliseconds).
pub const DEFAULT_ENROLL_POLL_INTERVAL_MS: u64 = 100;

/// Pause after the first enrollment capture before checking finger removal (milliseconds).
pub const DEFAULT_FINGER_REMOVAL_DELAY_MS: u64 = 2_000;

/// Idle time after which a trailing unterminated digit run is flushed as a token (milliseconds).
pub const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 1_000;

/// How long an opcode waits for its target ID argument (milliseconds).
pub const DEFAULT_ARGUMENT_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Actuator Defaults
// ============================================================================

/// Servo angle holding the wheel locks engaged (degrees).
pub const DEFAULT_LOCKED_ANGLE: u8 = 0;

/// Servo angle holding the wheel locks released (degrees).
pub const DEFAULT_UNLOCKED_ANGLE: u8 = 180;

/// Largest angle a positional servo accepts (degrees).
pub const MAX_SERVO_ANGLE: u8 = 180;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_tokens_are_distinct() {
        let tokens = [
            TOKEN_ARM,
            TOKEN_DISARM,
            TOKEN_ENROLL,
            TOKEN_DELETE_ALL,
            TOKEN_DELETE_SINGLE,
        ];
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_template_range_is_not_a_command() {
        // Argument tokens must never be confused with opcodes.
        assert!(u32::from(MAX_TEMPLATE_ID) < TOKEN_ARM);
    }

    #[test]
    fn test_default_thresholds_ordered() {
        assert!(DEFAULT_WARN_THRESHOLD_MS < DEFAULT_ALARM_THRESHOLD_MS);
        assert!(DEFAULT_LOCKED_ANGLE <= MAX_SERVO_ANGLE);
        assert!(DEFAULT_UNLOCKED_ANGLE <= MAX_SERVO_ANGLE);
    }
}
