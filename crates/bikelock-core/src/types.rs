use crate::{
    Result,
    constants::{
        MAX_TEMPLATE_ID, MIN_TEMPLATE_ID, TOKEN_ARM, TOKEN_DELETE_ALL, TOKEN_DELETE_ALL_ACK,
        TOKEN_DELETE_SINGLE, TOKEN_DISARM, TOKEN_ENROLL, TOKEN_WARNING,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fingerprint template slot on the sensor module (1-127).
///
/// The core never sees template bytes; a match is reported only as the
/// slot it was stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u16);

impl TemplateId {
    /// Create a new template ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplateId` if the ID is outside the slot range (1-127).
    pub fn new(id: u16) -> Result<Self> {
        if !(MIN_TEMPLATE_ID..=MAX_TEMPLATE_ID).contains(&id) {
            return Err(Error::InvalidTemplateId(format!(
                "Template ID must be {MIN_TEMPLATE_ID}-{MAX_TEMPLATE_ID}, got {id}"
            )));
        }
        Ok(TemplateId(id))
    }

    /// Create a template ID from a decoded wire token.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplateId` if the token does not name a valid slot.
    pub fn from_token(token: u32) -> Result<Self> {
        let id = u16::try_from(token)
            .map_err(|_| Error::InvalidTemplateId(format!("Token {token} out of range")))?;
        TemplateId::new(id)
    }

    /// Get the raw slot number.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for TemplateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u16 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTemplateId(format!("Invalid template ID: {s}")))?;
        TemplateId::new(id)
    }
}

/// Lock state owned by the control state machine.
///
/// - `Locked`: initial and fail-safe state; wheels held, tamper monitor inert.
/// - `Unlocked`: rider authenticated; tamper monitor accumulating.
/// - `Alerting`: alarm pattern playing; always resolves back to `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
    Alerting,
}

impl LockState {
    /// Check if this state holds the wheels locked.
    #[inline]
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }

    /// Check if the tamper monitor should be accumulating in this state.
    #[inline]
    #[must_use]
    pub fn is_monitoring(self) -> bool {
        !self.is_locked()
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LockState::Locked => "Locked",
            LockState::Unlocked => "Unlocked",
            LockState::Alerting => "Alerting",
        };
        write!(f, "{s}")
    }
}

/// Command decoded from the remote controller.
///
/// At most one command is acted on per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Force `Locked` regardless of the current state.
    Arm,
    /// Force `Unlocked` without a fingerprint match.
    Disarm,
    /// Enroll a new template into the given slot.
    Enroll(TemplateId),
    /// Delete the template in the given slot.
    DeleteOne(TemplateId),
    /// Wipe every template.
    DeleteAll,
}

impl Command {
    /// Wire token that introduces this command.
    #[must_use]
    pub fn opcode(&self) -> u32 {
        match self {
            Command::Arm => TOKEN_ARM,
            Command::Disarm => TOKEN_DISARM,
            Command::Enroll(_) => TOKEN_ENROLL,
            Command::DeleteOne(_) => TOKEN_DELETE_SINGLE,
            Command::DeleteAll => TOKEN_DELETE_ALL,
        }
    }

    /// Target template slot, for commands that carry one.
    #[must_use]
    pub fn target(&self) -> Option<TemplateId> {
        match self {
            Command::Enroll(id) | Command::DeleteOne(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether the command forces the lock state directly.
    #[inline]
    #[must_use]
    pub fn is_override(&self) -> bool {
        matches!(self, Command::Arm | Command::Disarm)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Arm => write!(f, "Arm"),
            Command::Disarm => write!(f, "Disarm"),
            Command::Enroll(id) => write!(f, "Enroll({id})"),
            Command::DeleteOne(id) => write!(f, "DeleteOne({id})"),
            Command::DeleteAll => write!(f, "DeleteAll"),
        }
    }
}

/// Status pushed from the lock back to the remote controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// Tamper pre-alarm: the unlocked bike has been left undisturbed too long.
    TamperWarning,
    /// The template store has been wiped.
    DeleteAllAck,
}

impl Notification {
    /// Wire token for this notification.
    #[must_use]
    pub fn token(self) -> u32 {
        match self {
            Notification::TamperWarning => TOKEN_WARNING,
            Notification::DeleteAllAck => TOKEN_DELETE_ALL_ACK,
        }
    }
}

/// Logical lock intent handed to the lock actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorIntent {
    Locked,
    Unlocked,
}

impl ActuatorIntent {
    /// Intent matching a `set_locked(locked)` call.
    #[inline]
    #[must_use]
    pub fn from_locked(locked: bool) -> Self {
        if locked {
            ActuatorIntent::Locked
        } else {
            ActuatorIntent::Unlocked
        }
    }

    #[inline]
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, ActuatorIntent::Locked)
    }
}

/// Result of one identification pass.
///
/// Absence of a match is reported identically whatever its cause (no
/// finger, smudged image, sensor fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Matched(TemplateId),
    NoMatch,
}

impl MatchResult {
    #[must_use]
    pub fn matched_id(self) -> Option<TemplateId> {
        match self {
            MatchResult::Matched(id) => Some(id),
            MatchResult::NoMatch => None,
        }
    }
}

/// Why an enrollment session was aborted.
///
/// The template store is unchanged after any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentFailure {
    /// A capture could not be turned into usable features.
    ImageQuality,
    /// The two captures were not the same finger.
    Mismatch,
    /// The sensor could not commit the template to flash.
    StorageFault,
    /// Communication with the sensor failed.
    CommFault,
    /// The operator did not complete the session in time.
    TimedOut,
}

impl fmt::Display for EnrollmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnrollmentFailure::ImageQuality => "image quality too poor",
            EnrollmentFailure::Mismatch => "fingerprints did not match",
            EnrollmentFailure::StorageFault => "could not store template",
            EnrollmentFailure::CommFault => "sensor communication error",
            EnrollmentFailure::TimedOut => "enrollment timed out",
        };
        write!(f, "{s}")
    }
}

/// Why a delete or wipe did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailure {
    /// No template stored in that slot.
    NotFound,
    /// The sensor reported a flash or location error.
    StorageFault,
    /// Communication with the sensor failed.
    CommFault,
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreFailure::NotFound => "template not found",
            StoreFailure::StorageFault => "template store error",
            StoreFailure::CommFault => "sensor communication error",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case("7", 7)]
    #[case(" 127 ", 127)]
    fn test_template_id_valid(#[case] input: &str, #[case] expected: u16) {
        let id: TemplateId = input.parse().unwrap();
        assert_eq!(id.as_u16(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("128")]
    #[case("abc")]
    #[case("")]
    fn test_template_id_invalid(#[case] input: &str) {
        let result: Result<TemplateId> = input.parse();
        assert!(result.is_err());
    }

    #[rstest]
    #[case(7, true)]
    #[case(0, false)]
    #[case(70_000, false)]
    fn test_template_id_from_token(#[case] token: u32, #[case] valid: bool) {
        assert_eq!(TemplateId::from_token(token).is_ok(), valid);
    }

    #[test]
    fn test_lock_state_defaults_to_locked() {
        assert_eq!(LockState::default(), LockState::Locked);
        assert!(LockState::Locked.is_locked());
        assert!(LockState::Unlocked.is_monitoring());
        assert!(LockState::Alerting.is_monitoring());
    }

    #[test]
    fn test_command_opcodes() {
        let id = TemplateId::new(3).unwrap();
        assert_eq!(Command::Arm.opcode(), TOKEN_ARM);
        assert_eq!(Command::Disarm.opcode(), TOKEN_DISARM);
        assert_eq!(Command::Enroll(id).opcode(), TOKEN_ENROLL);
        assert_eq!(Command::DeleteOne(id).opcode(), TOKEN_DELETE_SINGLE);
        assert_eq!(Command::DeleteAll.opcode(), TOKEN_DELETE_ALL);

        assert_eq!(Command::Enroll(id).target(), Some(id));
        assert_eq!(Command::DeleteAll.target(), None);
        assert!(Command::Arm.is_override());
        assert!(!Command::DeleteAll.is_override());
    }

    #[test]
    fn test_command_display() {
        let id = TemplateId::new(12).unwrap();
        assert_eq!(Command::Enroll(id).to_string(), "Enroll(#12)");
        assert_eq!(Command::Arm.to_string(), "Arm");
    }

    #[test]
    fn test_notification_tokens() {
        assert_eq!(Notification::TamperWarning.token(), TOKEN_WARNING);
        assert_eq!(Notification::DeleteAllAck.token(), TOKEN_DELETE_ALL_ACK);
    }

    #[test]
    fn test_actuator_intent() {
        assert_eq!(ActuatorIntent::from_locked(true), ActuatorIntent::Locked);
        assert_eq!(ActuatorIntent::from_locked(false), ActuatorIntent::Unlocked);
        assert!(ActuatorIntent::Locked.is_locked());
    }

    #[test]
    fn test_match_result() {
        let id = TemplateId::new(7).unwrap();
        assert_eq!(MatchResult::Matched(id).matched_id(), Some(id));
        assert_eq!(MatchResult::NoMatch.matched_id(), None);
    }

    #[test]
    fn test_lock_state_serialization() {
        let json = serde_json::to_string(&LockState::Alerting).unwrap();
        assert_eq!(json, "\"alerting\"");
    }
}
