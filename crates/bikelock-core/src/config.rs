//! Lock configuration.
//!
//! All timing values are stored as whole milliseconds so configuration files
//! stay readable; [`Duration`] accessors are provided for the control code.
//! Every field has a default, so a partial file (or none at all) is valid.
//!
//! ```
//! use bikelock_core::LockConfig;
//! use std::time::Duration;
//!
//! let config = LockConfig::default();
//! assert_eq!(config.warn_threshold(), Duration::from_secs(15));
//! assert_eq!(config.alarm_threshold(), Duration::from_secs(20));
//! config.validate().unwrap();
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ALARM_THRESHOLD_MS, DEFAULT_ARGUMENT_TIMEOUT_MS, DEFAULT_CYCLE_INTERVAL_MS,
    DEFAULT_ENROLL_POLL_INTERVAL_MS, DEFAULT_ENROLL_TIMEOUT_MS, DEFAULT_FINGER_REMOVAL_DELAY_MS,
    DEFAULT_IDENTIFY_TIMEOUT_MS, DEFAULT_LOCKED_ANGLE, DEFAULT_TOKEN_TIMEOUT_MS,
    DEFAULT_UNLOCKED_ANGLE, DEFAULT_WARN_THRESHOLD_MS, MAX_SERVO_ANGLE,
};
use crate::{Error, Result};

/// Top-level configuration injected into the controller at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Quiet interval before the tamper warning fires.
    pub warn_threshold_ms: u64,

    /// Quiet interval before the tamper alarm fires and the bike relocks.
    pub alarm_threshold_ms: u64,

    /// Delay between control cycles.
    pub cycle_interval_ms: u64,

    /// Hard upper bound on one identification pass.
    pub identify_timeout_ms: u64,

    /// Hard upper bound on an enrollment session.
    pub enroll_timeout_ms: u64,

    /// Delay between enrollment polls.
    pub enroll_poll_interval_ms: u64,

    /// Pause after the first enrollment capture.
    pub finger_removal_delay_ms: u64,

    /// Idle time before a trailing digit run is flushed as a token.
    pub token_timeout_ms: u64,

    /// How long ENROLL / DELETE_SINGLE wait for their target ID.
    pub argument_timeout_ms: u64,

    pub actuator: ActuatorConfig,

    pub alert: AlertConfig,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            warn_threshold_ms: DEFAULT_WARN_THRESHOLD_MS,
            alarm_threshold_ms: DEFAULT_ALARM_THRESHOLD_MS,
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL_MS,
            identify_timeout_ms: DEFAULT_IDENTIFY_TIMEOUT_MS,
            enroll_timeout_ms: DEFAULT_ENROLL_TIMEOUT_MS,
            enroll_poll_interval_ms: DEFAULT_ENROLL_POLL_INTERVAL_MS,
            finger_removal_delay_ms: DEFAULT_FINGER_REMOVAL_DELAY_MS,
            token_timeout_ms: DEFAULT_TOKEN_TIMEOUT_MS,
            argument_timeout_ms: DEFAULT_ARGUMENT_TIMEOUT_MS,
            actuator: ActuatorConfig::default(),
            alert: AlertConfig::default(),
        }
    }
}

impl LockConfig {
    pub fn warn_threshold(&self) -> Duration {
        Duration::from_millis(self.warn_threshold_ms)
    }

    pub fn alarm_threshold(&self) -> Duration {
        Duration::from_millis(self.alarm_threshold_ms)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn identify_timeout(&self) -> Duration {
        Duration::from_millis(self.identify_timeout_ms)
    }

    pub fn enroll_timeout(&self) -> Duration {
        Duration::from_millis(self.enroll_timeout_ms)
    }

    pub fn enroll_poll_interval(&self) -> Duration {
        Duration::from_millis(self.enroll_poll_interval_ms)
    }

    pub fn finger_removal_delay(&self) -> Duration {
        Duration::from_millis(self.finger_removal_delay_ms)
    }

    pub fn token_timeout(&self) -> Duration {
        Duration::from_millis(self.token_timeout_ms)
    }

    pub fn argument_timeout(&self) -> Duration {
        Duration::from_millis(self.argument_timeout_ms)
    }

    /// Check the configuration for values the control loop cannot honor.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if:
    /// - the warning threshold is not strictly below the alarm threshold
    /// - the cycle interval, identify timeout or enroll timeout is zero
    /// - the actuator or alert sections are invalid
    pub fn validate(&self) -> Result<()> {
        if self.warn_threshold_ms >= self.alarm_threshold_ms {
            return Err(Error::Config(format!(
                "warn_threshold_ms ({}) must be below alarm_threshold_ms ({})",
                self.warn_threshold_ms, self.alarm_threshold_ms
            )));
        }
        if self.cycle_interval_ms == 0 {
            return Err(Error::Config("cycle_interval_ms must be non-zero".into()));
        }
        if self.identify_timeout_ms == 0 {
            return Err(Error::Config("identify_timeout_ms must be non-zero".into()));
        }
        if self.enroll_timeout_ms == 0 {
            return Err(Error::Config("enroll_timeout_ms must be non-zero".into()));
        }
        self.actuator.validate()?;
        self.alert.validate()
    }
}

/// How the lock actuator moves between end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuationStyle {
    /// One absolute-position command per servo.
    #[default]
    Instant,

    /// Monotonic sweep through intermediate positions.
    Animated {
        step_degrees: u8,
        step_interval_ms: u64,
    },
}

/// Servo end positions and motion style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub locked_angle: u8,
    pub unlocked_angle: u8,
    pub style: ActuationStyle,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            locked_angle: DEFAULT_LOCKED_ANGLE,
            unlocked_angle: DEFAULT_UNLOCKED_ANGLE,
            style: ActuationStyle::Instant,
        }
    }
}

impl ActuatorConfig {
    /// Target angle for the given lock intent.
    pub fn angle_for(&self, locked: bool) -> u8 {
        if locked {
            self.locked_angle
        } else {
            self.unlocked_angle
        }
    }

    fn validate(&self) -> Result<()> {
        for angle in [self.locked_angle, self.unlocked_angle] {
            if angle > MAX_SERVO_ANGLE {
                return Err(Error::Config(format!(
                    "servo angle {angle} exceeds {MAX_SERVO_ANGLE}"
                )));
            }
        }
        if self.locked_angle == self.unlocked_angle {
            return Err(Error::Config(
                "locked_angle and unlocked_angle must differ".into(),
            ));
        }
        if let ActuationStyle::Animated { step_degrees, .. } = self.style
            && step_degrees == 0
        {
            return Err(Error::Config("animated step_degrees must be non-zero".into()));
        }
        Ok(())
    }
}

/// One bounded buzzer pattern: `on_ms` sounding, `off_ms` silent, repeated
/// until `duration_ms` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerPattern {
    pub on_ms: u64,
    pub off_ms: u64,
    pub duration_ms: u64,
}

impl BuzzerPattern {
    /// Short alternating bursts for a touched locked bike.
    pub const ATTRACT: BuzzerPattern = BuzzerPattern {
        on_ms: 200,
        off_ms: 200,
        duration_ms: 1_000,
    };

    /// Faster pulses played before the tamper relock.
    pub const ALARM: BuzzerPattern = BuzzerPattern {
        on_ms: 100,
        off_ms: 100,
        duration_ms: 2_000,
    };

    pub fn on(&self) -> Duration {
        Duration::from_millis(self.on_ms)
    }

    pub fn off(&self) -> Duration {
        Duration::from_millis(self.off_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.duration_ms == 0 || self.on_ms == 0 {
            return Err(Error::Config(format!(
                "{name} pattern needs non-zero on_ms and duration_ms"
            )));
        }
        Ok(())
    }
}

/// Buzzer patterns and output polarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub attract: BuzzerPattern,
    pub alarm: BuzzerPattern,

    /// Buzzer sounds when its pin is driven low.
    pub buzzer_active_low: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            attract: BuzzerPattern::ATTRACT,
            alarm: BuzzerPattern::ALARM,
            buzzer_active_low: true,
        }
    }
}

impl AlertConfig {
    fn validate(&self) -> Result<()> {
        self.attract.validate("attract")?;
        self.alarm.validate("alarm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LockConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.actuator.angle_for(true), 0);
        assert_eq!(config.actuator.angle_for(false), 180);
    }

    #[test]
    fn test_warn_must_precede_alarm() {
        let config = LockConfig {
            warn_threshold_ms: 20_000,
            alarm_threshold_ms: 20_000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_cycle_interval_rejected() {
        let config = LockConfig {
            cycle_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_actuator_rejected() {
        let mut config = LockConfig::default();
        config.actuator.unlocked_angle = 200;
        assert!(config.validate().is_err());

        let mut config = LockConfig::default();
        config.actuator.style = ActuationStyle::Animated {
            step_degrees: 0,
            step_interval_ms: 15,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pattern_rejected() {
        let mut config = LockConfig::default();
        config.alert.alarm.duration_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LockConfig =
            serde_json::from_str(r#"{ "warn_threshold_ms": 5000, "alarm_threshold_ms": 8000 }"#)
                .unwrap();
        assert_eq!(config.warn_threshold(), Duration::from_secs(5));
        assert_eq!(config.alarm_threshold(), Duration::from_secs(8));
        assert_eq!(config.cycle_interval_ms, DEFAULT_CYCLE_INTERVAL_MS);
        assert!(config.alert.buzzer_active_low);
    }

    #[test]
    fn test_animated_style_from_json() {
        let config: LockConfig = serde_json::from_str(
            r#"{ "actuator": { "style": { "kind": "animated", "step_degrees": 5, "step_interval_ms": 15 } } }"#,
        )
        .unwrap();
        assert_eq!(
            config.actuator.style,
            ActuationStyle::Animated {
                step_degrees: 5,
                step_interval_ms: 15
            }
        );
        assert_eq!(config.actuator.locked_angle, DEFAULT_LOCKED_ANGLE);
    }
}
