//! Lock actuator driving the front and rear wheel locks.
//!
//! Both servos always receive the same angle. The actuator remembers the
//! last angle both servos accepted; a request for the position they are
//! already in issues no motion at all. After a fault the position is
//! unknown and the next request is always sent.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use bikelock_core::{ActuationStyle, ActuatorConfig, ActuatorIntent};
use bikelock_hardware::{Result, ServoDriver};

/// Two synchronized servos behind a single lock/unlock intent.
#[derive(Debug)]
pub struct LockActuator<V> {
    front: V,
    rear: V,
    config: ActuatorConfig,
    position: Option<u8>,
}

impl<V: ServoDriver> LockActuator<V> {
    pub fn new(front: V, rear: V, config: ActuatorConfig) -> Self {
        Self {
            front,
            rear,
            config,
            position: None,
        }
    }

    /// Drive both wheel locks to the locked or unlocked end position.
    ///
    /// # Errors
    ///
    /// Returns the first servo error. The position is then treated as
    /// unknown.
    pub async fn set_locked(&mut self, locked: bool) -> Result<()> {
        let target = self.config.angle_for(locked);
        if self.position == Some(target) {
            debug!(angle = target, "Actuator already in position");
            return Ok(());
        }

        let result = match self.config.style {
            ActuationStyle::Instant => self.write_both(target).await,
            ActuationStyle::Animated {
                step_degrees,
                step_interval_ms,
            } => {
                let from = self
                    .position
                    .unwrap_or_else(|| self.config.angle_for(!locked));
                self.sweep(from, target, step_degrees, Duration::from_millis(step_interval_ms))
                    .await
            }
        };

        match result {
            Ok(()) => {
                self.position = Some(target);
                info!(intent = ?ActuatorIntent::from_locked(locked), angle = target, "Actuator moved");
                Ok(())
            }
            Err(e) => {
                self.position = None;
                Err(e)
            }
        }
    }

    /// Last intent both servos completed, if known.
    pub fn intent(&self) -> Option<ActuatorIntent> {
        let position = self.position?;
        if position == self.config.locked_angle {
            Some(ActuatorIntent::Locked)
        } else if position == self.config.unlocked_angle {
            Some(ActuatorIntent::Unlocked)
        } else {
            None
        }
    }

    /// Last angle both servos accepted, if known.
    pub fn position(&self) -> Option<u8> {
        self.position
    }

    async fn write_both(&mut self, angle: u8) -> Result<()> {
        self.front.write_angle(angle).await?;
        self.rear.write_angle(angle).await
    }

    async fn sweep(&mut self, from: u8, to: u8, step: u8, interval: Duration) -> Result<()> {
        for angle in sweep_positions(from, to, step) {
            self.write_both(angle).await?;
            if angle != to {
                sleep(interval).await;
            }
        }
        Ok(())
    }
}

/// Intermediate positions from `from` (exclusive) to `to` (inclusive).
///
/// Monotonic in the direction of travel; the last element is always `to`.
pub fn sweep_positions(from: u8, to: u8, step: u8) -> Vec<u8> {
    let step = step.max(1);
    let mut positions = Vec::new();
    let mut angle = from;
    while angle != to {
        angle = if to > angle {
            angle.saturating_add(step).min(to)
        } else {
            angle.saturating_sub(step).max(to)
        };
        positions.push(angle);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikelock_hardware::mock::{MockServo, MockServoHandle};
    use rstest::rstest;

    fn actuator(style: ActuationStyle) -> (LockActuator<MockServo>, MockServoHandle, MockServoHandle) {
        let (front, front_handle) = MockServo::new();
        let (rear, rear_handle) = MockServo::new();
        let config = ActuatorConfig {
            style,
            ..Default::default()
        };
        (LockActuator::new(front, rear, config), front_handle, rear_handle)
    }

    #[rstest]
    #[case(0, 180, 45, vec![45, 90, 135, 180])]
    #[case(180, 0, 60, vec![120, 60, 0])]
    #[case(0, 100, 30, vec![30, 60, 90, 100])]
    #[case(90, 90, 10, vec![])]
    #[case(170, 180, 0, vec![171, 172, 173, 174, 175, 176, 177, 178, 179, 180])]
    fn test_sweep_positions(
        #[case] from: u8,
        #[case] to: u8,
        #[case] step: u8,
        #[case] expected: Vec<u8>,
    ) {
        assert_eq!(sweep_positions(from, to, step), expected);
    }

    #[tokio::test]
    async fn test_instant_moves_both_servos() {
        let (mut actuator, front, rear) = actuator(ActuationStyle::Instant);

        actuator.set_locked(false).await.unwrap();
        assert_eq!(front.position(), Some(180));
        assert_eq!(rear.position(), Some(180));
        assert_eq!(actuator.intent(), Some(ActuatorIntent::Unlocked));

        actuator.set_locked(true).await.unwrap();
        assert_eq!(front.history(), vec![180, 0]);
        assert_eq!(rear.history(), vec![180, 0]);
        assert_eq!(actuator.intent(), Some(ActuatorIntent::Locked));
    }

    #[tokio::test]
    async fn test_repeated_lock_is_idempotent() {
        let (mut actuator, front, _rear) = actuator(ActuationStyle::Instant);

        actuator.set_locked(true).await.unwrap();
        let once = front.position();
        actuator.set_locked(true).await.unwrap();

        assert_eq!(front.position(), once);
        assert_eq!(front.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animated_sweep_is_monotonic() {
        let style = ActuationStyle::Animated {
            step_degrees: 20,
            step_interval_ms: 15,
        };
        let (mut actuator, front, rear) = actuator(style);

        actuator.set_locked(false).await.unwrap();
        let history = front.history();
        assert_eq!(history.last(), Some(&180));
        assert!(history.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(history, rear.history());

        actuator.set_locked(true).await.unwrap();
        let back: Vec<u8> = front.history().split_off(history.len());
        assert_eq!(back.last(), Some(&0));
        assert!(back.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[tokio::test]
    async fn test_fault_forgets_position() {
        let (mut actuator, front, rear) = actuator(ActuationStyle::Instant);
        actuator.set_locked(true).await.unwrap();

        rear.set_fault(true);
        assert!(actuator.set_locked(false).await.is_err());
        assert_eq!(actuator.position(), None);
        assert_eq!(actuator.intent(), None);

        // With the position unknown, locking again is re-sent.
        rear.set_fault(false);
        actuator.set_locked(true).await.unwrap();
        assert_eq!(front.history(), vec![0, 180, 0]);
        assert_eq!(rear.position(), Some(0));
    }
}
