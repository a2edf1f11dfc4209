//! Two-capture enrollment as a resumable state machine.
//!
//! The fingerprint module needs two images of the same finger with the
//! finger lifted in between. Instead of blocking on each capture, an
//! [`EnrollmentSession`] advances one sensor interaction per
//! [`step`](EnrollmentSession::step) and tells the caller how long to wait
//! before stepping again.
//!
//! ```text
//! AwaitFirstCapture --finger--> AwaitRemoval --lifted--> AwaitSecondCapture --finger--> Commit
//!        |                          |                            |                        |
//!        +--------------------------+---- deadline passed -------+------------------------+--> TimedOut
//! ```
//!
//! The template store is only written in `Commit`, so any abort leaves it
//! untouched.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use bikelock_core::{EnrollmentFailure, LockConfig, TemplateId};
use bikelock_hardware::{FeatureSlot, FingerprintSensor, SensorCode};

use crate::outcome::{
    CaptureFault, EnrollOutcome, capture_fault, commit_failure, extraction_failure, model_failure,
};

/// Phase of an enrollment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentPhase {
    /// Waiting for the first image.
    AwaitFirstCapture,
    /// Waiting for the operator to lift the finger.
    AwaitRemoval,
    /// Waiting for the second image.
    AwaitSecondCapture,
    /// Merging both captures and writing the template.
    Commit,
}

impl fmt::Display for EnrollmentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnrollmentPhase::AwaitFirstCapture => "await-first-capture",
            EnrollmentPhase::AwaitRemoval => "await-removal",
            EnrollmentPhase::AwaitSecondCapture => "await-second-capture",
            EnrollmentPhase::Commit => "commit",
        };
        write!(f, "{s}")
    }
}

/// Result of one [`EnrollmentSession::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollStep {
    /// Step again after the given delay.
    Continue(Duration),
    /// The session is over.
    Finished(EnrollOutcome),
}

/// Timing of an enrollment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentTiming {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub removal_delay: Duration,
}

impl From<&LockConfig> for EnrollmentTiming {
    fn from(config: &LockConfig) -> Self {
        Self {
            timeout: config.enroll_timeout(),
            poll_interval: config.enroll_poll_interval(),
            removal_delay: config.finger_removal_delay(),
        }
    }
}

/// One in-progress enrollment into a template slot.
#[derive(Debug)]
pub struct EnrollmentSession {
    target: TemplateId,
    phase: EnrollmentPhase,
    deadline: Instant,
    removal_check_at: Instant,
    timing: EnrollmentTiming,
}

impl EnrollmentSession {
    pub fn new(target: TemplateId, timing: EnrollmentTiming, now: Instant) -> Self {
        Self {
            target,
            phase: EnrollmentPhase::AwaitFirstCapture,
            deadline: now + timing.timeout,
            removal_check_at: now,
            timing,
        }
    }

    pub fn target(&self) -> TemplateId {
        self.target
    }

    pub fn phase(&self) -> EnrollmentPhase {
        self.phase
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Perform at most one phase's worth of sensor work.
    pub async fn step<S: FingerprintSensor>(
        &mut self,
        sensor: &mut S,
        now: Instant,
    ) -> EnrollStep {
        if now >= self.deadline {
            debug!(target_id = %self.target, phase = %self.phase, "Enrollment deadline passed");
            return EnrollStep::Finished(Err(EnrollmentFailure::TimedOut));
        }

        let step = match self.phase {
            EnrollmentPhase::AwaitFirstCapture => {
                self.capture_into(sensor, FeatureSlot::One, now).await
            }
            EnrollmentPhase::AwaitRemoval => self.check_removal(sensor, now).await,
            EnrollmentPhase::AwaitSecondCapture => {
                self.capture_into(sensor, FeatureSlot::Two, now).await
            }
            EnrollmentPhase::Commit => self.commit(sensor).await,
        };

        match step {
            EnrollStep::Continue(wait) => {
                EnrollStep::Continue(wait.min(self.deadline.saturating_duration_since(now)))
            }
            finished => finished,
        }
    }

    async fn capture_into<S: FingerprintSensor>(
        &mut self,
        sensor: &mut S,
        slot: FeatureSlot,
        now: Instant,
    ) -> EnrollStep {
        if let Err(e) = sensor.capture_image().await {
            return match capture_fault(&e) {
                CaptureFault::Retry => EnrollStep::Continue(self.timing.poll_interval),
                CaptureFault::Abort(failure) => EnrollStep::Finished(Err(failure)),
            };
        }
        if let Err(e) = sensor.extract_features(slot).await {
            debug!(error = %e, ?slot, "Feature extraction failed");
            return EnrollStep::Finished(Err(extraction_failure(&e)));
        }

        match slot {
            FeatureSlot::One => {
                info!(target_id = %self.target, "First image taken, remove finger");
                self.phase = EnrollmentPhase::AwaitRemoval;
                self.removal_check_at = now + self.timing.removal_delay;
                EnrollStep::Continue(self.timing.removal_delay)
            }
            FeatureSlot::Two => {
                self.phase = EnrollmentPhase::Commit;
                EnrollStep::Continue(Duration::ZERO)
            }
        }
    }

    async fn check_removal<S: FingerprintSensor>(
        &mut self,
        sensor: &mut S,
        now: Instant,
    ) -> EnrollStep {
        if now < self.removal_check_at {
            return EnrollStep::Continue(self.removal_check_at - now);
        }
        match sensor.capture_image().await {
            // Finger still on the window.
            Ok(()) => EnrollStep::Continue(self.timing.poll_interval),
            Err(e) if e.sensor_code() == Some(SensorCode::NoFinger) => {
                info!(target_id = %self.target, "Place same finger again");
                self.phase = EnrollmentPhase::AwaitSecondCapture;
                EnrollStep::Continue(self.timing.poll_interval)
            }
            Err(e) => match capture_fault(&e) {
                CaptureFault::Retry => EnrollStep::Continue(self.timing.poll_interval),
                CaptureFault::Abort(failure) => EnrollStep::Finished(Err(failure)),
            },
        }
    }

    async fn commit<S: FingerprintSensor>(&mut self, sensor: &mut S) -> EnrollStep {
        if let Err(e) = sensor.create_model().await {
            debug!(error = %e, "Model creation failed");
            return EnrollStep::Finished(Err(model_failure(&e)));
        }
        if let Err(e) = sensor.store_model(self.target).await {
            debug!(error = %e, "Template store failed");
            return EnrollStep::Finished(Err(commit_failure(&e)));
        }
        EnrollStep::Finished(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikelock_hardware::mock::{Capture, MockFingerprint};

    fn timing() -> EnrollmentTiming {
        EnrollmentTiming::from(&LockConfig::default())
    }

    fn slot(n: u16) -> TemplateId {
        TemplateId::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_phases_advance_in_order() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.queue_enrollment(1, 1);
        let start = Instant::now();
        let mut session = EnrollmentSession::new(slot(3), timing(), start);

        assert_eq!(session.phase(), EnrollmentPhase::AwaitFirstCapture);
        assert_eq!(
            session.step(&mut sensor, start).await,
            EnrollStep::Continue(Duration::from_secs(2))
        );
        assert_eq!(session.phase(), EnrollmentPhase::AwaitRemoval);

        // Too early: the removal delay has not elapsed, no capture is spent.
        let taken = handle.captures_taken();
        let early = start + Duration::from_secs(1);
        assert_eq!(
            session.step(&mut sensor, early).await,
            EnrollStep::Continue(Duration::from_secs(1))
        );
        assert_eq!(handle.captures_taken(), taken);

        let after_delay = start + Duration::from_secs(2);
        session.step(&mut sensor, after_delay).await;
        assert_eq!(session.phase(), EnrollmentPhase::AwaitSecondCapture);

        session.step(&mut sensor, after_delay).await;
        assert_eq!(session.phase(), EnrollmentPhase::Commit);

        assert_eq!(
            session.step(&mut sensor, after_delay).await,
            EnrollStep::Finished(Ok(()))
        );
        assert_eq!(handle.template_finger(slot(3)), Some(1));
    }

    #[tokio::test]
    async fn test_waits_while_finger_not_lifted() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.present_finger(4);
        handle.present_finger(4);
        handle.present_finger(4);
        let start = Instant::now();
        let mut session = EnrollmentSession::new(slot(1), timing(), start);

        session.step(&mut sensor, start).await;
        let later = start + Duration::from_secs(3);
        session.step(&mut sensor, later).await;
        session.step(&mut sensor, later).await;
        assert_eq!(session.phase(), EnrollmentPhase::AwaitRemoval);

        // Queue empty: the window reads empty.
        session.step(&mut sensor, later).await;
        assert_eq!(session.phase(), EnrollmentPhase::AwaitSecondCapture);
    }

    #[tokio::test]
    async fn test_no_finger_is_retried() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.queue_capture(Capture::NoFinger);
        handle.queue_capture(Capture::ImageFail);
        let start = Instant::now();
        let mut session = EnrollmentSession::new(slot(1), timing(), start);

        for _ in 0..2 {
            assert_eq!(
                session.step(&mut sensor, start).await,
                EnrollStep::Continue(Duration::from_millis(100))
            );
            assert_eq!(session.phase(), EnrollmentPhase::AwaitFirstCapture);
        }
    }

    #[tokio::test]
    async fn test_smudged_capture_aborts_with_image_quality() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.queue_capture(Capture::Smudged);
        let start = Instant::now();
        let mut session = EnrollmentSession::new(slot(1), timing(), start);

        assert_eq!(
            session.step(&mut sensor, start).await,
            EnrollStep::Finished(Err(EnrollmentFailure::ImageQuality))
        );
    }

    #[tokio::test]
    async fn test_comm_fault_aborts() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.queue_capture(Capture::CommFault);
        let start = Instant::now();
        let mut session = EnrollmentSession::new(slot(1), timing(), start);

        assert_eq!(
            session.step(&mut sensor, start).await,
            EnrollStep::Finished(Err(EnrollmentFailure::CommFault))
        );
    }

    #[tokio::test]
    async fn test_deadline_bounds_session() {
        let (mut sensor, _handle) = MockFingerprint::new();
        let start = Instant::now();
        let timing = EnrollmentTiming {
            timeout: Duration::from_millis(250),
            ..timing()
        };
        let mut session = EnrollmentSession::new(slot(1), timing, start);

        assert_eq!(
            session.step(&mut sensor, start + Duration::from_millis(200)).await,
            EnrollStep::Continue(Duration::from_millis(50))
        );
        assert_eq!(
            session.step(&mut sensor, start + Duration::from_millis(250)).await,
            EnrollStep::Finished(Err(EnrollmentFailure::TimedOut))
        );
    }
}
