//! Biometric authenticator.
//!
//! Wraps a [`FingerprintSensor`] and exposes the four operations the lock
//! controller needs, each with a normalized outcome and a hard time bound.

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, trace, warn};

use bikelock_core::{EnrollmentFailure, LockConfig, MatchResult, TemplateId};
use bikelock_hardware::{FeatureSlot, FingerprintSensor, HardwareError, SensorCode};

use crate::enrollment::{EnrollStep, EnrollmentSession, EnrollmentTiming};
use crate::outcome::{EnrollOutcome, StoreOutcome, store_failure};

/// Fingerprint authenticator over a sensor module.
///
/// # Example
///
/// ```
/// use bikelock_biometric::Authenticator;
/// use bikelock_core::{LockConfig, MatchResult, TemplateId};
/// use bikelock_hardware::mock::MockFingerprint;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let (sensor, handle) = MockFingerprint::new();
///     let slot = TemplateId::new(7).unwrap();
///     handle.add_template(slot, 42);
///
///     let mut auth = Authenticator::new(sensor, &LockConfig::default());
///     assert_eq!(auth.identify().await, MatchResult::NoMatch);
///
///     handle.present_finger(42);
///     assert_eq!(auth.identify().await, MatchResult::Matched(slot));
/// }
/// ```
#[derive(Debug)]
pub struct Authenticator<S> {
    sensor: S,
    identify_timeout: Duration,
    enrollment: EnrollmentTiming,
}

impl<S: FingerprintSensor> Authenticator<S> {
    pub fn new(sensor: S, config: &LockConfig) -> Self {
        Self {
            sensor,
            identify_timeout: config.identify_timeout(),
            enrollment: EnrollmentTiming::from(config),
        }
    }

    /// Attempt one identification pass.
    ///
    /// Every way of not matching (empty window, smudge, unknown finger,
    /// sensor fault, timeout) yields [`MatchResult::NoMatch`].
    pub async fn identify(&mut self) -> MatchResult {
        match timeout(self.identify_timeout, self.identify_pass()).await {
            Ok(Ok(id)) => {
                info!(template_id = %id, "Fingerprint matched");
                MatchResult::Matched(id)
            }
            Ok(Err(e)) => {
                match e.sensor_code() {
                    Some(SensorCode::NoFinger) => trace!("No finger on sensor"),
                    Some(SensorCode::NotFound) => debug!("Fingerprint not recognized"),
                    _ if e.is_communication_fault() => {
                        warn!(error = %e, "Fingerprint sensor fault")
                    }
                    _ => debug!(error = %e, "Identification failed"),
                }
                MatchResult::NoMatch
            }
            Err(_) => {
                warn!(
                    "Identification timeout after {}ms",
                    self.identify_timeout.as_millis()
                );
                MatchResult::NoMatch
            }
        }
    }

    async fn identify_pass(&mut self) -> Result<TemplateId, HardwareError> {
        self.sensor.capture_image().await?;
        self.sensor.extract_features(FeatureSlot::One).await?;
        self.sensor.search().await
    }

    /// Run a full enrollment session into `id`.
    ///
    /// Waits for operator action between captures, so this can take up to
    /// the configured enroll timeout. Only call it on an explicit request.
    pub async fn enroll(&mut self, id: TemplateId) -> EnrollOutcome {
        info!(template_id = %id, "Enrollment started, place finger");
        let limit = self.enrollment.timeout;

        let outcome = match timeout(limit, self.run_session(id)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(EnrollmentFailure::TimedOut),
        };

        match outcome {
            Ok(()) => info!(template_id = %id, "Enrollment stored"),
            Err(failure) => warn!(template_id = %id, %failure, "Enrollment failed"),
        }
        outcome
    }

    async fn run_session(&mut self, id: TemplateId) -> EnrollOutcome {
        let mut session = EnrollmentSession::new(id, self.enrollment, Instant::now());
        loop {
            match session.step(&mut self.sensor, Instant::now()).await {
                EnrollStep::Continue(wait) => {
                    if !wait.is_zero() {
                        sleep(wait).await;
                    }
                }
                EnrollStep::Finished(outcome) => return outcome,
            }
        }
    }

    /// Delete the template in one slot.
    pub async fn delete(&mut self, id: TemplateId) -> StoreOutcome {
        match self.sensor.delete_model(id).await {
            Ok(()) => {
                info!(template_id = %id, "Template deleted");
                Ok(())
            }
            Err(e) => {
                let failure = store_failure(&e);
                warn!(template_id = %id, error = %e, %failure, "Template delete failed");
                Err(failure)
            }
        }
    }

    /// Wipe every stored template.
    pub async fn delete_all(&mut self) -> StoreOutcome {
        match self.sensor.empty_database().await {
            Ok(()) => {
                info!("Template store wiped");
                Ok(())
            }
            Err(e) => {
                let failure = store_failure(&e);
                warn!(error = %e, %failure, "Template wipe failed");
                Err(failure)
            }
        }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}
