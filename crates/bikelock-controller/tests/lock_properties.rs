//! Property tests over random rider, operator and bystander activity.

mod common;

use std::time::Duration;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tokio::time::{Instant, sleep};

use bikelock_controller::TransitionCause;
use bikelock_core::{ActuatorIntent, LockState};
use common::{CYCLE, RIDER, Rig, STRANGER};

#[derive(Debug, Clone)]
enum Event {
    RiderFinger,
    StrangerFinger,
    Arm,
    Disarm,
    Button,
    Motion,
    Noise(Vec<u8>),
    Wait(Duration),
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::RiderFinger),
        Just(Event::StrangerFinger),
        Just(Event::Arm),
        Just(Event::Disarm),
        Just(Event::Button),
        Just(Event::Motion),
        prop::collection::vec(any::<u8>(), 1..16).prop_map(Event::Noise),
        (1u64..25_000).prop_map(|ms| Event::Wait(Duration::from_millis(ms))),
    ]
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The lock only ever opens for a fingerprint match or a remote disarm,
    /// never rests in `Alerting`, and the actuator follows the lock state.
    #[test]
    fn prop_unlock_requires_match_or_disarm(
        events in prop::collection::vec(event(), 1..40),
    ) {
        let runtime = paused_runtime();
        let outcome: Result<(), TestCaseError> = runtime.block_on(async {
            let mut rig = Rig::with_rider();

            for event in events {
                match event {
                    Event::RiderFinger => rig.sensor.present_finger(RIDER),
                    Event::StrangerFinger => rig.sensor.present_finger(STRANGER),
                    Event::Arm => rig.link.send(b"200\n"),
                    Event::Disarm => rig.link.send(b"201\n"),
                    Event::Button => rig.button.pulse(),
                    Event::Motion => rig.tilt.pulse(),
                    Event::Noise(bytes) => rig.link.send(&bytes),
                    Event::Wait(duration) => sleep(duration).await,
                }

                let report = rig.controller.cycle(Instant::now()).await;
                sleep(CYCLE).await;

                for transition in &report.transitions {
                    if transition.to == LockState::Unlocked {
                        prop_assert!(
                            matches!(
                                transition.cause,
                                TransitionCause::FingerprintMatch(_) | TransitionCause::RemoteDisarm
                            ),
                            "unlocked by {:?}",
                            transition.cause
                        );
                    }
                }
                prop_assert_ne!(report.state_after, LockState::Alerting);

                let expected = ActuatorIntent::from_locked(report.state_after.is_locked());
                prop_assert_eq!(rig.controller.actuator().intent(), Some(expected));
            }
            Ok(())
        });
        outcome?;
    }

    /// With the bike left unlocked and untouched, exactly one warning goes
    /// out before the alarm relocks it.
    #[test]
    fn prop_single_warning_per_dwell(quiet_cycles in 300usize..500) {
        let runtime = paused_runtime();
        let outcome: Result<(), TestCaseError> = runtime.block_on(async {
            let mut rig = Rig::new();
            rig.link.send(b"201\n");
            rig.controller.cycle(Instant::now()).await;

            for _ in 0..quiet_cycles {
                sleep(CYCLE).await;
                rig.controller.cycle(Instant::now()).await;
            }

            let sent = rig.link.take_output();
            prop_assert_eq!(sent, b"500\n".to_vec());
            Ok(())
        });
        outcome?;
    }
}
