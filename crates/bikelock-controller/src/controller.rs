//! Control state machine: one cooperative pass over every collaborator per
//! cycle.
//!
//! Each [`LockController::cycle`] runs, in order:
//!
//! 1. mirror the lock state on the LEDs and read the tilt sensor once
//! 2. poll the remote channel and apply at most one command
//! 3. while locked, and unless an override was just applied, try one
//!    fingerprint identification
//! 4. while not locked, feed the tamper monitor and check the lock button
//! 5. while locked and nothing changed this cycle, chirp on motion
//!
//! Every blocking call inside a cycle has a hard upper bound. Hardware
//! faults are logged and counted in the [`CycleReport`]; none of them stops
//! the loop.

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info, trace, warn};

use bikelock_actuation::{AlertPanel, BuzzerMode, LockActuator};
use bikelock_biometric::{Authenticator, EnrollOutcome, StoreOutcome};
use bikelock_core::{
    ActuatorIntent, Command, LockConfig, LockState, MatchResult, Notification, Result, TemplateId,
};
use bikelock_hardware::{BinaryInput, ByteTransport, DigitalOutput, FingerprintSensor, ServoDriver};
use bikelock_protocol::RemoteChannel;

use crate::state_machine::{LockStateMachine, StateTransition, TransitionCause};
use crate::tamper::{TamperEvent, TamperMonitor};

/// Devices the controller takes ownership of.
#[derive(Debug)]
pub struct Peripherals<F, V, I, O, T> {
    pub sensor: F,
    pub front_servo: V,
    pub rear_servo: V,
    pub tilt: I,
    pub button: I,
    pub locked_led: O,
    pub unlocked_led: O,
    pub buzzer: O,
    pub link: T,
}

/// Result of an operator command delegated to the authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorOutcome {
    Enroll { id: TemplateId, outcome: EnrollOutcome },
    Delete { id: TemplateId, outcome: StoreOutcome },
    DeleteAll(StoreOutcome),
    /// Enrollment refused while the bike is not locked.
    EnrollRefused(TemplateId),
}

/// What happened during one control cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub state_before: LockState,
    pub state_after: LockState,
    pub command: Option<Command>,
    pub operation: Option<OperatorOutcome>,
    pub matched: Option<TemplateId>,
    pub tamper: TamperEvent,
    pub alert: Option<BuzzerMode>,
    pub transitions: Vec<StateTransition>,
    /// Hardware errors absorbed during the cycle.
    pub hardware_faults: u32,
}

impl CycleReport {
    fn new(state: LockState) -> Self {
        Self {
            state_before: state,
            state_after: state,
            command: None,
            operation: None,
            matched: None,
            tamper: TamperEvent::None,
            alert: None,
            transitions: Vec::new(),
            hardware_faults: 0,
        }
    }

    /// Whether the cycle was a plain poll with nothing to report.
    pub fn is_quiet(&self) -> bool {
        self.command.is_none()
            && self.matched.is_none()
            && self.tamper == TamperEvent::None
            && self.alert.is_none()
            && self.transitions.is_empty()
            && self.hardware_faults == 0
    }
}

/// The bike lock's control loop.
#[derive(Debug)]
pub struct LockController<F, V, I, O, T> {
    config: LockConfig,
    machine: LockStateMachine,
    tamper: TamperMonitor,
    channel: RemoteChannel<T>,
    authenticator: Authenticator<F>,
    actuator: LockActuator<V>,
    alerts: AlertPanel<O>,
    tilt: I,
    button: I,
    cycles: u64,
}

impl<F, V, I, O, T> LockController<F, V, I, O, T>
where
    F: FingerprintSensor,
    V: ServoDriver,
    I: BinaryInput,
    O: DigitalOutput,
    T: ByteTransport,
{
    /// Build a controller in the `Locked` state.
    ///
    /// The actuator is driven to the locked position on the first cycle.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration does not validate.
    pub fn new(peripherals: Peripherals<F, V, I, O, T>, config: LockConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            machine: LockStateMachine::new(),
            tamper: TamperMonitor::new(
                config.warn_threshold(),
                config.alarm_threshold(),
                Instant::now(),
            ),
            channel: RemoteChannel::new(peripherals.link, &config),
            authenticator: Authenticator::new(peripherals.sensor, &config),
            actuator: LockActuator::new(
                peripherals.front_servo,
                peripherals.rear_servo,
                config.actuator.clone(),
            ),
            alerts: AlertPanel::new(
                peripherals.locked_led,
                peripherals.unlocked_led,
                peripherals.buzzer,
                config.alert.clone(),
            ),
            tilt: peripherals.tilt,
            button: peripherals.button,
            cycles: 0,
            config,
        })
    }

    /// Run one control cycle with `now` as the cycle's timestamp.
    pub async fn cycle(&mut self, now: Instant) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport::new(self.machine.current());

        self.reconcile_actuator(&mut report).await;
        self.show(self.machine.current(), &mut report).await;
        let motion = self.read_motion(&mut report).await;

        let mut override_applied = false;
        if let Some(command) = self.channel.poll(now).await {
            report.command = Some(command);
            override_applied = command.is_override();
            self.apply_command(command, now, &mut report).await;
        }

        if self.machine.current() == LockState::Locked && !override_applied {
            if let MatchResult::Matched(id) = self.authenticator.identify().await {
                report.matched = Some(id);
                self.transition(
                    LockState::Unlocked,
                    TransitionCause::FingerprintMatch(id),
                    &mut report,
                );
                self.tamper.reset(now);
                self.drive_actuator(false, &mut report).await;
            }
        }

        if self.machine.current() != LockState::Locked {
            report.tamper = self.tamper.poll(motion, now);
            match report.tamper {
                TamperEvent::None => {}
                TamperEvent::Warning => {
                    warn!(
                        quiet = ?self.tamper.quiet_for(now),
                        "Tamper warning"
                    );
                    self.notify(Notification::TamperWarning, &mut report).await;
                }
                TamperEvent::Alarm => self.raise_alarm(now, &mut report).await,
            }

            let still_open = self.machine.current() != LockState::Locked;
            if still_open && self.read_button(&mut report).await {
                self.transition(LockState::Locked, TransitionCause::LockButton, &mut report);
                self.tamper.reset(now);
                self.drive_actuator(true, &mut report).await;
            }
        }

        if self.machine.current() == LockState::Locked && report.transitions.is_empty() && motion {
            debug!("Motion while locked");
            if let Err(e) = self.alerts.sound(BuzzerMode::Attract).await {
                report.hardware_faults += 1;
                warn!(error = %e, "Buzzer fault during attract pattern");
            }
            report.alert = Some(BuzzerMode::Attract);
        }

        report.state_after = self.machine.current();
        report
    }

    /// Repeat [`cycle`](Self::cycle) every cycle interval until `shutdown`
    /// turns true or its sender is dropped.
    ///
    /// A cycle in progress always completes before the loop exits.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.cycle_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            cycle_ms = self.config.cycle_interval_ms,
            state = %self.machine.current(),
            "Lock controller running"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = self.cycle(Instant::now()).await;
                    if report.is_quiet() {
                        trace!(cycle = self.cycles, "Cycle complete");
                    } else {
                        debug!(cycle = self.cycles, ?report, "Cycle complete");
                    }
                }
            }
        }

        info!(
            cycles = self.cycles,
            state = %self.machine.current(),
            "Lock controller stopped"
        );
    }

    pub fn state(&self) -> LockState {
        self.machine.current()
    }

    pub fn state_machine(&self) -> &LockStateMachine {
        &self.machine
    }

    pub fn tamper(&self) -> &TamperMonitor {
        &self.tamper
    }

    pub fn actuator(&self) -> &LockActuator<V> {
        &self.actuator
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    async fn apply_command(&mut self, command: Command, now: Instant, report: &mut CycleReport) {
        match command {
            Command::Arm => {
                self.force(LockState::Locked, TransitionCause::RemoteArm, now, report)
                    .await;
            }
            Command::Disarm => {
                self.force(LockState::Unlocked, TransitionCause::RemoteDisarm, now, report)
                    .await;
            }
            Command::Enroll(id) if self.machine.current() != LockState::Locked => {
                warn!(template_id = %id, "Enrollment refused while unlocked");
                report.operation = Some(OperatorOutcome::EnrollRefused(id));
            }
            Command::Enroll(id) => {
                let outcome = self.authenticator.enroll(id).await;
                report.operation = Some(OperatorOutcome::Enroll { id, outcome });
            }
            Command::DeleteOne(id) => {
                let outcome = self.authenticator.delete(id).await;
                report.operation = Some(OperatorOutcome::Delete { id, outcome });
            }
            Command::DeleteAll => {
                let outcome = self.authenticator.delete_all().await;
                if outcome.is_ok() {
                    self.notify(Notification::DeleteAllAck, report).await;
                }
                report.operation = Some(OperatorOutcome::DeleteAll(outcome));
            }
        }
    }

    /// Remote override. Hitting the current state only re-issues the actuator.
    async fn force(
        &mut self,
        target: LockState,
        cause: TransitionCause,
        now: Instant,
        report: &mut CycleReport,
    ) {
        if self.machine.current() == target {
            debug!(state = %target, %cause, "Override matches current state");
        } else if self.transition(target, cause, report) {
            self.tamper.reset(now);
        }
        self.drive_actuator(target.is_locked(), report).await;
    }

    async fn raise_alarm(&mut self, now: Instant, report: &mut CycleReport) {
        warn!("Tamper alarm, relocking");
        if self.transition(LockState::Alerting, TransitionCause::TamperAlarm, report) {
            self.show(LockState::Alerting, report).await;
            if let Err(e) = self.alerts.sound(BuzzerMode::Alarm).await {
                report.hardware_faults += 1;
                warn!(error = %e, "Buzzer fault during alarm pattern");
            }
            report.alert = Some(BuzzerMode::Alarm);
            self.transition(LockState::Locked, TransitionCause::AlarmComplete, report);
        }
        self.drive_actuator(true, report).await;
        self.tamper.reset(now);
    }

    fn transition(
        &mut self,
        to: LockState,
        cause: TransitionCause,
        report: &mut CycleReport,
    ) -> bool {
        let held = self.machine.time_in_current_state();
        match self.machine.transition_to(to, cause) {
            Ok(transition) => {
                info!(
                    from = %transition.from,
                    to = %transition.to,
                    %cause,
                    ?held,
                    "Lock state changed"
                );
                report.transitions.push(transition);
                true
            }
            Err(e) => {
                error!(error = %e, "Lock state transition rejected");
                false
            }
        }
    }

    /// Re-issue the intent matching the lock state when the actuator's
    /// position is unknown or wrong, as at boot or after a servo fault.
    async fn reconcile_actuator(&mut self, report: &mut CycleReport) {
        let wanted = ActuatorIntent::from_locked(self.machine.current().is_locked());
        if self.actuator.intent() != Some(wanted) {
            debug!(intent = ?wanted, "Re-issuing actuator intent");
            self.drive_actuator(wanted.is_locked(), report).await;
        }
    }

    async fn drive_actuator(&mut self, locked: bool, report: &mut CycleReport) {
        if let Err(e) = self.actuator.set_locked(locked).await {
            report.hardware_faults += 1;
            warn!(
                error = %e,
                intent = ?ActuatorIntent::from_locked(locked),
                "Lock actuator fault"
            );
        }
    }

    async fn show(&mut self, state: LockState, report: &mut CycleReport) {
        if let Err(e) = self.alerts.show_state(state).await {
            report.hardware_faults += 1;
            warn!(error = %e, %state, "Status LED fault");
        }
    }

    async fn notify(&mut self, notification: Notification, report: &mut CycleReport) {
        if let Err(e) = self.channel.notify(notification).await {
            report.hardware_faults += 1;
            warn!(error = %e, ?notification, "Notification not sent");
        }
    }

    async fn read_motion(&mut self, report: &mut CycleReport) -> bool {
        match self.tilt.is_active().await {
            Ok(active) => active,
            Err(e) => {
                report.hardware_faults += 1;
                warn!(error = %e, "Tilt sensor read failed");
                false
            }
        }
    }

    async fn read_button(&mut self, report: &mut CycleReport) -> bool {
        match self.button.is_active().await {
            Ok(pressed) => pressed,
            Err(e) => {
                report.hardware_faults += 1;
                warn!(error = %e, "Lock button read failed");
                false
            }
        }
    }
}
