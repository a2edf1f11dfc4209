//! Lock state machine.
//!
//! Owns the single [`LockState`] value, validates every transition against
//! the cause that triggered it, and keeps a bounded history of what
//! happened and when.
//!
//! # Valid Transitions
//!
//! - Locked → Unlocked: fingerprint match or remote disarm
//! - Unlocked → Locked: remote arm or lock button
//! - Unlocked → Alerting: tamper alarm
//! - Alerting → Locked: alarm pattern complete, remote arm or lock button
//!
//! A transition to the state the machine is already in is always rejected;
//! callers treat overrides that hit the current state as no-ops.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use bikelock_core::{Error, LockState, Result, TemplateId};

/// Maximum number of transitions kept in history.
///
/// Older entries are dropped first.
pub const MAX_HISTORY_SIZE: usize = 100;

/// What caused a lock state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// A stored fingerprint matched.
    FingerprintMatch(TemplateId),
    /// Remote DISARM override.
    RemoteDisarm,
    /// Remote ARM override.
    RemoteArm,
    /// Physical lock button.
    LockButton,
    /// Tamper dwell reached the alarm threshold.
    TamperAlarm,
    /// The alarm pattern finished.
    AlarmComplete,
}

impl TransitionCause {
    /// Check whether this cause may move the lock from `from` to `to`.
    #[must_use]
    pub fn permits(&self, from: LockState, to: LockState) -> bool {
        use LockState::{Alerting, Locked, Unlocked};
        use TransitionCause::*;

        matches!(
            (from, to, self),
            (Locked, Unlocked, FingerprintMatch(_) | RemoteDisarm)
                | (Unlocked, Locked, RemoteArm | LockButton)
                | (Unlocked, Alerting, TamperAlarm)
                | (Alerting, Locked, AlarmComplete | RemoteArm | LockButton)
        )
    }
}

impl fmt::Display for TransitionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionCause::FingerprintMatch(id) => write!(f, "fingerprint match {id}"),
            TransitionCause::RemoteDisarm => write!(f, "remote disarm"),
            TransitionCause::RemoteArm => write!(f, "remote arm"),
            TransitionCause::LockButton => write!(f, "lock button"),
            TransitionCause::TamperAlarm => write!(f, "tamper alarm"),
            TransitionCause::AlarmComplete => write!(f, "alarm complete"),
        }
    }
}

/// Record of one state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: LockState,
    pub to: LockState,
    pub cause: TransitionCause,
    /// Wall-clock time the transition was applied.
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(from: LockState, to: LockState, cause: TransitionCause) -> Self {
        Self {
            from,
            to,
            cause,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.cause)
    }
}

/// The lock's state and its transition history.
///
/// # Examples
///
/// ```
/// use bikelock_controller::{LockStateMachine, TransitionCause};
/// use bikelock_core::LockState;
///
/// let mut machine = LockStateMachine::new();
/// assert_eq!(machine.current(), LockState::Locked);
///
/// machine.transition_to(LockState::Unlocked, TransitionCause::RemoteDisarm).unwrap();
/// machine.transition_to(LockState::Locked, TransitionCause::LockButton).unwrap();
///
/// // Only a match or a disarm can unlock.
/// assert!(machine.transition_to(LockState::Unlocked, TransitionCause::LockButton).is_err());
/// assert_eq!(machine.history().len(), 2);
/// ```
#[derive(Debug)]
pub struct LockStateMachine {
    current: LockState,
    entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl LockStateMachine {
    /// Create a machine in the `Locked` state with empty history.
    pub fn new() -> Self {
        Self {
            current: LockState::Locked,
            entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current(&self) -> LockState {
        self.current
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The `count` most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state` for the given cause.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if `cause` does not permit the
    /// move from the current state. The machine is left unchanged.
    pub fn transition_to(
        &mut self,
        new_state: LockState,
        cause: TransitionCause,
    ) -> Result<StateTransition> {
        if !cause.permits(self.current, new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: format!("{new_state} ({cause})"),
            });
        }

        let transition = StateTransition::new(self.current, new_state, cause);
        self.current = new_state;
        self.entered_at = Instant::now();
        self.add_to_history(transition.clone());
        Ok(transition)
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for LockStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn matched(n: u16) -> TransitionCause {
        TransitionCause::FingerprintMatch(TemplateId::new(n).unwrap())
    }

    #[test]
    fn test_new_machine_starts_locked() {
        let machine = LockStateMachine::new();
        assert_eq!(machine.current(), LockState::Locked);
        assert!(machine.history().is_empty());
    }

    #[rstest]
    #[case(LockState::Locked, LockState::Unlocked, matched(7), true)]
    #[case(LockState::Locked, LockState::Unlocked, TransitionCause::RemoteDisarm, true)]
    #[case(LockState::Locked, LockState::Unlocked, TransitionCause::LockButton, false)]
    #[case(LockState::Locked, LockState::Unlocked, TransitionCause::RemoteArm, false)]
    #[case(LockState::Locked, LockState::Alerting, TransitionCause::TamperAlarm, false)]
    #[case(LockState::Unlocked, LockState::Locked, TransitionCause::RemoteArm, true)]
    #[case(LockState::Unlocked, LockState::Locked, TransitionCause::LockButton, true)]
    #[case(LockState::Unlocked, LockState::Locked, TransitionCause::AlarmComplete, false)]
    #[case(LockState::Unlocked, LockState::Alerting, TransitionCause::TamperAlarm, true)]
    #[case(LockState::Alerting, LockState::Locked, TransitionCause::AlarmComplete, true)]
    #[case(LockState::Alerting, LockState::Unlocked, TransitionCause::RemoteDisarm, false)]
    #[case(LockState::Locked, LockState::Locked, TransitionCause::RemoteArm, false)]
    #[case(LockState::Unlocked, LockState::Unlocked, TransitionCause::RemoteDisarm, false)]
    fn test_transition_table(
        #[case] from: LockState,
        #[case] to: LockState,
        #[case] cause: TransitionCause,
        #[case] allowed: bool,
    ) {
        assert_eq!(cause.permits(from, to), allowed);
    }

    #[test]
    fn test_rejected_transition_leaves_state() {
        let mut machine = LockStateMachine::new();

        let err = machine
            .transition_to(LockState::Alerting, TransitionCause::TamperAlarm)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(machine.current(), LockState::Locked);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_history_records_causes() {
        let mut machine = LockStateMachine::new();

        machine.transition_to(LockState::Unlocked, matched(7)).unwrap();
        machine
            .transition_to(LockState::Alerting, TransitionCause::TamperAlarm)
            .unwrap();
        machine
            .transition_to(LockState::Locked, TransitionCause::AlarmComplete)
            .unwrap();

        let causes: Vec<_> = machine.history().iter().map(|t| t.cause).collect();
        assert_eq!(
            causes,
            vec![matched(7), TransitionCause::TamperAlarm, TransitionCause::AlarmComplete]
        );

        let last = machine.last_transitions(2);
        assert_eq!(last[0].from, LockState::Unlocked);
        assert_eq!(last[1].to, LockState::Locked);
        assert!(last[0].timestamp <= last[1].timestamp);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = LockStateMachine::new();
        for _ in 0..MAX_HISTORY_SIZE {
            machine
                .transition_to(LockState::Unlocked, TransitionCause::RemoteDisarm)
                .unwrap();
            machine
                .transition_to(LockState::Locked, TransitionCause::RemoteArm)
                .unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        assert_eq!(machine.last_transitions(500).len(), MAX_HISTORY_SIZE);
        assert_eq!(
            machine.history().front().map(|t| t.cause),
            Some(TransitionCause::RemoteDisarm)
        );
    }

    #[test]
    fn test_transition_serializes_cause() {
        let transition =
            StateTransition::new(LockState::Locked, LockState::Unlocked, matched(7));
        let json = serde_json::to_value(&transition).unwrap();

        assert_eq!(json["from"], "locked");
        assert_eq!(json["to"], "unlocked");
        assert_eq!(json["cause"]["fingerprint_match"], 7);
        assert_eq!(transition.to_string(), "Locked -> Unlocked (fingerprint match #7)");
    }
}
