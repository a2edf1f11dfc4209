//! Alert subsystem: status LEDs and the buzzer.
//!
//! The two LEDs mirror the lock state. The buzzer plays bounded patterns
//! and is silent otherwise. Pattern playback sleeps on the tokio clock and
//! always returns after the pattern's duration.

use tokio::time::{Instant, sleep};
use tracing::debug;

use bikelock_core::{AlertConfig, BuzzerPattern, LockState};
use bikelock_hardware::{DigitalOutput, PinLevel, Result};

/// Buzzer modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerMode {
    Silent,
    /// Short bursts for a disturbed locked bike.
    Attract,
    /// Fast pulses before the tamper relock.
    Alarm,
}

/// LED and buzzer outputs.
#[derive(Debug)]
pub struct AlertPanel<O> {
    locked_led: O,
    unlocked_led: O,
    buzzer: O,
    config: AlertConfig,
    shown: Option<LockState>,
}

impl<O: DigitalOutput> AlertPanel<O> {
    pub fn new(locked_led: O, unlocked_led: O, buzzer: O, config: AlertConfig) -> Self {
        Self {
            locked_led,
            unlocked_led,
            buzzer,
            config,
            shown: None,
        }
    }

    /// Mirror `state` on the LEDs and make sure the buzzer is silent.
    ///
    /// Pins are only written when the displayed state changes.
    pub async fn show_state(&mut self, state: LockState) -> Result<()> {
        if self.shown == Some(state) {
            return Ok(());
        }
        self.shown = None;

        let (locked, unlocked) = match state {
            LockState::Locked => (true, false),
            LockState::Unlocked => (false, true),
            LockState::Alerting => (true, true),
        };
        self.locked_led.set_level(PinLevel::from(locked)).await?;
        self.unlocked_led.set_level(PinLevel::from(unlocked)).await?;
        self.set_buzzer(false).await?;

        debug!(%state, "Status LEDs updated");
        self.shown = Some(state);
        Ok(())
    }

    /// Play the buzzer in the given mode; returns once the pattern is over.
    pub async fn sound(&mut self, mode: BuzzerMode) -> Result<()> {
        match mode {
            BuzzerMode::Silent => self.set_buzzer(false).await,
            BuzzerMode::Attract => self.play(self.config.attract).await,
            BuzzerMode::Alarm => self.play(self.config.alarm).await,
        }
    }

    /// Play one bounded pattern.
    pub async fn play(&mut self, pattern: BuzzerPattern) -> Result<()> {
        let result = self.run_pattern(pattern).await;
        // Never leave the buzzer sounding, even after a failed write.
        let silenced = self.set_buzzer(false).await;
        result.and(silenced)
    }

    async fn run_pattern(&mut self, pattern: BuzzerPattern) -> Result<()> {
        let end = Instant::now() + pattern.duration();
        debug!(?pattern, "Buzzer pattern started");
        loop {
            let now = Instant::now();
            if now >= end {
                return Ok(());
            }
            self.set_buzzer(true).await?;
            sleep(pattern.on().min(end - now)).await;

            self.set_buzzer(false).await?;
            let now = Instant::now();
            if now >= end {
                return Ok(());
            }
            sleep(pattern.off().min(end - now)).await;
        }
    }

    async fn set_buzzer(&mut self, on: bool) -> Result<()> {
        let level = buzzer_level(on, self.config.buzzer_active_low);
        self.buzzer.set_level(level).await
    }
}

/// Pin level that puts the buzzer in the requested state.
pub fn buzzer_level(on: bool, active_low: bool) -> PinLevel {
    PinLevel::from(on != active_low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikelock_hardware::mock::{MockOutput, MockOutputHandle};
    use rstest::rstest;
    use std::time::Duration;

    struct Pins {
        locked: MockOutputHandle,
        unlocked: MockOutputHandle,
        buzzer: MockOutputHandle,
    }

    fn panel(config: AlertConfig) -> (AlertPanel<MockOutput>, Pins) {
        let idle = buzzer_level(false, config.buzzer_active_low);
        let (locked, locked_handle) = MockOutput::new(PinLevel::Low);
        let (unlocked, unlocked_handle) = MockOutput::new(PinLevel::Low);
        let (buzzer, buzzer_handle) = MockOutput::new(idle);
        (
            AlertPanel::new(locked, unlocked, buzzer, config),
            Pins {
                locked: locked_handle,
                unlocked: unlocked_handle,
                buzzer: buzzer_handle,
            },
        )
    }

    #[rstest]
    #[case(true, true, PinLevel::Low)]
    #[case(false, true, PinLevel::High)]
    #[case(true, false, PinLevel::High)]
    #[case(false, false, PinLevel::Low)]
    fn test_buzzer_polarity(#[case] on: bool, #[case] active_low: bool, #[case] level: PinLevel) {
        assert_eq!(buzzer_level(on, active_low), level);
    }

    #[rstest]
    #[case(LockState::Locked, PinLevel::High, PinLevel::Low)]
    #[case(LockState::Unlocked, PinLevel::Low, PinLevel::High)]
    #[case(LockState::Alerting, PinLevel::High, PinLevel::High)]
    #[tokio::test]
    async fn test_leds_mirror_state(
        #[case] state: LockState,
        #[case] locked: PinLevel,
        #[case] unlocked: PinLevel,
    ) {
        let (mut panel, pins) = panel(AlertConfig::default());
        panel.show_state(state).await.unwrap();
        assert_eq!(pins.locked.level(), locked);
        assert_eq!(pins.unlocked.level(), unlocked);
        assert_eq!(pins.buzzer.level(), PinLevel::High);
    }

    #[tokio::test]
    async fn test_unchanged_state_writes_nothing() {
        let (mut panel, pins) = panel(AlertConfig::default());
        panel.show_state(LockState::Locked).await.unwrap();
        pins.locked.clear_history();

        panel.show_state(LockState::Locked).await.unwrap();
        assert!(pins.locked.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alarm_pattern_is_bounded() {
        let (mut panel, pins) = panel(AlertConfig::default());

        let start = Instant::now();
        panel.sound(BuzzerMode::Alarm).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_millis(2_100));

        // 100 ms on / 100 ms off for 2 s, active-low.
        assert_eq!(pins.buzzer.count_transitions_to(PinLevel::Low), 10);
        assert_eq!(pins.buzzer.level(), PinLevel::High);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attract_pattern_active_high() {
        let config = AlertConfig {
            buzzer_active_low: false,
            ..Default::default()
        };
        let (mut panel, pins) = panel(config);

        let start = Instant::now();
        panel.sound(BuzzerMode::Attract).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_millis(1_100));
        assert_eq!(pins.buzzer.count_transitions_to(PinLevel::High), 3);
        assert_eq!(pins.buzzer.level(), PinLevel::Low);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pattern_still_returns() {
        let (mut panel, pins) = panel(AlertConfig::default());
        pins.buzzer.set_fault(true);
        assert!(panel.sound(BuzzerMode::Alarm).await.is_err());
    }
}
