//! Per-seat timer bank (§4.3). A direct async translation of the
//! `asyncio.create_task` / `task.cancel()` pattern the distilled source
//! uses for deadlines, onto `tokio::spawn` / `JoinHandle::abort()`.
//!
//! The three distinct operations matter: `stop` deducts bank time *and*
//! cancels the in-flight task (used when a real client action arrives
//! before the deadline); `cancel` aborts without deducting (used when a
//! fresh timer for the same seat/kind replaces this one); `consume_bank`
//! deducts without touching the task at all, because it is called from
//! *inside* the very callback that is running as that task's body — an
//! abort from within your own task is a logic error, not a no-op.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Turn,
    Meld,
    RoundAdvance,
}

#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub base_turn_seconds: f64,
    pub initial_bank_seconds: f64,
    pub max_bank_seconds: f64,
    pub round_bonus_seconds: f64,
    pub meld_decision_seconds: f64,
    pub round_advance_seconds: f64,
}

impl TimerConfig {
    pub fn from_settings(settings: &crate::settings::GameSettings) -> Self {
        Self {
            base_turn_seconds: settings.base_turn_seconds,
            initial_bank_seconds: settings.initial_bank_seconds,
            max_bank_seconds: settings.max_bank_seconds,
            round_bonus_seconds: settings.round_bonus_seconds,
            meld_decision_seconds: settings.meld_decision_seconds,
            round_advance_seconds: settings.round_advance_seconds,
        }
    }
}

/// A single seat's turn timer: the two-phase base+bank deadline, plus the
/// bookkeeping needed to deduct bank time correctly whichever of
/// stop/cancel/consume_bank is used.
pub struct TurnTimer {
    config: TimerConfig,
    bank_seconds: f64,
    active_task: Option<JoinHandle<()>>,
    turn_start: Option<Instant>,
}

impl TurnTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            bank_seconds: config.initial_bank_seconds,
            config,
            active_task: None,
            turn_start: None,
        }
    }

    /// Rebuilds a timer for a reconnecting seat, starting from the bank it
    /// had preserved at disconnect rather than the default initial bank.
    pub fn with_preserved_bank(config: TimerConfig, preserved_bank_seconds: f64) -> Self {
        Self {
            bank_seconds: preserved_bank_seconds,
            config,
            active_task: None,
            turn_start: None,
        }
    }

    pub fn bank_seconds(&self) -> f64 {
        self.bank_seconds
    }

    pub fn add_round_bonus(&mut self) {
        self.bank_seconds = (self.bank_seconds + self.config.round_bonus_seconds).min(self.config.max_bank_seconds);
    }

    /// Arms the two-phase turn deadline: cancels any existing task (no
    /// deduction — a fresh timer supersedes it), records the start instant,
    /// and spawns a task that sleeps `base + bank` before invoking `on_timeout`.
    pub fn start_turn_timer<F>(&mut self, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.turn_start = Some(Instant::now());
        let duration = Duration::from_secs_f64(self.config.base_turn_seconds + self.bank_seconds);
        self.active_task = Some(tokio::spawn(run_timer(duration, on_timeout)));
    }

    /// A fixed-duration timer (meld decision, round advance) that never
    /// consumes bank time: `turn_start` stays `None`.
    pub fn start_fixed_timer<F>(&mut self, duration: Duration, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.turn_start = None;
        self.active_task = Some(tokio::spawn(run_timer(duration, on_timeout)));
    }

    pub fn start_meld_timer<F>(&mut self, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let duration = Duration::from_secs_f64(self.config.meld_decision_seconds);
        self.start_fixed_timer(duration, on_timeout);
    }

    pub fn start_round_advance_timer<F>(&mut self, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let duration = Duration::from_secs_f64(self.config.round_advance_seconds);
        self.start_fixed_timer(duration, on_timeout);
    }

    /// Deducts elapsed bank time and aborts the task. Use when an explicit
    /// player action supersedes the deadline.
    pub fn stop(&mut self) {
        self.deduct_bank_time();
        if let Some(task) = self.active_task.take() {
            task.abort();
        }
    }

    /// Aborts without deducting. Use when arming a new timer for the same
    /// seat/kind replaces this one outright.
    pub fn cancel(&mut self) {
        if let Some(task) = self.active_task.take() {
            task.abort();
        }
        self.turn_start = None;
    }

    /// Deducts elapsed bank time without touching the task. Call this, and
    /// only this, from inside a timeout callback running on this timer's
    /// own task.
    pub fn consume_bank(&mut self) {
        self.deduct_bank_time();
    }

    fn deduct_bank_time(&mut self) {
        if let Some(start) = self.turn_start.take() {
            let elapsed = start.elapsed().as_secs_f64();
            let bank_used = (elapsed - self.config.base_turn_seconds).max(0.0);
            self.bank_seconds = (self.bank_seconds - bank_used).max(0.0);
        }
    }
}

async fn run_timer<F>(duration: Duration, on_timeout: F)
where
    F: FnOnce() + Send + 'static,
{
    sleep(duration).await;
    on_timeout();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TimerConfig {
        TimerConfig {
            base_turn_seconds: 5.0,
            initial_bank_seconds: 20.0,
            max_bank_seconds: 60.0,
            round_bonus_seconds: 10.0,
            meld_decision_seconds: 5.0,
            round_advance_seconds: 15.0,
        }
    }

    #[tokio::test]
    async fn cancel_immediately_never_deducts_bank() {
        let mut timer = TurnTimer::new(test_config());
        timer.start_turn_timer(|| {});
        timer.cancel();
        assert_eq!(timer.bank_seconds(), 20.0);
    }

    #[tokio::test]
    async fn stop_after_elapsed_deducts_only_overage() {
        let mut timer = TurnTimer::new(test_config());
        timer.start_turn_timer(|| {});
        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.stop();
        // elapsed (~0.05s) is well under base_turn_seconds (5s), so no deduction.
        assert_eq!(timer.bank_seconds(), 20.0);
    }

    #[test]
    fn round_bonus_is_capped_at_max_bank() {
        let mut timer = TurnTimer::new(test_config());
        timer.bank_seconds = 55.0;
        timer.add_round_bonus();
        assert_eq!(timer.bank_seconds(), 60.0);
    }

    #[test]
    fn reconnect_preserves_prior_bank_instead_of_default() {
        let timer = TurnTimer::with_preserved_bank(test_config(), 7.5);
        assert_eq!(timer.bank_seconds(), 7.5);
    }
}
