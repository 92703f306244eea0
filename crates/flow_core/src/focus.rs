//! Focus Mode countdown.
//!
//! A single countdown that alternates between a work phase and a break
//! phase. Each `tick` removes one second. When the counter reaches zero the
//! timer switches phase, reloads the new phase's duration and stops; the
//! user starts the next phase explicitly.

use serde::{Deserialize, Serialize};

use crate::error::FlowResult;
use crate::preferences::{BreakRatio, Preferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusPhase {
    Work,
    Break,
}

impl FocusPhase {
    pub fn other(self) -> Self {
        match self {
            FocusPhase::Work => FocusPhase::Break,
            FocusPhase::Break => FocusPhase::Work,
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            FocusPhase::Work => "Time to focus",
            FocusPhase::Break => "Break time",
        }
    }
}

/// Coarse state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusStatus {
    Idle,
    Running,
    Break,
}

/// Emitted by `tick` when a phase finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub finished: FocusPhase,
    pub next: FocusPhase,
    pub next_duration_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSnapshot {
    pub phase: FocusPhase,
    pub status: FocusStatus,
    pub running: bool,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub completed_work_sessions: u32,
}

#[derive(Debug, Clone)]
pub struct FocusTimer {
    work_secs: u32,
    break_secs: u32,
    phase: FocusPhase,
    running: bool,
    remaining: u32,
    /// Phase length including any `extend` calls.
    total: u32,
    completed_work_sessions: u32,
}

impl FocusTimer {
    /// Build a timer from validated preferences.
    pub fn new(prefs: &Preferences) -> FlowResult<Self> {
        prefs.validate()?;
        Ok(Self::from_ratio(prefs.break_ratio))
    }

    fn from_ratio(ratio: BreakRatio) -> Self {
        let work_secs = ratio.work_minutes * 60;
        Self {
            work_secs,
            break_secs: ratio.break_minutes * 60,
            phase: FocusPhase::Work,
            running: false,
            remaining: work_secs,
            total: work_secs,
            completed_work_sessions: 0,
        }
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn status(&self) -> FocusStatus {
        match (self.phase, self.running) {
            (FocusPhase::Break, _) => FocusStatus::Break,
            (FocusPhase::Work, true) => FocusStatus::Running,
            (FocusPhase::Work, false) => FocusStatus::Idle,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Back to an idle work phase with the full work duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = FocusPhase::Work;
        self.remaining = self.work_secs;
        self.total = self.work_secs;
    }

    /// Add time to the current phase (the "+1 min" control).
    pub fn extend(&mut self, secs: u32) {
        self.remaining = self.remaining.saturating_add(secs);
        self.total = self.total.saturating_add(secs);
    }

    /// Change the configured durations. The current phase picks up the new
    /// length only when it has not started yet; a running or paused countdown
    /// keeps its remaining time and the new durations apply from the next
    /// phase.
    pub fn reconfigure(&mut self, prefs: &Preferences) -> FlowResult<()> {
        prefs.validate()?;
        self.work_secs = prefs.break_ratio.work_minutes * 60;
        self.break_secs = prefs.break_ratio.break_minutes * 60;
        if !self.running && self.remaining == self.total {
            self.remaining = self.phase_duration(self.phase);
            self.total = self.remaining;
        }
        Ok(())
    }

    pub fn phase_duration(&self, phase: FocusPhase) -> u32 {
        match phase {
            FocusPhase::Work => self.work_secs,
            FocusPhase::Break => self.break_secs,
        }
    }

    /// Advance by one second. A paused timer does not move.
    pub fn tick(&mut self) -> Option<PhaseChange> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }

        let finished = self.phase;
        if finished == FocusPhase::Work {
            self.completed_work_sessions += 1;
        }
        self.phase = finished.other();
        self.remaining = self.phase_duration(self.phase);
        self.total = self.remaining;
        self.running = false;
        tracing::debug!(
            ?finished,
            next = ?self.phase,
            "focus phase finished"
        );
        Some(PhaseChange {
            finished,
            next: self.phase,
            next_duration_secs: self.remaining,
        })
    }

    /// Fraction of the current phase already elapsed, 0.0-1.0.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.total - self.remaining.min(self.total)) / f64::from(self.total)
    }

    /// `MM:SS`
    pub fn display(&self) -> String {
        format_mmss(self.remaining)
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            phase: self.phase,
            status: self.status(),
            running: self.running,
            remaining_secs: self.remaining,
            total_secs: self.total,
            completed_work_sessions: self.completed_work_sessions,
        }
    }
}

pub fn format_mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(work: u32, brk: u32) -> Preferences {
        let mut p = Preferences::default();
        p.break_ratio = BreakRatio {
            work_minutes: work,
            break_minutes: brk,
        };
        p
    }

    fn run_phase(timer: &mut FocusTimer) -> PhaseChange {
        timer.start();
        loop {
            if let Some(change) = timer.tick() {
                return change;
            }
        }
    }

    #[test]
    fn test_new_timer_is_idle_work() {
        let timer = FocusTimer::new(&prefs(25, 5)).unwrap();
        assert_eq!(timer.status(), FocusStatus::Idle);
        assert_eq!(timer.remaining(), 25 * 60);
        assert_eq!(timer.display(), "25:00");
        assert_eq!(timer.progress(), 0.0);
    }

    #[test]
    fn test_rejects_out_of_range_durations() {
        assert!(FocusTimer::new(&prefs(4, 5)).is_err());
        assert!(FocusTimer::new(&prefs(25, 31)).is_err());
    }

    #[test]
    fn test_paused_timer_does_not_move() {
        let mut timer = FocusTimer::new(&prefs(5, 1)).unwrap();
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining(), 300);
    }

    #[test]
    fn test_work_flips_to_break_and_stops() {
        let mut timer = FocusTimer::new(&prefs(5, 1)).unwrap();
        let change = run_phase(&mut timer);
        assert_eq!(change.finished, FocusPhase::Work);
        assert_eq!(change.next, FocusPhase::Break);
        assert_eq!(change.next_duration_secs, 60);
        assert!(!timer.is_running());
        assert_eq!(timer.status(), FocusStatus::Break);
        assert_eq!(timer.completed_work_sessions(), 1);
    }

    #[test]
    fn test_phases_alternate() {
        let mut timer = FocusTimer::new(&prefs(5, 2)).unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let change = run_phase(&mut timer);
            seen.push((change.finished, change.next_duration_secs));
        }
        assert_eq!(
            seen,
            vec![
                (FocusPhase::Work, 120),
                (FocusPhase::Break, 300),
                (FocusPhase::Work, 120),
                (FocusPhase::Break, 300),
            ]
        );
        assert_eq!(timer.completed_work_sessions(), 2);
    }

    #[test]
    fn test_reset_returns_to_idle_work() {
        let mut timer = FocusTimer::new(&prefs(5, 1)).unwrap();
        run_phase(&mut timer);
        timer.start();
        timer.tick();
        timer.reset();
        assert_eq!(timer.phase(), FocusPhase::Work);
        assert_eq!(timer.status(), FocusStatus::Idle);
        assert_eq!(timer.remaining(), 300);
    }

    #[test]
    fn test_extend_adds_time_and_keeps_progress_bounded() {
        let mut timer = FocusTimer::new(&prefs(5, 1)).unwrap();
        timer.start();
        for _ in 0..150 {
            timer.tick();
        }
        assert!((timer.progress() - 0.5).abs() < 1e-9);
        timer.extend(60);
        assert_eq!(timer.remaining(), 210);
        assert!(timer.progress() < 0.5);
        assert!(timer.progress() >= 0.0);
    }

    #[test]
    fn test_reconfigure_while_idle_reloads_duration() {
        let mut timer = FocusTimer::new(&prefs(25, 5)).unwrap();
        timer.reconfigure(&prefs(50, 10)).unwrap();
        assert_eq!(timer.remaining(), 50 * 60);
    }

    #[test]
    fn test_reconfigure_keeps_paused_countdown() {
        let mut timer = FocusTimer::new(&prefs(5, 1)).unwrap();
        timer.start();
        for _ in 0..120 {
            timer.tick();
        }
        timer.pause();
        timer.reconfigure(&prefs(50, 10)).unwrap();
        assert_eq!(timer.remaining(), 180);
        assert_eq!(timer.phase_duration(FocusPhase::Work), 50 * 60);
    }

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(65), "01:05");
        assert_eq!(format_mmss(7200), "120:00");
    }
}
