use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Events a running session reacts to on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// One second of exam time has passed.
    Tick,
    /// Push the countdown to the timer store.
    SyncTimer,
    /// Re-save the answer sheet whether or not it changed.
    AutosaveDraft,
}

/// How often each [`ScheduledEvent`] fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadences {
    pub tick: Duration,
    pub timer_sync: Duration,
    pub draft_autosave: Duration,
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            timer_sync: Duration::from_secs(30),
            draft_autosave: Duration::from_secs(10),
        }
    }
}

/// Single source of timed events for a session.
///
/// Each cadence gets its own interval; the first event of each fires one
/// period after construction. When several are due at the same instant they
/// are yielded in the order tick, timer sync, autosave, so a sync always
/// carries the value after the tick.
pub struct Scheduler {
    tick: Interval,
    timer_sync: Interval,
    draft_autosave: Interval,
}

impl Scheduler {
    pub fn new(cadences: Cadences) -> Self {
        Self {
            tick: every(cadences.tick),
            timer_sync: every(cadences.timer_sync),
            draft_autosave: every(cadences.draft_autosave),
        }
    }

    pub async fn next(&mut self) -> ScheduledEvent {
        tokio::select! {
            biased;
            _ = self.tick.tick() => ScheduledEvent::Tick,
            _ = self.timer_sync.tick() => ScheduledEvent::SyncTimer,
            _ = self.draft_autosave.tick() => ScheduledEvent::AutosaveDraft,
        }
    }
}

fn every(period: Duration) -> Interval {
    // tokio panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
