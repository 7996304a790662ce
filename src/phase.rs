//! Named phase durations and counters for one conversion.
//!
//! ```
//! use las2hdf::phase::{Phase, PhaseTimer};
//!
//! let mut timer = PhaseTimer::new();
//! timer.enter(Phase::Reading);
//! timer.count("points", 10);
//! timer.enter(Phase::Transforming);
//! timer.enter(Phase::Writing);
//! timer.enter(Phase::Done);
//! assert_eq!(3, timer.timings().len());
//! assert_eq!(Some(10), timer.counter("points"));
//! ```

use log::{info, warn};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fmt,
    time::{Duration, Instant},
};

/// The states a conversion moves through.
///
/// Conversions go `Idle -> Reading -> Transforming -> Writing -> Done`, and can go to `Failed`
/// from any state that is not terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    /// Nothing has happened yet.
    Idle,
    /// Loading the source into memory.
    Reading,
    /// Turning columns into the destination schema.
    Transforming,
    /// Writing the destination.
    Writing,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
}

impl Phase {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    fn is_timed(self) -> bool {
        matches!(self, Phase::Reading | Phase::Transforming | Phase::Writing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Reading => "reading",
            Phase::Transforming => "transforming",
            Phase::Writing => "writing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How long one phase took.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Timing {
    /// The phase.
    pub phase: Phase,
    /// Wall clock seconds spent in the phase.
    pub seconds: f64,
}

/// Records phase transitions, their durations, and named counters.
#[derive(Clone, Debug)]
pub struct PhaseTimer {
    phase: Phase,
    entered: Instant,
    started: Instant,
    timings: Vec<Timing>,
    counters: BTreeMap<&'static str, u64>,
}

impl PhaseTimer {
    /// Creates a timer in the `Idle` phase.
    pub fn new() -> PhaseTimer {
        let now = Instant::now();
        PhaseTimer {
            phase: Phase::Idle,
            entered: now,
            started: now,
            timings: Vec::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Ends the current phase and enters `phase`.
    ///
    /// Transitions out of a terminal phase, or backwards, are ignored with a warning.
    pub fn enter(&mut self, phase: Phase) {
        if self.phase.is_terminal() || (phase <= self.phase && phase != Phase::Failed) {
            warn!("ignoring transition from {} to {}", self.phase, phase);
            return;
        }
        let now = Instant::now();
        if self.phase.is_timed() {
            let elapsed = now - self.entered;
            info!("{} took {:.2}s", self.phase, elapsed.as_secs_f64());
            self.timings.push(Timing {
                phase: self.phase,
                seconds: elapsed.as_secs_f64(),
            });
        }
        self.phase = phase;
        self.entered = now;
    }

    /// Adds `value` to the counter `name`.
    pub fn count(&mut self, name: &'static str, value: u64) {
        *self.counters.entry(name).or_default() += value;
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the durations of the phases that have ended.
    pub fn timings(&self) -> &[Timing] {
        &self.timings
    }

    /// Returns the value of a counter.
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    /// Returns the counters by name.
    pub fn counters(&self) -> &BTreeMap<&'static str, u64> {
        &self.counters
    }

    /// Returns the time since this timer was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for PhaseTimer {
    fn default() -> PhaseTimer {
        PhaseTimer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_is_reachable_from_any_phase() {
        for phase in [Phase::Idle, Phase::Reading, Phase::Transforming, Phase::Writing] {
            let mut timer = PhaseTimer::new();
            if phase != Phase::Idle {
                timer.enter(phase);
            }
            timer.enter(Phase::Failed);
            assert_eq!(Phase::Failed, timer.phase());
        }
    }

    #[test]
    fn terminal_phases_stick() {
        let mut timer = PhaseTimer::new();
        timer.enter(Phase::Reading);
        timer.enter(Phase::Failed);
        timer.enter(Phase::Writing);
        assert_eq!(Phase::Failed, timer.phase());
        assert_eq!(1, timer.timings().len());
    }

    #[test]
    fn no_going_back() {
        let mut timer = PhaseTimer::new();
        timer.enter(Phase::Writing);
        timer.enter(Phase::Reading);
        assert_eq!(Phase::Writing, timer.phase());
    }

    #[test]
    fn counters_add_up() {
        let mut timer = PhaseTimer::new();
        timer.count("datasets", 2);
        timer.count("datasets", 3);
        assert_eq!(Some(5), timer.counter("datasets"));
        assert_eq!(None, timer.counter("points"));
    }
}
