use crate::error::{LifeError, LifeResult};
use log::debug;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Schedules generations at a fixed interval while running.
///
/// The clock never reads the system time itself: callers pass `now` in, so
/// the same clock runs under a real event loop or a simulated one.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: ClockState,
    delay: Duration,
    next_tick: Option<Instant>,
    generation: u64,
}

fn validate_delay(ms: i64) -> LifeResult<Duration> {
    if ms <= 0 {
        return Err(LifeError::invalid(format!(
            "simulation_delay_ms must be greater than 0, got {}",
            ms
        )));
    }
    Ok(Duration::from_millis(ms as u64))
}

impl SimulationClock {
    pub fn new(delay_ms: i64) -> LifeResult<Self> {
        Ok(SimulationClock {
            state: ClockState::Stopped,
            delay: validate_delay(delay_ms)?,
            next_tick: None,
            generation: 0,
        })
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Changes the interval. A rejected value leaves the previous one in place.
    /// An armed deadline keeps its time; the new delay applies from the next tick.
    pub fn set_delay(&mut self, ms: i64) -> LifeResult<()> {
        self.delay = validate_delay(ms)?;
        debug!("Simulation delay set to {} ms", ms);
        Ok(())
    }

    pub fn start(&mut self, now: Instant) {
        if self.state == ClockState::Stopped {
            self.state = ClockState::Running;
            self.next_tick = Some(now + self.delay);
        }
    }

    /// Cancels the pending tick.
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.next_tick = None;
    }

    pub fn toggle_running(&mut self, now: Instant) -> ClockState {
        match self.state {
            ClockState::Stopped => self.start(now),
            ClockState::Running => self.stop(),
        }
        self.state
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Returns true when a generation is due at `now` and re-arms the timer.
    /// At most one generation is released per call.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(due) if self.state == ClockState::Running && now >= due => {
                self.next_tick = Some(now + self.delay);
                true
            }
            _ => false,
        }
    }

    pub fn record_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
