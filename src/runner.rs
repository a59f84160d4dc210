use anyhow::Result;
use life_common::{GameConfig, ScheduledEvent, Session, Snapshot};
use log::{debug, info, trace, warn};
use std::time::{Duration, Instant};

/// Drives a [`Session`] headlessly: the clock decides when generations
/// happen, scheduled input events stand in for the user, and snapshots are
/// collected at the configured interval.
pub struct Runner {
    config: GameConfig,
    session: Session,
    /// Sorted by generation; `next_event` indexes the first one not yet applied.
    events: Vec<ScheduledEvent>,
    next_event: usize,
    recorded_snapshots: Vec<Snapshot>,
}

/// What the run loop should do next.
enum Progress {
    Continue,
    Finished,
}

impl Runner {
    pub fn new(config: GameConfig) -> Result<Self> {
        let session = Session::new(&config)?;
        let mut events = config.events.clone();
        events.sort_by_key(|e| e.at_generation);
        Ok(Runner {
            config,
            session,
            events,
            next_event: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    pub fn record_snapshot(&mut self) {
        let snapshot = Snapshot::capture(
            self.session.generation(),
            self.session.board(),
            self.config.output.save_live_cells_in_snapshot,
        );
        trace!(
            "Recorded snapshot at generation {} ({} live cells)",
            snapshot.generation,
            snapshot.population
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Runs until `total_generations` is reached or the clock is stopped with
    /// no scheduled input left to restart it.
    pub fn run(&mut self) -> Result<()> {
        let timing = self.config.timing.clone();
        let record_interval = if timing.record_interval_generations == 0 {
            warn!("record_interval_generations is 0. Recording every generation.");
            1
        } else {
            timing.record_interval_generations
        };

        let mut now = Instant::now();
        let start_time = now;
        let mut previous_print_time = start_time;

        if timing.start_running {
            self.session.toggle_running(now);
        }
        self.apply_due_events(now);
        info!("Recording initial snapshot (generation {})...", self.session.generation());
        self.record_snapshot();

        info!(
            "Running for {} generations, one every {} ms{}.",
            timing.total_generations,
            self.session.clock().delay().as_millis(),
            if timing.realtime { " (real time)" } else { "" }
        );

        while self.session.generation() < timing.total_generations {
            let Some(deadline) = self.session.clock().next_deadline() else {
                match self.apply_paused_events(now) {
                    Progress::Continue => continue,
                    Progress::Finished => {
                        info!(
                            "Clock stopped at generation {} with no input pending.",
                            self.session.generation()
                        );
                        break;
                    }
                }
            };

            now = if timing.realtime {
                let wait = deadline.saturating_duration_since(Instant::now());
                if wait > Duration::ZERO {
                    std::thread::sleep(wait);
                }
                Instant::now().max(deadline)
            } else {
                deadline
            };

            if !self.session.tick(now) {
                continue;
            }

            let generation = self.session.generation();
            let is_record_step = generation % record_interval == 0;
            let is_last_step = generation >= timing.total_generations;
            if is_record_step || is_last_step {
                self.record_snapshot();
            }

            let wall = Instant::now();
            if wall.duration_since(previous_print_time).as_secs_f64() >= 5.0 || is_last_step {
                info!(
                    "Generation [{}/{}] | Live cells: {} | Elapsed: {:.2} s",
                    generation,
                    timing.total_generations,
                    self.session.population(),
                    start_time.elapsed().as_secs_f64()
                );
                previous_print_time = wall;
            }

            self.apply_due_events(now);
        }

        // Make sure the final state is on record even when the run ended early.
        let last_recorded = self.recorded_snapshots.last().map(|s| s.generation);
        if last_recorded != Some(self.session.generation()) {
            self.record_snapshot();
        }
        Ok(())
    }

    /// Applies every event scheduled at or before the current generation.
    fn apply_due_events(&mut self, now: Instant) {
        let generation = self.session.generation();
        while let Some(scheduled) = self.events.get(self.next_event) {
            if scheduled.at_generation > generation {
                break;
            }
            self.apply(self.next_event, now);
        }
    }

    /// While paused the generation cannot advance, so the next batch of
    /// scheduled events is applied regardless of its generation.
    fn apply_paused_events(&mut self, now: Instant) -> Progress {
        let next = self.events.get(self.next_event);
        let Some(batch_generation) = next.map(|e| e.at_generation) else {
            return Progress::Finished;
        };
        debug!(
            "Clock stopped; applying input scheduled for generation {} early.",
            batch_generation
        );
        while self
            .events
            .get(self.next_event)
            .is_some_and(|e| e.at_generation == batch_generation)
        {
            self.apply(self.next_event, now);
        }
        Progress::Continue
    }

    fn apply(&mut self, index: usize, now: Instant) {
        self.next_event = index + 1;
        let event = self.events[index].event.clone();
        if let Err(e) = self.session.handle(&event, now) {
            warn!("Rejected input {:?}: {}", event, e);
        }
    }
}
