//! Bounded, fixed-interval polling.
//!
//! ```text
//!   Idle ──run()──► Running ──(now + lead-in ≥ end)──► Finished
//!                     │  ▲
//!                     ▼  │ sleep until next slot − lead-in
//!                   cycle: read → (new day? start period) → log
//! ```
//!
//! Slots are anchored at `start + k·interval` so cycle latency never
//! accumulates. The scheduler wakes [`WAKE_LEAD_IN`] before each slot; a slot
//! whose wake-up time has already passed when a cycle ends is skipped.

mod clock;

pub use clock::{Clock, MockClock, SystemClock};

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use tracing::{debug, error, info};

use crate::config::{Credentials, PollConfig};
use crate::driver::ModemDriver;
use crate::fmt::{format_span, format_timestamp};
use crate::reader::StatReader;
use crate::report::{ReportError, Reporter};
use crate::session::Connector;

/// How long before a slot the scheduler wakes up.
pub const WAKE_LEAD_IN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    Finished,
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub records: u64,
    pub failed: u64,
}

pub struct PollScheduler<K> {
    config: PollConfig,
    clock: K,
    state: PollState,
}

impl<K: Clock> PollScheduler<K> {
    pub fn new(config: PollConfig, clock: K) -> Self {
        Self {
            config,
            clock,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Polls until the window closes. Only output failures end the run
    /// early; a failed cycle is logged and counted.
    pub fn run<D, C, R>(
        &mut self,
        reader: &mut StatReader<D, C>,
        credentials: &Credentials,
        reporter: &mut R,
    ) -> Result<RunSummary, ReportError>
    where
        D: ModemDriver,
        C: Connector,
        R: Reporter + ?Sized,
    {
        let start = self.clock.now();
        let end = end_time(start, self.config.duration);
        self.state = PollState::Running { start, end };
        info!(
            "Logging {} every {} for {} (until {})",
            reader.driver().model(),
            format_span(self.config.interval),
            format_span(self.config.duration),
            format_timestamp(&end)
        );

        let result = self.poll(start, reader, credentials, reporter);
        self.state = PollState::Finished;
        result
    }

    fn poll<D, C, R>(
        &mut self,
        start: DateTime<Local>,
        reader: &mut StatReader<D, C>,
        credentials: &Credentials,
        reporter: &mut R,
    ) -> Result<RunSummary, ReportError>
    where
        D: ModemDriver,
        C: Connector,
        R: Reporter + ?Sized,
    {
        reporter.start_period(start)?;
        let mut period: NaiveDate = start.date_naive();
        let mut summary = RunSummary::default();
        let mut slot: u64 = 0;

        loop {
            summary.cycles += 1;
            match reader.read_stats(credentials) {
                Ok(outcome) => {
                    let at = self.clock.now();
                    if self.config.rotate_daily && at.date_naive() > period {
                        debug!("Day changed, starting new period at {}", format_timestamp(&at));
                        reporter.start_period(at)?;
                        period = at.date_naive();
                    }
                    reporter.log(&reader.record(at))?;
                    summary.records += 1;
                    debug!(
                        "Cycle {}: {} values updated, {} missed",
                        summary.cycles,
                        outcome.updated,
                        outcome.missed.len()
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Cycle {} failed: {}", summary.cycles, e);
                }
            }

            let elapsed = self.elapsed(start);
            slot = next_slot(slot, elapsed, self.config.interval);
            let due = slot_offset(slot, self.config.interval).min(self.config.duration);
            let wait = due.saturating_sub(WAKE_LEAD_IN).saturating_sub(elapsed);
            if !wait.is_zero() {
                self.clock.sleep(wait);
            }

            if self.elapsed(start) + WAKE_LEAD_IN >= self.config.duration {
                break;
            }
        }

        Ok(summary)
    }

    /// Time since `start` by the clock, zero if the clock went backwards.
    fn elapsed(&self, start: DateTime<Local>) -> Duration {
        (self.clock.now() - start).to_std().unwrap_or(Duration::ZERO)
    }
}

/// First slot after `current` whose wake-up time is not already past.
fn next_slot(current: u64, elapsed: Duration, interval: Duration) -> u64 {
    let interval_ns = interval.as_nanos().max(1);
    let reached = (elapsed + WAKE_LEAD_IN).as_nanos().div_ceil(interval_ns);
    let reached = u64::try_from(reached).unwrap_or(u64::MAX);
    reached.max(current.saturating_add(1))
}

fn slot_offset(slot: u64, interval: Duration) -> Duration {
    u32::try_from(slot)
        .ok()
        .and_then(|k| interval.checked_mul(k))
        .unwrap_or(Duration::MAX)
}

fn end_time(start: DateTime<Local>, duration: Duration) -> DateTime<Local> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|d| start.checked_add_signed(d))
        .unwrap_or(start)
}
