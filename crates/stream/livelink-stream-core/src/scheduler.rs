//! Fixed-rate tick loop.
//!
//! Each tick: check cancellation -> produce -> deliver -> advance the logical
//! clock -> pace. The emitted timestamp is always the logical `world_time`;
//! wall-clock time only decides how long to sleep between ticks.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::clock::FrameClock;
use crate::error::{SinkError, StreamError};
use crate::sink::FrameSink;

/// How many ticks a run may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepBudget {
    Finite(u64),
    /// Runs until cancelled or a delivery fails.
    Unbounded,
}

impl StepBudget {
    #[inline]
    fn exhausted(self, ticks: u64) -> bool {
        match self {
            StepBudget::Finite(n) => ticks >= n,
            StepBudget::Unbounded => false,
        }
    }
}

impl From<Option<u64>> for StepBudget {
    fn from(steps: Option<u64>) -> Self {
        steps.map_or(StepBudget::Unbounded, StepBudget::Finite)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Waits out the remainder of a tick.
pub trait Pacer {
    /// `period` is the target tick length, `spent` the time already used by
    /// producing and delivering this tick.
    fn pace(&mut self, period: Duration, spent: Duration);
}

/// Real-time pacing with `std::thread::sleep`. Overruns are not made up: a
/// tick that took longer than the period is followed immediately by the next.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pace(&mut self, period: Duration, spent: Duration) {
        let remaining = period.saturating_sub(spent);
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

/// Offline stepping: ticks run back to back.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unpaced;

impl Pacer for Unpaced {
    fn pace(&mut self, _period: Duration, _spent: Duration) {}
}

impl<P: Pacer + ?Sized> Pacer for Box<P> {
    fn pace(&mut self, period: Duration, spent: Duration) {
        (**self).pace(period, spent)
    }
}

/// Terminal summary of a run that did not fail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub state: SchedulerState,
    /// Frames delivered during this run.
    pub ticks: u64,
    /// Logical time of the next, unsent, tick.
    pub world_time: f64,
    pub elapsed: Duration,
}

/// Drives one stream at a fixed rate.
#[derive(Debug)]
pub struct FrameScheduler<P: Pacer = ThreadPacer> {
    clock: FrameClock,
    state: SchedulerState,
    pacer: P,
    progress_interval: Option<u64>,
    tick_deadline: Option<Duration>,
}

impl FrameScheduler<ThreadPacer> {
    pub fn new(clock: FrameClock) -> Self {
        Self::with_pacer(clock, ThreadPacer)
    }
}

impl<P: Pacer> FrameScheduler<P> {
    pub fn with_pacer(clock: FrameClock, pacer: P) -> Self {
        Self {
            clock,
            state: SchedulerState::Idle,
            pacer,
            progress_interval: None,
            tick_deadline: None,
        }
    }

    /// Log "frame N" every `interval` ticks. `None` or `Some(0)` disables it.
    pub fn with_progress_interval(mut self, interval: Option<u64>) -> Self {
        self.progress_interval = interval.filter(|n| *n > 0);
        self
    }

    /// Treat a tick whose produce + deliver exceeds `deadline` as a failed
    /// delivery.
    pub fn with_tick_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.tick_deadline = deadline;
        self
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run until the budget is spent, `cancel` fires or `sink` fails.
    ///
    /// A sink failure leaves the scheduler in [`SchedulerState::Failed`] and is
    /// returned as [`StreamError::SinkDelivery`]; the failed tick does not
    /// advance the clock.
    pub fn run<T, F, S>(
        &mut self,
        subject: &str,
        mut producer: F,
        sink: &mut S,
        budget: StepBudget,
        cancel: &CancelToken,
    ) -> Result<RunReport, StreamError>
    where
        F: FnMut(u64, f64) -> T,
        S: FrameSink<T> + ?Sized,
    {
        let started = Instant::now();
        let period = self.clock.period_duration();
        let mut ticks = 0u64;
        self.state = SchedulerState::Running;

        loop {
            if budget.exhausted(ticks) {
                self.state = SchedulerState::Completed;
                break;
            }
            if cancel.is_cancelled() {
                log::info!(
                    "stream '{subject}' cancelled after {ticks} ticks at t={:.4}",
                    self.clock.world_time()
                );
                self.state = SchedulerState::Cancelled;
                break;
            }

            let tick_start = Instant::now();
            let index = self.clock.frame_index();
            let world_time = self.clock.world_time();
            if let Some(n) = self.progress_interval {
                if index % n == 0 {
                    log::info!("frame {index}");
                }
            }

            let payload = producer(index, world_time);
            if let Err(err) = sink.deliver(subject, world_time, &payload) {
                return Err(self.fail(subject, index, err));
            }
            let spent = tick_start.elapsed();
            if let Some(deadline) = self.tick_deadline {
                if spent > deadline {
                    let err = SinkError::DeadlineExceeded {
                        elapsed: spent,
                        deadline,
                    };
                    return Err(self.fail(subject, index, err));
                }
            }

            self.clock.advance();
            ticks += 1;

            // the last tick of a finite run ends without waiting
            if !budget.exhausted(ticks) {
                self.pacer.pace(period, tick_start.elapsed());
            }
        }

        Ok(RunReport {
            state: self.state,
            ticks,
            world_time: self.clock.world_time(),
            elapsed: started.elapsed(),
        })
    }

    fn fail(&mut self, subject: &str, index: u64, err: SinkError) -> StreamError {
        log::error!("stream '{subject}' failed on frame {index}: {err}");
        self.state = SchedulerState::Failed;
        StreamError::frame(subject, index, err)
    }
}
