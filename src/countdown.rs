//! Countdown engine.
//!
//! A [`Countdown`] measures elapsed time on tokio's monotonic clock against a
//! [`CountdownSpec`], reports progress to a [`TickSink`] at every tick
//! boundary and reports completion exactly once when the total duration has
//! elapsed. It does no I/O of its own.
//!
//! ```text
//! Idle -> Running -> Completed
//!                 \-> Cancelled
//! ```

use std::future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::CountdownError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownSpec {
    total: Duration,
    tick_interval: Duration,
}

impl CountdownSpec {
    pub fn new(total: Duration, tick_interval: Duration) -> Result<Self, CountdownError> {
        if total.is_zero() {
            return Err(CountdownError::InvalidSpec(
                "total duration must be greater than zero".to_string(),
            ));
        }
        if tick_interval.is_zero() {
            return Err(CountdownError::InvalidSpec(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        if tick_interval.subsec_nanos() != 0 {
            return Err(CountdownError::InvalidSpec(format!(
                "tick interval {tick_interval:?} must be a whole number of seconds"
            )));
        }
        if tick_interval > total {
            return Err(CountdownError::InvalidSpec(format!(
                "tick interval {tick_interval:?} exceeds total duration {total:?}"
            )));
        }
        Ok(Self {
            total,
            tick_interval,
        })
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Number of ticks a full run emits. The boundary at `total` itself is
    /// reported through completion, not as a tick.
    pub fn expected_ticks(&self) -> u64 {
        let total = self.total.as_nanos();
        let tick = self.tick_interval.as_nanos();
        let boundaries = total.div_ceil(tick);
        u64::try_from(boundaries - 1).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Progress report emitted at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub elapsed: Duration,
    pub total: Duration,
}

impl Tick {
    /// Elapsed time rounded to the nearest whole second. Tick intervals are
    /// whole seconds, so successive ticks never repeat a value.
    pub fn elapsed_secs(&self) -> u64 {
        (self.elapsed + Duration::from_millis(500)).as_secs()
    }

    /// Share of the total already elapsed, in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        self.elapsed.as_secs_f64() / self.total.as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Always the configured total.
    pub elapsed: Duration,
    /// Measured run time, for logging.
    pub actual: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(Completion),
    Cancelled { elapsed: Duration },
}

/// Consumer of countdown events.
pub trait TickSink {
    fn on_tick(&mut self, tick: &Tick);

    fn on_complete(&mut self, completion: &Completion);

    fn on_cancel(&mut self, _elapsed: Duration) {}
}

/// Receiving half of a cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Sending half of a cancellation flag.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = Self::pair();
        signal
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                future::pending::<()>().await;
            }
        }
    }
}

#[derive(Debug)]
pub struct Countdown {
    spec: CountdownSpec,
    state: CountdownState,
}

impl Countdown {
    pub fn new(spec: CountdownSpec) -> Self {
        Self {
            spec,
            state: CountdownState::Idle,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    /// Runs the countdown to completion or cancellation.
    ///
    /// Ticks carry the scheduled boundary `k * tick_interval`, so the values
    /// are strictly increasing and independent of how long the sink takes.
    /// Boundaries missed by a slow sink are skipped rather than bunched up.
    /// An instance runs once; later calls fail with
    /// [`CountdownError::AlreadyCompleted`] and emit nothing.
    pub async fn run<S>(
        &mut self,
        sink: &mut S,
        cancel: &CancelSignal,
    ) -> Result<Outcome, CountdownError>
    where
        S: TickSink + ?Sized,
    {
        if self.state != CountdownState::Idle {
            return Err(CountdownError::AlreadyCompleted);
        }
        let total = self.spec.total;
        let tick_interval = self.spec.tick_interval;
        let mut cancel = cancel.clone();

        let start = Instant::now();
        self.state = CountdownState::Running;

        let mut ticker = time::interval_at(start + tick_interval, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let deadline = time::sleep_until(start + total);
        tokio::pin!(deadline);

        let mut last = Duration::ZERO;
        loop {
            tokio::select! {
                biased;

                () = &mut deadline => break,
                () = cancel.cancelled() => {
                    let elapsed = start.elapsed().min(total);
                    self.state = CountdownState::Cancelled;
                    sink.on_cancel(elapsed);
                    return Ok(Outcome::Cancelled { elapsed });
                }
                scheduled = ticker.tick() => {
                    let elapsed = scheduled.duration_since(start);
                    if elapsed >= total || elapsed <= last {
                        continue;
                    }
                    last = elapsed;
                    sink.on_tick(&Tick { elapsed, total });
                }
            }
        }

        let completion = Completion {
            elapsed: total,
            actual: start.elapsed(),
        };
        self.state = CountdownState::Completed;
        sink.on_complete(&completion);
        Ok(Outcome::Completed(completion))
    }
}
