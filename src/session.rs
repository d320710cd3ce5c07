use std::time::Duration;

use crate::countdown::{CancelSignal, Countdown, CountdownSpec, Outcome, TickSink};
use crate::error::CountdownError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Work,
    Break,
}

impl SessionKind {
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Work => "Work",
            SessionKind::Break => "Break",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            SessionKind::Work => "🍅",
            SessionKind::Break => "☕",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub kind: SessionKind,
    pub duration: Duration,
}

impl Session {
    pub fn new(kind: SessionKind, duration: Duration) -> Self {
        Session { kind, duration }
    }

    pub fn from_minutes(kind: SessionKind, minutes: u32) -> Self {
        Session::new(kind, Duration::from_secs(u64::from(minutes) * 60))
    }

    /// Configured length in whole minutes.
    pub fn minutes(&self) -> u64 {
        self.duration.as_secs() / 60
    }

    pub fn spec(&self, tick: Duration) -> Result<CountdownSpec, CountdownError> {
        CountdownSpec::new(self.duration, tick)
    }
}

/// Position of a session inside a cycle, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub index: u32,
    pub of: u32,
}

impl Round {
    pub fn is_last(&self) -> bool {
        self.index == self.of
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub session: Session,
    pub outcome: Outcome,
}

impl SessionReport {
    pub fn completed(&self) -> bool {
        matches!(self.outcome, Outcome::Completed(_))
    }

    /// Measured run time, whether the session completed or was cancelled.
    pub fn actual(&self) -> Duration {
        match self.outcome {
            Outcome::Completed(c) => c.actual,
            Outcome::Cancelled { elapsed } => elapsed,
        }
    }
}

/// Presentation hooks around the countdown events.
pub trait SessionObserver: TickSink {
    fn session_started(&mut self, session: &Session, round: Option<Round>);

    fn session_finished(&mut self, report: &SessionReport, round: Option<Round>);

    fn cycle_started(&mut self, _plan: &CyclePlan) {}

    fn cycle_finished(&mut self, _report: &CycleReport) {}
}

/// Runs a single standalone session.
pub async fn run_session<O>(
    session: &Session,
    tick: Duration,
    observer: &mut O,
    cancel: &CancelSignal,
) -> Result<SessionReport, CountdownError>
where
    O: SessionObserver + ?Sized,
{
    let spec = session.spec(tick)?;
    run_spec(session, spec, None, observer, cancel).await
}

async fn run_spec<O>(
    session: &Session,
    spec: CountdownSpec,
    round: Option<Round>,
    observer: &mut O,
    cancel: &CancelSignal,
) -> Result<SessionReport, CountdownError>
where
    O: SessionObserver + ?Sized,
{
    let kind = session.kind.label();
    tracing::info!(
        session = kind,
        minutes = session.minutes(),
        duration = ?session.duration,
        round = round.map(|r| r.index),
        "Starting session"
    );
    tracing::debug!(
        total = ?spec.total(),
        tick = ?spec.tick_interval(),
        ticks = spec.expected_ticks(),
        "countdown armed"
    );
    observer.session_started(session, round);

    let outcome = Countdown::new(spec).run(&mut *observer, cancel).await?;
    let report = SessionReport {
        session: *session,
        outcome,
    };

    match outcome {
        Outcome::Completed(c) => tracing::info!(
            session = kind,
            minutes = session.minutes(),
            actual_duration = ?c.actual,
            "Session completed"
        ),
        Outcome::Cancelled { elapsed } => tracing::warn!(
            session = kind,
            minutes = session.minutes(),
            actual_duration = ?elapsed,
            "Session cancelled"
        ),
    }
    observer.session_finished(&report, round);
    Ok(report)
}

/// A configured run of work sessions with breaks in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePlan {
    pub work: Session,
    pub rest: Session,
    pub cycles: u32,
}

impl CyclePlan {
    pub fn new(work: Duration, rest: Duration, cycles: u32) -> Result<Self, CountdownError> {
        if cycles == 0 {
            return Err(CountdownError::InvalidSpec(
                "cycle count must be at least 1".to_string(),
            ));
        }
        Ok(CyclePlan {
            work: Session::new(SessionKind::Work, work),
            rest: Session::new(SessionKind::Break, rest),
            cycles,
        })
    }

    pub fn from_minutes(work: u32, rest: u32, cycles: u32) -> Result<Self, CountdownError> {
        CyclePlan::new(
            Duration::from_secs(u64::from(work) * 60),
            Duration::from_secs(u64::from(rest) * 60),
            cycles,
        )
    }

    /// Work, Break, Work, ... with no break after the final work session.
    /// Produced lazily, so the cycle count costs nothing up front.
    pub fn sessions(self) -> impl Iterator<Item = (Round, Session)> {
        let CyclePlan { work, rest, cycles } = self;
        (1..=cycles).flat_map(move |index| {
            let round = Round { index, of: cycles };
            let rest = (!round.is_last()).then_some((round, rest));
            std::iter::once((round, work)).chain(rest)
        })
    }

    /// Total number of sessions, `2 * cycles - 1`.
    pub fn session_count(&self) -> u64 {
        u64::from(self.cycles) * 2 - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycles: u32,
    pub completed_cycles: u32,
    pub sessions: Vec<SessionReport>,
    pub cancelled: bool,
}

/// Runs every session of `plan` in order.
///
/// Both specs are validated before the first session starts. A cancelled
/// session ends the cycle early.
pub async fn run_cycle<O>(
    plan: &CyclePlan,
    tick: Duration,
    observer: &mut O,
    cancel: &CancelSignal,
) -> Result<CycleReport, CountdownError>
where
    O: SessionObserver + ?Sized,
{
    let work_spec = plan.work.spec(tick)?;
    let rest_spec = plan.rest.spec(tick)?;

    tracing::info!(
        work_minutes = plan.work.minutes(),
        break_minutes = plan.rest.minutes(),
        cycles = plan.cycles,
        sessions = plan.session_count(),
        "Starting Pomodoro cycle"
    );
    observer.cycle_started(plan);

    let mut report = CycleReport {
        cycles: plan.cycles,
        completed_cycles: 0,
        sessions: Vec::new(),
        cancelled: false,
    };

    for (round, session) in plan.sessions() {
        let spec = match session.kind {
            SessionKind::Work => work_spec,
            SessionKind::Break => rest_spec,
        };
        let session_report = run_spec(&session, spec, Some(round), &mut *observer, cancel).await?;
        report.sessions.push(session_report);

        if !session_report.completed() {
            report.cancelled = true;
            break;
        }
        if session.kind == SessionKind::Work {
            report.completed_cycles = round.index;
        }
    }

    if report.cancelled {
        tracing::warn!(
            completed_cycles = report.completed_cycles,
            cycles = plan.cycles,
            "Pomodoro cycle cancelled"
        );
    } else {
        tracing::info!(
            completed_cycles = report.completed_cycles,
            cycles = report.cycles,
            "Pomodoro cycles completed"
        );
    }
    observer.cycle_finished(&report);
    Ok(report)
}
