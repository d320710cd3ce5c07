use chrono::Local;
use crossterm::{
    cursor, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, Stdout, Write};
use std::time::Duration;

use crate::countdown::{Completion, Tick, TickSink};
use crate::duration::format_hms;
use crate::session::{
    CyclePlan, CycleReport, Round, Session, SessionKind, SessionObserver, SessionReport,
};

const BAR_WIDTH: usize = 30;

/// What the progress line is currently showing.
struct Bar {
    label: &'static str,
    done_text: &'static str,
    total: Duration,
}

/// Line-oriented terminal presentation: start/finish messages plus a
/// single progress line redrawn in place on every tick.
pub struct Console<W: Write = Stdout> {
    out: W,
    bar: Option<Bar>,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        Console::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Console { out, bar: None }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::debug!(error = %e, "failed to write to terminal");
        }
    }

    fn draw(&mut self, elapsed: Duration, fraction: f64, finished: bool) -> io::Result<()> {
        let Some(bar) = &self.bar else {
            return Ok(());
        };
        let remaining = bar.total.saturating_sub(elapsed);
        let percent = percent(fraction);
        let filled = BAR_WIDTH * percent as usize / 100;
        let bar_filled = "\u{2588}".repeat(filled);
        let bar_empty = "\u{2591}".repeat(BAR_WIDTH - filled);

        let trailer = if finished {
            bar.done_text.to_string()
        } else {
            let left = chrono::Duration::from_std(remaining).unwrap_or_default();
            let ends_at = Local::now() + left;
            format!("{} left (until {})", format_hms(remaining), ends_at.format("%H:%M"))
        };

        queue!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            SetAttribute(Attribute::Bold),
            Print(format!("{}: ", bar.label)),
            SetAttribute(Attribute::Reset),
            Print(format!("{percent:>3}% ")),
            SetForegroundColor(bar_color(remaining, bar.total)),
            Print(&bar_filled),
            SetForegroundColor(Color::DarkGrey),
            Print(&bar_empty),
            ResetColor,
            Print(format!(" {trailer}")),
        )?;
        if finished {
            queue!(self.out, Print("\n"))?;
        }
        self.out.flush()
    }
}

/// Whole percent for a completed fraction, clamped to `0..=100`.
pub fn percent(fraction: f64) -> u64 {
    (fraction * 100.0).floor().clamp(0.0, 100.0) as u64
}

/// Green, then yellow for the last 20%, red for the last minute.
pub fn bar_color(remaining: Duration, total: Duration) -> Color {
    if remaining <= Duration::from_secs(60) {
        Color::Red
    } else if remaining.as_secs_f64() <= total.as_secs_f64() * 0.2 {
        Color::Yellow
    } else {
        Color::Green
    }
}

impl<W: Write> TickSink for Console<W> {
    fn on_tick(&mut self, tick: &Tick) {
        if let Err(e) = self.draw(tick.elapsed, tick.fraction(), false) {
            tracing::debug!(error = %e, "failed to draw progress");
        }
    }

    fn on_complete(&mut self, completion: &Completion) {
        if let Err(e) = self.draw(completion.elapsed, 1.0, true) {
            tracing::debug!(error = %e, "failed to draw progress");
        }
        self.bar = None;
    }

    fn on_cancel(&mut self, _elapsed: Duration) {
        self.bar = None;
        self.line("");
        self.line("Session cancelled.");
    }
}

impl<W: Write> SessionObserver for Console<W> {
    fn session_started(&mut self, session: &Session, round: Option<Round>) {
        let label = session.kind.label();
        let name = match round {
            Some(_) => label.to_string(),
            None => label.to_lowercase(),
        };
        if let Some(round) = round {
            if session.kind == SessionKind::Work {
                self.line(&format!("\n--- Cycle {}/{} ---", round.index, round.of));
            }
        }
        self.line(&format!(
            "{} Starting {}-minute {name} session...",
            session.kind.emoji(),
            session.minutes()
        ));

        let done_text = match (session.kind, round) {
            (SessionKind::Break, None) => "⏰ Time's up!",
            _ => "✅ Done!",
        };
        self.bar = Some(Bar {
            label,
            done_text,
            total: session.duration,
        });
        if let Err(e) = self.draw(Duration::ZERO, 0.0, false) {
            tracing::debug!(error = %e, "failed to draw progress");
        }
    }

    fn session_finished(&mut self, report: &SessionReport, round: Option<Round>) {
        if round.is_some() || !report.completed() {
            return;
        }
        match report.session.kind {
            SessionKind::Work => self.line("🎉 Work session complete! Time for a break."),
            SessionKind::Break => self.line("🚀 Break time over! Ready to get back to work?"),
        }
    }

    fn cycle_started(&mut self, plan: &CyclePlan) {
        self.line(&format!(
            "🍅 Starting {} Pomodoro cycles ({}m work, {}m break)",
            plan.cycles,
            plan.work.minutes(),
            plan.rest.minutes()
        ));
    }

    fn cycle_finished(&mut self, report: &CycleReport) {
        if !report.cancelled {
            self.line("\n🎉 All Pomodoro cycles completed! Great work!");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::Outcome;

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    fn work(minutes: u32) -> Session {
        Session::from_minutes(SessionKind::Work, minutes)
    }

    fn completed(session: Session) -> SessionReport {
        SessionReport {
            session,
            outcome: Outcome::Completed(Completion {
                elapsed: session.duration,
                actual: session.duration,
            }),
        }
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.425), 42);
        assert_eq!(percent(1.5), 100);
        assert_eq!(percent(-0.1), 0);
    }

    #[test]
    fn tick_progress_uses_tick_fraction() {
        let session = work(1);
        let mut console = Console::new(Vec::new());
        console.session_started(&session, None);
        console.on_tick(&Tick {
            elapsed: Duration::from_secs(15),
            total: session.duration,
        });

        let out = output(console);
        assert!(out.contains(" 25% "), "out: {out}");
        assert!(out.contains("0:45 left"));
    }

    #[test]
    fn color_thresholds() {
        let total = Duration::from_secs(1500);
        assert_eq!(bar_color(Duration::from_secs(1200), total), Color::Green);
        assert_eq!(bar_color(Duration::from_secs(300), total), Color::Yellow);
        assert_eq!(bar_color(Duration::from_secs(60), total), Color::Red);
    }

    #[test]
    fn standalone_work_session_messages() {
        let session = work(25);
        let mut console = Console::new(Vec::new());
        console.session_started(&session, None);
        console.on_tick(&Tick {
            elapsed: Duration::from_secs(750),
            total: session.duration,
        });
        console.on_complete(&Completion {
            elapsed: session.duration,
            actual: session.duration,
        });
        console.session_finished(&completed(session), None);

        let out = output(console);
        assert!(out.contains("🍅 Starting 25-minute work session..."));
        assert!(out.contains(" 50% "));
        assert!(out.contains("12:30 left"));
        assert!(out.contains("100% "));
        assert!(out.contains("✅ Done!"));
        assert!(out.contains("🎉 Work session complete! Time for a break."));
    }

    #[test]
    fn standalone_break_uses_times_up() {
        let session = Session::from_minutes(SessionKind::Break, 5);
        let mut console = Console::new(Vec::new());
        console.session_started(&session, None);
        console.on_complete(&Completion {
            elapsed: session.duration,
            actual: session.duration,
        });
        console.session_finished(&completed(session), None);

        let out = output(console);
        assert!(out.contains("☕ Starting 5-minute break session..."));
        assert!(out.contains("⏰ Time's up!"));
        assert!(out.contains("🚀 Break time over!"));
    }

    #[test]
    fn cycle_messages() {
        let plan = CyclePlan::from_minutes(25, 5, 2).unwrap();
        let mut console = Console::new(Vec::new());
        console.cycle_started(&plan);
        let round = Round { index: 1, of: 2 };
        console.session_started(&plan.work, Some(round));
        console.session_finished(&completed(plan.work), Some(round));
        console.session_started(&plan.rest, Some(round));
        console.cycle_finished(&CycleReport {
            cycles: 2,
            completed_cycles: 2,
            sessions: Vec::new(),
            cancelled: false,
        });

        let out = output(console);
        assert!(out.contains("🍅 Starting 2 Pomodoro cycles (25m work, 5m break)"));
        assert!(out.contains("--- Cycle 1/2 ---"));
        assert!(out.contains("🍅 Starting 25-minute Work session..."));
        assert!(out.contains("☕ Starting 5-minute Break session..."));
        assert!(!out.contains("Time for a break."));
        assert!(out.contains("All Pomodoro cycles completed"));
    }

    #[test]
    fn cancel_prints_message() {
        let mut console = Console::new(Vec::new());
        console.session_started(&work(25), None);
        console.on_cancel(Duration::from_secs(10));
        console.on_tick(&Tick {
            elapsed: Duration::from_secs(11),
            total: Duration::from_secs(1500),
        });

        let out = output(console);
        assert!(out.ends_with("Session cancelled.\n"));
    }
}
