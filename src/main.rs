mod config;
mod countdown;
mod duration;
mod error;
mod logging;
mod render;
mod session;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::config::Config;
use crate::countdown::CancelSignal;
use crate::error::AppError;
use crate::logging::LogFormat;
use crate::render::Console;
use crate::session::{CyclePlan, Session, SessionKind, SessionObserver};

/// Exit status after Ctrl-C, as shells report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "pomodoro", about = "A CLI Pomodoro timer", version)]
struct Cli {
    /// Config file (default: <config dir>/pomodoro/config.toml)
    #[arg(long, global = true, env = "POMODORO_CONFIG")]
    config: Option<PathBuf>,

    /// Progress refresh interval in whole seconds (e.g. 1s, 5s); overrides the config
    #[arg(long, global = true)]
    tick: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a work session
    Work(MinutesArgs),
    /// Start a break session
    Break(MinutesArgs),
    /// Run a full Pomodoro cycle
    Cycle(CycleArgs),
}

#[derive(Args)]
struct MinutesArgs {
    /// Duration of the session in minutes (default: 25 for work, 5 for breaks)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    minutes: Option<u32>,
}

#[derive(Args)]
struct CycleArgs {
    /// Duration of work sessions in minutes (default: 25)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    work: Option<u32>,

    /// Duration of break sessions in minutes (default: 5)
    #[arg(short = 'b', long = "break", value_parser = clap::value_parser!(u32).range(1..))]
    rest: Option<u32>,

    /// Number of work/break cycles to complete (default: 4)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    cycles: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init(cli.log_format, cli.verbose, cli.quiet);

    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::debug!(error = ?e, "pomodoro failed");
        eprintln!("Error: {e}");
    }
    ExitCode::from(exit_status(&result))
}

/// 0 when the run finished, 130 when interrupted, 1 on error.
fn exit_status(result: &Result<bool, AppError>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => EXIT_INTERRUPTED,
        Err(_) => 1,
    }
}

async fn run(cli: Cli) -> Result<bool, AppError> {
    let config = Config::load(cli.config.as_deref())?;
    let tick = tick_interval(cli.tick.as_deref(), &config)?;

    let (handle, cancel) = CancelSignal::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            handle.cancel();
        }
    });

    execute(cli.command, &config, tick, &mut Console::stdout(), &cancel).await
}

/// Returns `Ok(false)` when the run was cancelled.
async fn execute<O>(
    command: Commands,
    config: &Config,
    tick: Duration,
    console: &mut O,
    cancel: &CancelSignal,
) -> Result<bool, AppError>
where
    O: SessionObserver,
{
    let completed = match command {
        Commands::Work(args) => {
            let work =
                Session::from_minutes(SessionKind::Work, args.minutes.unwrap_or(config.work));
            session::run_session(&work, tick, console, cancel)
                .await?
                .completed()
        }
        Commands::Break(args) => {
            let rest = Session::from_minutes(
                SessionKind::Break,
                args.minutes.unwrap_or(config.break_minutes),
            );
            session::run_session(&rest, tick, console, cancel)
                .await?
                .completed()
        }
        Commands::Cycle(args) => {
            let plan = CyclePlan::from_minutes(
                args.work.unwrap_or(config.work),
                args.rest.unwrap_or(config.break_minutes),
                args.cycles.unwrap_or(config.cycles),
            )?;
            !session::run_cycle(&plan, tick, console, cancel)
                .await?
                .cancelled
        }
    };

    Ok(completed)
}

fn tick_interval(flag: Option<&str>, config: &Config) -> Result<Duration, AppError> {
    match flag {
        Some(raw) => duration::parse(raw).map_err(AppError::Tick),
        None => Ok(config.tick_interval()?),
    }
}
