use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use finder_core::{update, AppState, DispatchState, Effect, JobStatus, Msg, Tab};
use finder_engine::{ApiSettings, EngineHandle, EngineStopped};
use finder_logging::{finder_debug, finder_info};

use super::effects::EffectRunner;
use super::{logging, ui};
use crate::cli::{Cli, Command};

const EVENT_WAIT: Duration = Duration::from_millis(100);

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::initialize(cli.log.into(), logging::level_for(cli.verbose, cli.quiet));

    let settings = ApiSettings::new(&cli.api_url).context("invalid --api-url")?;
    let (opening, goal) = opening_messages(&cli.command)?;
    finder_info!(
        "Using backend {} (output dir {})",
        settings.base_url(),
        cli.output_dir.display()
    );

    let state = AppState::with_api_base(settings.base_url());
    let engine = EngineHandle::new(settings, cli.output_dir)?;
    let mut session = Session::new(state, EffectRunner::new(engine), goal);

    for msg in opening {
        session.dispatch(msg);
    }
    session.run_to_completion()?;
    Ok(session.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    /// One find or verify round trip.
    Single,
    /// Follow a bulk job until it stops, optionally saving its results.
    Bulk { download: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadProgress {
    NotRequested,
    InFlight,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Wait,
    Download,
    Done,
}

/// Messages that replay the user's command against a fresh state.
fn opening_messages(command: &Command) -> anyhow::Result<(Vec<Msg>, Goal)> {
    let opening = match command {
        Command::Find(args) => (
            vec![
                Msg::TabSelected(Tab::Find),
                Msg::FindSubmitted(args.to_request()?),
            ],
            Goal::Single,
        ),
        Command::Verify(args) => (
            vec![
                Msg::TabSelected(Tab::Verify),
                Msg::VerifySubmitted(args.to_request()),
            ],
            Goal::Single,
        ),
        Command::Bulk(args) => (
            vec![
                Msg::TabSelected(Tab::Bulk),
                Msg::CsvTypeSelected(args.kind.into()),
                Msg::BulkOptionsChanged(args.options()),
                Msg::CsvFileSelected(Some(args.file.clone())),
                Msg::BulkSubmitClicked,
            ],
            Goal::Bulk {
                download: args.download,
            },
        ),
    };
    Ok(opening)
}

fn next_step(state: &AppState, goal: Goal, download: DownloadProgress) -> Step {
    match goal {
        Goal::Single => {
            if matches!(state.dispatch(), DispatchState::Loading { .. }) {
                Step::Wait
            } else {
                Step::Done
            }
        }
        Goal::Bulk { download: wanted } => {
            if state.is_submitting() || state.active_poll().is_some() {
                return Step::Wait;
            }
            let completed = state
                .job()
                .is_some_and(|job| job.status == JobStatus::Completed);
            match download {
                DownloadProgress::InFlight => Step::Wait,
                DownloadProgress::NotRequested
                    if wanted && completed && state.error().is_none() =>
                {
                    Step::Download
                }
                _ => Step::Done,
            }
        }
    }
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    goal: Goal,
    download: DownloadProgress,
    shown: Vec<String>,
}

impl Session {
    fn new(state: AppState, runner: EffectRunner, goal: Goal) -> Self {
        Self {
            state,
            runner,
            goal,
            download: DownloadProgress::NotRequested,
            shown: Vec::new(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        if matches!(msg, Msg::DownloadFinished(_)) {
            self.download = DownloadProgress::Finished;
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if effects
            .iter()
            .any(|effect| matches!(effect, Effect::Download { .. }))
        {
            self.download = DownloadProgress::InFlight;
        }
        if state.consume_dirty() {
            self.render(&state);
        }
        self.state = state;
        self.runner.run(effects);
    }

    fn render(&mut self, state: &AppState) {
        let lines = ui::render::render(&state.view());
        for line in ui::render::fresh_lines(&self.shown, &lines) {
            println!("{line}");
        }
        self.shown = lines;
    }

    fn run_to_completion(&mut self) -> Result<(), EngineStopped> {
        loop {
            match next_step(&self.state, self.goal, self.download) {
                Step::Done => return Ok(()),
                Step::Download => {
                    // A refused click (results not ready) still ends the run.
                    self.download = DownloadProgress::Finished;
                    self.dispatch(Msg::DownloadClicked);
                }
                Step::Wait => {
                    if let Some(msg) = self.runner.next_msg(EVENT_WAIT)? {
                        finder_debug!("Engine message {:?}", msg);
                        self.dispatch(msg);
                    }
                }
            }
        }
    }

    /// Stops background polling and maps the outcome to an exit code.
    fn finish(mut self) -> ExitCode {
        self.dispatch(Msg::Teardown);
        if self.state.error().is_some() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
