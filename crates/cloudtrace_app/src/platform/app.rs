use std::io::{self, IsTerminal};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cloudtrace_core::{update, AppState, AppViewModel, Effect, Msg, Phase};
use cloudtrace_engine::EngineHandle;
use cloudtrace_logging::{ct_info, ct_warn};

use super::effects::EffectRunner;
use super::ui::render::{redraw_in_place, TerminalRenderer};
use crate::config::{RunOptions, Submission};

/// Redraw cadence; frames are only written when the view changed.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

pub(crate) enum ShellEvent {
    Msg(Msg),
    /// The status check on load failed; the dashboard stays idle.
    InitialCheckFailed(String),
    /// The engine is gone; nothing sent to it will be answered.
    EngineStopped(String),
}

/// How a dashboard session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
    /// The form was rejected before anything was sent.
    Rejected,
    /// No benchmark was running and none was started.
    Idle,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Completed | Outcome::Idle => 0,
            Outcome::Failed => 1,
            Outcome::Rejected => 2,
        }
    }
}

pub fn run_app(options: RunOptions) -> Result<Outcome> {
    let link_base = options.settings.base_url.to_string();
    let engine = EngineHandle::new(options.settings).context("failed to build HTTP client")?;

    let (shell_tx, shell_rx) = mpsc::channel::<ShellEvent>();
    let runner = EffectRunner::new(engine, shell_tx.clone());

    // Background tick to throttle rendering.
    thread::spawn(move || {
        while shell_tx.send(ShellEvent::Msg(Msg::Tick)).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    let stdout = io::stdout();
    let in_place = redraw_in_place(stdout.is_terminal(), io::stderr().is_terminal());
    let mut renderer = TerminalRenderer::new(stdout, link_base, in_place);

    let mut shell = Shell::new(options.submission);
    runner.enqueue(shell.dispatch(Msg::PageLoaded));
    renderer.draw(&shell.view())?;

    loop {
        let event = shell_rx
            .recv()
            .context("dashboard event channel closed")?;
        let effects = shell.handle(event);
        if let Some(message) = shell.engine_failure.take() {
            bail!("benchmark engine stopped: {message}");
        }
        runner.enqueue(effects);

        if let Some(outcome) = shell.outcome() {
            renderer.draw(&shell.view())?;
            ct_info!("Dashboard finished: {:?}", outcome);
            return Ok(outcome);
        }
        if shell.take_redraw() {
            renderer.draw(&shell.view())?;
        }
    }
}

/// Owns the dashboard state and the one-shot submission from the command line.
struct Shell {
    state: AppState,
    pending: Option<Submission>,
    loaded: bool,
    submitted: bool,
    redraw: bool,
    engine_failure: Option<String>,
}

impl Shell {
    fn new(pending: Option<Submission>) -> Self {
        Self {
            state: AppState::new(),
            pending,
            loaded: false,
            submitted: false,
            redraw: false,
            engine_failure: None,
        }
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn handle(&mut self, event: ShellEvent) -> Vec<Effect> {
        match event {
            ShellEvent::InitialCheckFailed(message) => {
                ct_warn!("Could not check benchmark status: {}", message);
                self.after_initial_check()
            }
            ShellEvent::EngineStopped(message) => {
                self.engine_failure = Some(message);
                Vec::new()
            }
            ShellEvent::Msg(msg) => {
                let initial = matches!(msg, Msg::InitialStatusReceived { .. });
                let tick = matches!(msg, Msg::Tick);
                let mut effects = self.dispatch(msg);
                if initial {
                    effects.extend(self.after_initial_check());
                }
                if tick && self.state.consume_dirty() {
                    self.redraw = true;
                }
                effects
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        effects
    }

    fn after_initial_check(&mut self) -> Vec<Effect> {
        self.loaded = true;
        let Some(submission) = self.pending.take() else {
            return Vec::new();
        };
        if self.state.phase() != Phase::Idle {
            ct_info!("A benchmark is already running; following it instead of starting one");
            return Vec::new();
        }

        ct_info!("Benchmarking {}", submission.provider_names().join(", "));
        for key in submission.unknown_providers() {
            ct_warn!("Provider {:?} is not in the known catalog", key);
        }
        self.submitted = true;
        self.dispatch(Msg::SubmitClicked {
            providers: submission.providers,
            num_runs: submission.num_runs,
        })
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn outcome(&self) -> Option<Outcome> {
        match self.state.phase() {
            Phase::Complete => Some(Outcome::Completed),
            Phase::Error => Some(Outcome::Failed),
            Phase::Starting | Phase::Running => None,
            Phase::Idle if !self.loaded => None,
            Phase::Idle if self.submitted && self.state.view().notice.is_some() => {
                Some(Outcome::Rejected)
            }
            Phase::Idle => Some(Outcome::Idle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudtrace_core::{JobRequest, ProgressInfo, ProgressStatus, StatusSnapshot};
    use pretty_assertions::assert_eq;

    fn submission(providers: &[&str]) -> Option<Submission> {
        Some(Submission {
            providers: providers.iter().map(|p| p.to_string()).collect(),
            num_runs: Some(2),
        })
    }

    fn status(running: bool, progress: Option<ProgressInfo>) -> StatusSnapshot {
        StatusSnapshot {
            running,
            progress,
            ..StatusSnapshot::default()
        }
    }

    fn initial(snapshot: StatusSnapshot) -> ShellEvent {
        ShellEvent::Msg(Msg::InitialStatusReceived {
            snapshot,
            now_secs: 0.0,
        })
    }

    #[test]
    fn submits_after_idle_initial_check() {
        let mut shell = Shell::new(submission(&["aws"]));
        assert_eq!(shell.dispatch(Msg::PageLoaded), vec![Effect::CheckStatus]);
        assert_eq!(shell.outcome(), None);

        let effects = shell.handle(initial(status(false, None)));
        assert_eq!(
            effects,
            vec![Effect::SubmitJob(JobRequest {
                providers: vec!["aws".into()],
                num_runs: 2,
            })]
        );
        assert_eq!(shell.state.phase(), Phase::Starting);
        assert_eq!(shell.outcome(), None);
    }

    #[test]
    fn failed_initial_check_still_submits() {
        let mut shell = Shell::new(submission(&["gcp"]));
        let effects = shell.handle(ShellEvent::InitialCheckFailed("connection refused".into()));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::SubmitJob(_)));
    }

    #[test]
    fn follows_running_job_instead_of_submitting() {
        let mut shell = Shell::new(submission(&["aws"]));
        let running = status(
            true,
            Some(ProgressInfo {
                status: Some(ProgressStatus::Running),
                progress: Some(30.0),
                ..ProgressInfo::default()
            }),
        );
        let effects = shell.handle(initial(running));
        assert_eq!(effects, vec![Effect::StartPolling]);
        assert_eq!(shell.state.phase(), Phase::Running);
        assert_eq!(shell.outcome(), None);
    }

    #[test]
    fn empty_provider_list_is_rejected() {
        let mut shell = Shell::new(submission(&[]));
        let effects = shell.handle(initial(status(false, None)));
        assert!(effects.is_empty());
        assert_eq!(shell.outcome(), Some(Outcome::Rejected));
        assert_eq!(Outcome::Rejected.exit_code(), 2);
    }

    #[test]
    fn watch_mode_with_nothing_running_is_idle() {
        let mut shell = Shell::new(None);
        assert!(shell.handle(initial(status(false, None))).is_empty());
        assert_eq!(shell.outcome(), Some(Outcome::Idle));
        assert_eq!(Outcome::Idle.exit_code(), 0);
    }

    #[test]
    fn completion_and_failure_end_the_session() {
        let mut shell = Shell::new(submission(&["aws"]));
        shell.handle(initial(status(false, None)));
        shell.handle(ShellEvent::Msg(Msg::StartAccepted));

        let done = StatusSnapshot {
            running: false,
            progress: Some(ProgressInfo {
                status: Some(ProgressStatus::Complete),
                progress: Some(100.0),
                ..ProgressInfo::default()
            }),
            results_file_exists: Some(true),
            ..StatusSnapshot::default()
        };
        let effects = shell.handle(ShellEvent::Msg(Msg::StatusReceived {
            snapshot: done,
            now_secs: 5.0,
        }));
        assert_eq!(effects, vec![Effect::StopPolling]);
        assert_eq!(shell.outcome(), Some(Outcome::Completed));

        let mut failed = Shell::new(submission(&["aws"]));
        failed.handle(initial(status(false, None)));
        failed.handle(ShellEvent::Msg(Msg::StartFailed {
            message: Some("Benchmark already running".into()),
        }));
        assert_eq!(failed.outcome(), Some(Outcome::Failed));
        assert_eq!(Outcome::Failed.exit_code(), 1);
    }

    #[test]
    fn redraw_only_on_dirty_tick() {
        let mut shell = Shell::new(None);
        shell.handle(ShellEvent::Msg(Msg::Tick));
        assert!(!shell.take_redraw());

        shell.handle(initial(status(
            true,
            Some(ProgressInfo {
                status: Some(ProgressStatus::Running),
                progress: Some(10.0),
                ..ProgressInfo::default()
            }),
        )));
        shell.handle(ShellEvent::Msg(Msg::Tick));
        assert!(shell.take_redraw());
        assert!(!shell.take_redraw());
    }

    #[test]
    fn stopped_engine_is_recorded() {
        let mut shell = Shell::new(submission(&["aws"]));
        let effects = shell.handle(ShellEvent::EngineStopped("no worker threads".into()));
        assert!(effects.is_empty());
        assert_eq!(shell.engine_failure.take().as_deref(), Some("no worker threads"));
        assert_eq!(shell.outcome(), None);
    }
}
