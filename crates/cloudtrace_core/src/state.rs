use crate::view_model::{AlertTone, AlertView, AppViewModel, ProgressView, SubmitView};
use crate::view_model::{RESULTS_LINK, STARTING_LABEL};
use crate::{FailureReason, JobRequest, ValidationError};

/// Coarse UI state derived from the latest snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Starting,
    Running,
    Complete,
    Error,
}

impl Phase {
    /// Complete and Error end polling until a new job is started.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }

    /// A job has been submitted or observed and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Starting | Phase::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    phase: Phase,
    progress_visible: bool,
    progress: Option<ProgressView>,
    alert: Option<AlertView>,
    success_visible: bool,
    submit: SubmitView,
    notice: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            progress_visible: self.progress_visible,
            progress: self.progress.clone(),
            alert: self.alert.clone(),
            success_visible: self.success_visible,
            submit: self.submit.clone(),
            notice: self.notice.clone(),
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn reject_form(&mut self, error: ValidationError) {
        self.notice = Some(error.to_string());
        self.dirty = true;
    }

    pub(crate) fn begin_submission(&mut self, request: &JobRequest) {
        self.phase = Phase::Starting;
        self.notice = None;
        self.submit = SubmitView {
            enabled: false,
            label: STARTING_LABEL,
        };
        self.progress_visible = true;
        self.progress = Some(ProgressView {
            percent: 0.0,
            status_text: "Initializing... (0%)".to_string(),
            details: "Starting benchmark...".to_string(),
            elapsed_secs: None,
        });
        self.alert = Some(AlertView {
            tone: AlertTone::Info,
            title: "Benchmark Running...".to_string(),
            body: format!(
                "Running benchmark for {} provider(s) with {} runs each.",
                request.providers.len(),
                request.num_runs
            ),
            link: None,
        });
        self.success_visible = false;
        self.dirty = true;
    }

    /// Enters Running; a `None` progress keeps the current bar.
    pub(crate) fn show_running(&mut self, progress: Option<ProgressView>) {
        self.phase = Phase::Running;
        self.progress_visible = true;
        self.submit.enabled = false;
        if self.alert.is_none() {
            self.alert = Some(AlertView {
                tone: AlertTone::Info,
                title: "Benchmark Running...".to_string(),
                body: "A benchmark is in progress.".to_string(),
                link: None,
            });
        }
        if let Some(progress) = progress {
            self.progress = Some(progress);
        }
        self.dirty = true;
    }

    pub(crate) fn show_completion(&mut self) {
        self.phase = Phase::Complete;
        self.progress_visible = true;
        let elapsed_secs = self.progress.as_ref().and_then(|p| p.elapsed_secs);
        self.progress = Some(ProgressView {
            percent: 100.0,
            status_text: "Complete (100%)".to_string(),
            details: "Benchmark complete! Results ready to view.".to_string(),
            elapsed_secs,
        });
        self.alert = Some(AlertView {
            tone: AlertTone::Success,
            title: "Benchmark Complete!".to_string(),
            body: "The benchmark has completed successfully.".to_string(),
            link: Some(RESULTS_LINK.to_string()),
        });
        self.success_visible = true;
        self.submit = SubmitView::default();
        self.dirty = true;
    }

    pub(crate) fn show_error(&mut self, reason: &FailureReason) {
        self.phase = Phase::Error;
        self.alert = Some(AlertView {
            tone: AlertTone::Danger,
            title: "Benchmark Error".to_string(),
            body: reason.to_string(),
            link: None,
        });
        self.submit = SubmitView::default();
        self.dirty = true;
    }
}
