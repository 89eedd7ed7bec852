use crate::Phase;

pub const SUBMIT_LABEL: &str = "Start Benchmark";
pub const STARTING_LABEL: &str = "Starting...";
/// Link target shown once results are available.
pub const RESULTS_LINK: &str = "/visualize";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressView {
    /// Bar fill, always within 0..=100.
    pub percent: f64,
    pub status_text: String,
    pub details: String,
    pub elapsed_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTone {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    pub tone: AlertTone,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitView {
    pub enabled: bool,
    pub label: &'static str,
}

impl Default for SubmitView {
    fn default() -> Self {
        Self {
            enabled: true,
            label: SUBMIT_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub progress_visible: bool,
    pub progress: Option<ProgressView>,
    pub alert: Option<AlertView>,
    pub success_visible: bool,
    pub submit: SubmitView,
    /// One-off message for the user, such as a rejected form.
    pub notice: Option<String>,
}
