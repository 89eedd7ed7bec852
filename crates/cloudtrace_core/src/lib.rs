//! CloudTrace core: pure dashboard state machine and status resolution.
mod effect;
mod msg;
mod request;
mod resolve;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use request::{
    provider_display_name, JobRequest, ValidationError, DEFAULT_NUM_RUNS, PROVIDERS,
};
pub use resolve::{
    clamp_percent, format_elapsed, progress_view, resolve, FailureReason, Resolution,
    RESULTS_MISSING, UNKNOWN_ERROR,
};
pub use snapshot::{ProgressInfo, ProgressStatus, StatusSnapshot};
pub use state::{AppState, Phase};
pub use update::update;
pub use view_model::{
    AlertTone, AlertView, AppViewModel, ProgressView, SubmitView, RESULTS_LINK, STARTING_LABEL,
    SUBMIT_LABEL,
};
