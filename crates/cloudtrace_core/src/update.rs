use crate::{
    progress_view, resolve, AppState, Effect, FailureReason, JobRequest, Msg, Phase, Resolution,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageLoaded => vec![Effect::CheckStatus],
        Msg::SubmitClicked {
            providers,
            num_runs,
        } => {
            // The submit control is disabled while a job is in flight.
            if state.phase().is_active() {
                return (state, Vec::new());
            }
            match JobRequest::from_form(providers, num_runs) {
                Ok(request) => {
                    state.begin_submission(&request);
                    vec![Effect::SubmitJob(request)]
                }
                Err(err) => {
                    state.reject_form(err);
                    Vec::new()
                }
            }
        }
        // The poller arms its own timer once the server accepts the job.
        Msg::StartAccepted => Vec::new(),
        Msg::StartFailed { message } => {
            if state.phase() == Phase::Starting {
                state.show_error(&FailureReason::StartFailed(message));
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            }
        }
        Msg::InitialStatusReceived { snapshot, now_secs } => {
            if snapshot.running && state.phase() == Phase::Idle {
                let progress = snapshot
                    .progress
                    .as_ref()
                    .map(|info| progress_view(info, now_secs));
                state.show_running(progress);
                vec![Effect::StartPolling]
            } else {
                Vec::new()
            }
        }
        Msg::StatusReceived { snapshot, now_secs } => {
            if !state.phase().is_active() {
                // Late tick after the job already finished.
                return (state, Vec::new());
            }
            match resolve(&snapshot, now_secs) {
                Resolution::Running(progress) => {
                    state.show_running(progress);
                    Vec::new()
                }
                Resolution::Complete => {
                    state.show_completion();
                    vec![Effect::StopPolling]
                }
                Resolution::Failed(reason) => {
                    state.show_error(&reason);
                    vec![Effect::StopPolling]
                }
                Resolution::Unchanged => Vec::new(),
            }
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}
