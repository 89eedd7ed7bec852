use crate::StatusSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Dashboard opened; triggers the one-shot status check.
    PageLoaded,
    /// User submitted the benchmark form.
    SubmitClicked {
        providers: Vec<String>,
        num_runs: Option<u32>,
    },
    /// Server acknowledged the start request.
    StartAccepted,
    /// Start request failed; `message` is the server's, when it sent one.
    StartFailed { message: Option<String> },
    /// Result of the on-load status check.
    InitialStatusReceived {
        snapshot: StatusSnapshot,
        now_secs: f64,
    },
    /// Result of a poll tick.
    StatusReceived {
        snapshot: StatusSnapshot,
        now_secs: f64,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
}
