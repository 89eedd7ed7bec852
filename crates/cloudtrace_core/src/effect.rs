use crate::JobRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckStatus,
    SubmitJob(JobRequest),
    /// Replace any running poll timer with a fresh one.
    StartPolling,
    StopPolling,
}
