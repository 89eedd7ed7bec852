use std::fmt;

use crate::{ProgressInfo, ProgressStatus, ProgressView, StatusSnapshot};

pub const UNKNOWN_ERROR: &str = "Unknown error occurred";
pub const RESULTS_MISSING: &str = "Benchmark completed but results may be missing";

/// Below this percentage the job is still considered to be setting up.
const INITIALIZING_BELOW: f64 = 5.0;

/// Why a job ended in the Error phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// `progress.status == "error"`; carries `progress.error` when present.
    ServerReported(Option<String>),
    /// The job stopped but no results file was written.
    ResultsMissing,
    /// The start request failed; carries the server message when present.
    StartFailed(Option<String>),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ServerReported(Some(message))
            | FailureReason::StartFailed(Some(message)) => f.write_str(message),
            FailureReason::ServerReported(None) | FailureReason::StartFailed(None) => {
                f.write_str(UNKNOWN_ERROR)
            }
            FailureReason::ResultsMissing => f.write_str(RESULTS_MISSING),
        }
    }
}

/// Outcome of resolving one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Still working. `None` when the payload had no progress record.
    Running(Option<ProgressView>),
    Complete,
    Failed(FailureReason),
    /// Nothing matched; keep whatever is displayed.
    Unchanged,
}

impl Resolution {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Resolution::Complete | Resolution::Failed(_))
    }
}

/// Maps a status payload to a phase transition. First matching rule wins.
pub fn resolve(snapshot: &StatusSnapshot, now_secs: f64) -> Resolution {
    let status = snapshot.progress_status();

    if snapshot.running || status == Some(&ProgressStatus::Running) {
        return Resolution::Running(
            snapshot
                .progress
                .as_ref()
                .map(|info| progress_view(info, now_secs)),
        );
    }

    if let Some(info) = snapshot.progress.as_ref() {
        match status {
            Some(ProgressStatus::Complete) => {
                // A complete status below 100% gets one more tick before we
                // believe it.
                return if info.progress.unwrap_or(0.0) >= 100.0 {
                    Resolution::Complete
                } else {
                    Resolution::Running(Some(progress_view(info, now_secs)))
                };
            }
            Some(ProgressStatus::Error) => {
                return Resolution::Failed(FailureReason::ServerReported(
                    info.error.clone().filter(|e| !e.is_empty()),
                ));
            }
            _ => {}
        }
    }

    if !snapshot.running && snapshot.has_last_run() {
        return if snapshot.has_results() {
            Resolution::Complete
        } else {
            Resolution::Failed(FailureReason::ResultsMissing)
        };
    }

    Resolution::Unchanged
}

pub fn progress_view(info: &ProgressInfo, now_secs: f64) -> ProgressView {
    let percent = clamp_percent(info.progress);
    let complete = info.has_status(&ProgressStatus::Complete);
    let provider = info
        .current_provider
        .as_deref()
        .filter(|p| !p.is_empty());

    let status_text = if complete {
        "Complete (100%)".to_string()
    } else if percent < INITIALIZING_BELOW {
        "Initializing...".to_string()
    } else {
        format!("{} ({}%)", provider.unwrap_or("Processing"), percent.round())
    };

    let mut parts: Vec<String> = Vec::new();
    if complete {
        parts.push("Benchmark complete! Results ready to view.".to_string());
    } else if percent < INITIALIZING_BELOW {
        parts.push("Setting up benchmark environment...".to_string());
    } else if let Some(provider) = provider {
        let mut line = format!("Processing: {provider}");
        if let (Some(done), Some(total)) = (info.completed, info.total) {
            if done > 0 && total > 0 {
                line.push_str(&format!(" ({done}/{total})"));
            }
        }
        parts.push(line);
    }

    let elapsed_secs = info.start_time.map(|start| elapsed_seconds(start, now_secs));
    if let Some(elapsed) = elapsed_secs {
        parts.push(format!("Time elapsed: {}", format_elapsed(elapsed)));
    }

    ProgressView {
        percent,
        status_text,
        details: parts.join(" • "),
        elapsed_secs,
    }
}

pub fn clamp_percent(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

fn elapsed_seconds(start_secs: f64, now_secs: f64) -> u64 {
    let elapsed = (now_secs - start_secs).round();
    if elapsed.is_finite() && elapsed > 0.0 {
        elapsed as u64
    } else {
        0
    }
}

/// Formats a duration as `"{M}m {S}s"`.
pub fn format_elapsed(secs: u64) -> String {
    format!("{}m {}s", secs / 60, secs % 60)
}
