use serde::{Deserialize, Serialize};

/// Job status reported by the benchmark server in `progress.status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgressStatus {
    Running,
    Complete,
    Error,
    /// Any status string the dashboard has no rule for.
    Other(String),
}

impl From<String> for ProgressStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => ProgressStatus::Running,
            "complete" => ProgressStatus::Complete,
            "error" => ProgressStatus::Error,
            _ => ProgressStatus::Other(value),
        }
    }
}

impl From<ProgressStatus> for String {
    fn from(value: ProgressStatus) -> Self {
        match value {
            ProgressStatus::Running => "running".to_string(),
            ProgressStatus::Complete => "complete".to_string(),
            ProgressStatus::Error => "error".to_string(),
            ProgressStatus::Other(other) => other,
        }
    }
}

/// The `progress` record of a status payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressInfo {
    #[serde(default)]
    pub status: Option<ProgressStatus>,
    /// Percentage in 0..=100; the server does not guarantee the range.
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_provider: Option<String>,
    #[serde(default)]
    pub completed: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    /// Job start as fractional epoch seconds.
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressInfo {
    pub fn has_status(&self, status: &ProgressStatus) -> bool {
        self.status.as_ref() == Some(status)
    }
}

/// One point-in-time payload of `GET /benchmark/status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub progress: Option<ProgressInfo>,
    /// Opaque record of the previous run; only its presence matters.
    #[serde(default)]
    pub last_run: Option<serde_json::Value>,
    #[serde(default)]
    pub results_file_exists: Option<bool>,
    #[serde(default)]
    pub results_file_size: Option<u64>,
}

impl StatusSnapshot {
    pub fn progress_status(&self) -> Option<&ProgressStatus> {
        self.progress.as_ref().and_then(|p| p.status.as_ref())
    }

    /// `last_run` counts as present only when it carries a truthy value.
    pub fn has_last_run(&self) -> bool {
        match &self.last_run {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(_) => true,
        }
    }

    pub fn has_results(&self) -> bool {
        self.results_file_exists.unwrap_or(false) && self.results_file_size.unwrap_or(0) > 0
    }
}
