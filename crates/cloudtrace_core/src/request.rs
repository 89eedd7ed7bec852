use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Run count used when the form leaves it empty.
pub const DEFAULT_NUM_RUNS: u32 = 3;

/// Providers the benchmark server knows about, with their display names.
pub const PROVIDERS: &[(&str, &str)] = &[
    ("aws", "Amazon Web Services"),
    ("azure", "Microsoft Azure"),
    ("gcp", "Google Cloud Platform"),
];

pub fn provider_display_name(key: &str) -> Option<&'static str> {
    PROVIDERS
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least one cloud provider")]
    NoProviders,
    #[error("Number of runs must be at least 1")]
    ZeroRuns,
}

/// Body of `POST /benchmark`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub providers: Vec<String>,
    pub num_runs: u32,
}

impl JobRequest {
    /// Builds a request from raw form input.
    ///
    /// Provider keys are trimmed, blanks dropped and duplicates removed while
    /// keeping the first occurrence. A missing or zero run count falls back to
    /// [`DEFAULT_NUM_RUNS`].
    pub fn from_form<I, S>(providers: I, num_runs: Option<u32>) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<String> = Vec::new();
        for key in providers {
            let key = key.as_ref().trim();
            if key.is_empty() || selected.iter().any(|existing| existing == key) {
                continue;
            }
            selected.push(key.to_string());
        }

        let request = Self {
            providers: selected,
            num_runs: num_runs.filter(|n| *n > 0).unwrap_or(DEFAULT_NUM_RUNS),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.providers.is_empty() {
            return Err(ValidationError::NoProviders);
        }
        if self.num_runs == 0 {
            return Err(ValidationError::ZeroRuns);
        }
        Ok(())
    }
}
