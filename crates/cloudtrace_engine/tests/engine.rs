use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cloudtrace_core::{JobRequest, ProgressInfo, ProgressStatus, StatusSnapshot};
use cloudtrace_engine::{Accepted, ApiError, BenchmarkApi, EngineEvent, EngineHandle};
use serde_json::json;

const WAIT: Duration = Duration::from_secs(5);

/// Reports a running job on the first fetch and a finished one afterwards.
#[derive(Default)]
struct TwoStepApi {
    fetches: AtomicUsize,
}

#[async_trait::async_trait]
impl BenchmarkApi for TwoStepApi {
    async fn start_benchmark(&self, _request: &JobRequest) -> Result<Accepted, ApiError> {
        Ok(Accepted(json!({"ok": true})))
    }

    async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
        let first = self.fetches.fetch_add(1, Ordering::SeqCst) == 0;
        let (status, percent) = if first {
            (ProgressStatus::Running, 25.0)
        } else {
            (ProgressStatus::Complete, 100.0)
        };
        Ok(StatusSnapshot {
            running: first,
            progress: Some(ProgressInfo {
                status: Some(status),
                progress: Some(percent),
                ..ProgressInfo::default()
            }),
            ..StatusSnapshot::default()
        })
    }
}

fn engine(api: Arc<TwoStepApi>) -> EngineHandle {
    EngineHandle::with_api(api, Duration::from_millis(10), Arc::new(|| 1_700_000_000.0))
}

#[test]
fn initial_check_reports_snapshot() {
    let api = Arc::new(TwoStepApi::default());
    let engine = engine(api);

    engine.check_status();
    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::InitialStatus {
            snapshot,
            observed_at,
        }) => {
            assert!(snapshot.running);
            assert_eq!(observed_at, 1_700_000_000.0);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn submitted_job_is_polled_to_completion() {
    let api = Arc::new(TwoStepApi::default());
    let engine = engine(api.clone());

    engine.submit(JobRequest::from_form(["aws"], None).unwrap());

    let mut events = Vec::new();
    while let Some(event) = engine.recv_timeout(WAIT) {
        let done = matches!(
            &event,
            EngineEvent::Status { snapshot, .. } if !snapshot.running
        );
        events.push(event);
        if done {
            break;
        }
    }

    assert!(matches!(events.first(), Some(EngineEvent::StartAccepted(_))));
    let statuses = events
        .iter()
        .filter(|event| matches!(event, EngineEvent::Status { .. }))
        .count();
    assert_eq!(statuses, 2);

    // The timer stopped itself; nothing else arrives.
    assert!(engine.recv_timeout(Duration::from_millis(100)).is_none());
    assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
}
