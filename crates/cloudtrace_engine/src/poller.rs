//! Status polling timer.
//!
//! [`StatusPoller`] owns the only polling timer the dashboard ever runs. The
//! timer is a tokio task paired with a [`CancellationToken`]; arming a new
//! one cancels the previous token first, so two timers never coexist.

use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use cloudtrace_core::{resolve, JobRequest, StatusSnapshot};
use cloudtrace_logging::{ct_debug, ct_info, ct_warn};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Accepted, ApiError, BenchmarkApi, EngineEvent, SubmissionError};

/// Returns the current time as fractional epoch seconds.
pub type Clock = Arc<dyn Fn() -> f64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().timestamp_millis() as f64 / 1000.0)
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

struct PollTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct StatusPoller {
    api: Arc<dyn BenchmarkApi>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    clock: Clock,
    timer: Mutex<Option<PollTimer>>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn BenchmarkApi>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            api,
            sink,
            interval: interval.max(Duration::from_millis(1)),
            clock: system_clock(),
            timer: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> f64 {
        (self.clock)()
    }

    /// Validates and submits a job; on acceptance polling (re)starts.
    ///
    /// Any timer left from an earlier job is stopped before the request goes
    /// out, so a rejected start leaves nothing polling.
    pub async fn start(&self, request: &JobRequest) -> Result<Accepted, SubmissionError> {
        request.validate()?;
        self.stop();

        ct_info!(
            "Starting benchmark providers={:?} num_runs={}",
            request.providers,
            request.num_runs
        );
        let accepted = self.api.start_benchmark(request).await.map_err(|err| {
            ct_warn!("Benchmark start failed: {}", err);
            SubmissionError::from(err)
        })?;
        self.start_polling();
        Ok(accepted)
    }

    /// Arms a fresh timer, cancelling any existing one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_polling(&self) {
        let mut slot = self.lock_timer();
        if let Some(previous) = slot.take() {
            ct_debug!("Replacing existing poll timer");
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_poll_loop(
            self.api.clone(),
            self.sink.clone(),
            self.clock.clone(),
            self.interval,
            cancel.clone(),
        ));
        *slot = Some(PollTimer { cancel, task });
        ct_debug!("Poll timer armed interval={:?}", self.interval);
    }

    /// Cancels the timer. Safe to call when nothing is polling.
    pub fn stop(&self) {
        if let Some(timer) = self.lock_timer().take() {
            timer.cancel.cancel();
            ct_debug!("Poll timer cancelled");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|timer| !timer.cancel.is_cancelled() && !timer.task.is_finished())
    }

    /// One-shot status fetch, used when the dashboard opens.
    pub async fn check_status(&self) -> Result<StatusSnapshot, ApiError> {
        self.api.fetch_status().await
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<PollTimer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poll_loop(
    api: Arc<dyn BenchmarkApi>,
    sink: Arc<dyn EventSink>,
    clock: Clock,
    interval: Duration,
    cancel: CancellationToken,
) {
    // First tick one interval after arming.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    // A slow fetch pushes the schedule back instead of bunching ticks up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.fetch_status() => result,
        };

        match result {
            Ok(snapshot) => {
                let observed_at = clock();
                let terminal = resolve(&snapshot, observed_at).is_terminal();
                sink.emit(EngineEvent::Status {
                    snapshot,
                    observed_at,
                });
                if terminal {
                    ct_info!("Benchmark reached a terminal state; polling stopped");
                    break;
                }
            }
            Err(err) => {
                ct_warn!("Status poll failed, retrying next tick: {}", err);
            }
        }
    }
}
