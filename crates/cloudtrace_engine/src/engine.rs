use std::io;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use cloudtrace_core::JobRequest;
use cloudtrace_logging::{ct_error, ct_warn};

use crate::poller::{system_clock, ChannelEventSink, Clock, EventSink, StatusPoller};
use crate::{ApiError, BenchmarkApi, ClientSettings, EngineEvent, ReqwestBenchmarkApi};

enum EngineCommand {
    CheckStatus,
    Submit(JobRequest),
    StartPolling,
    StopPolling,
}

/// Runs a [`StatusPoller`] on a background tokio runtime.
///
/// Commands are applied in the order they are sent; results come back as
/// [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let interval = settings.poll_interval;
        let api = Arc::new(ReqwestBenchmarkApi::new(settings)?);
        Ok(Self::with_api(api, interval, system_clock()))
    }

    pub fn with_api(api: Arc<dyn BenchmarkApi>, interval: Duration, clock: Clock) -> Self {
        Self::spawn(api, interval, clock, tokio::runtime::Runtime::new)
    }

    fn spawn<F>(
        api: Arc<dyn BenchmarkApi>,
        interval: Duration,
        clock: Clock,
        build_runtime: F,
    ) -> Self
    where
        F: FnOnce() -> io::Result<tokio::runtime::Runtime> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::spawn(move || {
            let runtime = match build_runtime() {
                Ok(runtime) => runtime,
                Err(err) => {
                    ct_error!("Failed to start engine runtime: {}", err);
                    sink.emit(EngineEvent::Unavailable(err.to_string()));
                    return;
                }
            };
            let _enter = runtime.enter();
            let poller =
                Arc::new(StatusPoller::new(api, sink.clone(), interval).with_clock(clock));

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    // Timer changes happen inline so they keep command order.
                    EngineCommand::StartPolling => poller.start_polling(),
                    EngineCommand::StopPolling => poller.stop(),
                    EngineCommand::CheckStatus => {
                        let poller = poller.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let event = match poller.check_status().await {
                                Ok(snapshot) => EngineEvent::InitialStatus {
                                    snapshot,
                                    observed_at: poller.now(),
                                },
                                Err(err) => {
                                    ct_warn!("Initial status check failed: {}", err);
                                    EngineEvent::StatusCheckFailed(err)
                                }
                            };
                            sink.emit(event);
                        });
                    }
                    EngineCommand::Submit(request) => {
                        let poller = poller.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let event = match poller.start(&request).await {
                                Ok(accepted) => EngineEvent::StartAccepted(accepted),
                                Err(err) => EngineEvent::StartFailed(err),
                            };
                            sink.emit(event);
                        });
                    }
                }
            }

            poller.stop();
        });

        Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        }
    }

    pub fn check_status(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CheckStatus);
    }

    pub fn submit(&self, request: JobRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit(request));
    }

    pub fn start_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling);
    }

    pub fn stop_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.events().try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.recv_event(timeout).ok()
    }

    /// Like [`Self::recv_timeout`], but tells a quiet engine from a stopped one.
    pub fn recv_event(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.events().recv_timeout(timeout)
    }

    fn events(&self) -> MutexGuard<'_, mpsc::Receiver<EngineEvent>> {
        self.event_rx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
