use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cloudtrace_core::{Effect, Msg};
use cloudtrace_engine::{EngineEvent, EngineHandle};
use cloudtrace_logging::{ct_debug, ct_info, ct_warn};

use super::app::ShellEvent;

/// How long the forwarding thread waits for an engine event before re-checking.
const EVENT_WAIT: Duration = Duration::from_millis(50);

pub struct EffectRunner {
    engine: Arc<EngineHandle>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, shell_tx: mpsc::Sender<ShellEvent>) -> Self {
        let runner = Self {
            engine: Arc::new(engine),
        };
        runner.spawn_event_loop(shell_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CheckStatus => {
                    ct_debug!("Checking benchmark status");
                    self.engine.check_status();
                }
                Effect::SubmitJob(request) => {
                    ct_info!(
                        "Submitting benchmark providers={} num_runs={}",
                        request.providers.join(","),
                        request.num_runs
                    );
                    self.engine.submit(request);
                }
                Effect::StartPolling => self.engine.start_polling(),
                Effect::StopPolling => self.engine.stop_polling(),
            }
        }
    }

    fn spawn_event_loop(&self, shell_tx: mpsc::Sender<ShellEvent>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            let event = match engine.recv_event(EVENT_WAIT) {
                Ok(event) => event,
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            };
            if shell_tx.send(map_event(event)).is_err() {
                break;
            }
        });
    }
}

fn map_event(event: EngineEvent) -> ShellEvent {
    match event {
        EngineEvent::InitialStatus {
            snapshot,
            observed_at,
        } => ShellEvent::Msg(Msg::InitialStatusReceived {
            snapshot,
            now_secs: observed_at,
        }),
        EngineEvent::StatusCheckFailed(err) => ShellEvent::InitialCheckFailed(err.to_string()),
        EngineEvent::Status {
            snapshot,
            observed_at,
        } => ShellEvent::Msg(Msg::StatusReceived {
            snapshot,
            now_secs: observed_at,
        }),
        EngineEvent::StartAccepted(accepted) => {
            ct_debug!("Benchmark started: {}", accepted.0);
            ShellEvent::Msg(Msg::StartAccepted)
        }
        EngineEvent::Unavailable(message) => ShellEvent::EngineStopped(message),
        EngineEvent::StartFailed(err) => {
            ct_warn!("Error starting benchmark: {}", err);
            ShellEvent::Msg(Msg::StartFailed {
                message: err.user_message(),
            })
        }
    }
}
