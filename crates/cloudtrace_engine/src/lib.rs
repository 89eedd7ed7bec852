//! CloudTrace engine: benchmark server client and status polling.
mod api;
mod engine;
mod poller;
mod types;

pub use api::{
    BenchmarkApi, ClientSettings, ReqwestBenchmarkApi, DEFAULT_SERVER_URL, START_PATH,
    STATUS_PATH,
};
pub use engine::EngineHandle;
pub use poller::{system_clock, ChannelEventSink, Clock, EventSink, StatusPoller};
pub use types::{Accepted, ApiError, EngineEvent, FailureKind, SubmissionError};
