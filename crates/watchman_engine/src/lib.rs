//! Watchman engine: HTTP client, job poller and effect execution.
mod api;
mod engine;
mod persist;
mod poller;
mod settings;
mod types;

pub use api::{AnalysisApi, ReqwestApi};
pub use engine::{EngineError, EngineHandle};
pub use persist::{ensure_output_dir, safe_file_name, AtomicFileWriter, PersistError};
pub use poller::{JobPoller, PollOutcome};
pub use settings::{ClientSettings, PollSettings, ServiceMode};
pub use types::{
    ApiError, Artifact, ChannelEventSink, EngineEvent, EventSink, FailureKind, JobId, JobStatus,
    PollId, PollProgress, Ticket, UploadFile, UploadResponse,
};
