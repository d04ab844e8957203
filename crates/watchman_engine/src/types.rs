use std::fmt;

use thiserror::Error;

use crate::poller::PollOutcome;

pub type JobId = String;
pub type PollId = u64;
/// Caller-chosen tag echoed back with an upload result.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Parsed body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResponse {
    Job { job_id: JobId },
    Stored { video_path: String },
}

/// Binary body returned for a finished job or a saved footage segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Answer to a single status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Ready(Artifact),
    NotFound,
    /// Anything that is neither a result nor a missing job; keep polling.
    Pending { status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProgress {
    pub poll: PollId,
    pub job_id: JobId,
    pub attempt: u32,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadCompleted {
        ticket: Ticket,
        result: Result<UploadResponse, ApiError>,
    },
    PollProgress(PollProgress),
    PollCompleted {
        poll: PollId,
        job_id: JobId,
        outcome: PollOutcome,
    },
    SavingState(Result<bool, ApiError>),
    SavingToggled {
        enable: bool,
        result: Result<(), ApiError>,
    },
    FootagesListed(Result<Vec<String>, ApiError>),
    FootageFetched {
        name: String,
        result: Result<Artifact, ApiError>,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, FailureKind::Timeout | FailureKind::Network)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
