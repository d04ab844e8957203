//! Watchman core: pure state machine and view-model helpers.
mod effect;
mod error;
mod live;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{SubmissionError, UPLOAD_FAILED_MESSAGE};
pub use live::{toggle_target, toggle_transition, LiveSession};
pub use msg::Msg;
pub use state::{
    AppState, FileInfo, FootageBrowser, JobId, PollId, Submission, SubmissionId,
    SubmissionResult, SubmissionStatus, UploadReceipt, VideoFile,
};
pub use update::update;
pub use view_model::{AppViewModel, FootageView, LiveView, SubmissionView};
