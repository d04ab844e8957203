use crate::{PollId, SubmissionError, SubmissionId, UploadReceipt, VideoFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a video to submit.
    FileSelected(VideoFile),
    /// Upload request finished for a submission.
    UploadFinished {
        submission: SubmissionId,
        result: Result<UploadReceipt, SubmissionError>,
    },
    /// A non-terminal status query came back; the poller keeps running.
    PollAttempted { poll: PollId, attempt: u32 },
    /// The poller reached its terminal outcome.
    PollFinished {
        poll: PollId,
        result: Result<Vec<u8>, SubmissionError>,
    },
    /// Processed video written by the presentation boundary.
    ArtifactSaved(Result<String, String>),
    /// Startup: read the live saving flag once.
    Initialize,
    SavingStateLoaded(Result<bool, String>),
    /// User toggled live saving.
    ToggleSavingClicked,
    /// A toggle request completed; `enable` is the value it asked for.
    SavingToggled { enable: bool, succeeded: bool },
    LoadFootages,
    FootagesLoaded(Result<Vec<String>, String>),
    FootageSelected(String),
    FootageFetched {
        name: String,
        result: Result<Vec<u8>, String>,
    },
    FootageSaved(Result<String, String>),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
