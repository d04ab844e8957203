use thiserror::Error;

/// Message shown when the service refuses an upload.
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload video. Please try again.";

/// Terminal failures of a submission. `Display` is the user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The upload never reached the service; the transport message is shown as-is.
    #[error("{0}")]
    UploadTransport(String),
    #[error("Failed to upload video. Please try again.")]
    UploadRejected { status: u16 },
    /// The service accepted the upload but the body held neither a job id nor a path.
    #[error("Unexpected response from the analysis service: {0}")]
    MalformedResponse(String),
    #[error("Processing failed. Please try again.")]
    JobNotFound,
    #[error("Error checking job status. Please refresh and try again.")]
    PollTransport(String),
    #[error("Processing is taking too long (gave up after {elapsed_secs}s).")]
    PollTimeout { elapsed_secs: u64 },
}

impl SubmissionError {
    /// True for failures that happen after the service handed out a job id.
    pub fn is_after_acceptance(&self) -> bool {
        matches!(
            self,
            SubmissionError::JobNotFound
                | SubmissionError::PollTransport(_)
                | SubmissionError::PollTimeout { .. }
        )
    }
}
