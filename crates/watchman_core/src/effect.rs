use crate::{JobId, PollId, SubmissionId, VideoFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Multipart upload of `file` for the given submission.
    Upload {
        submission: SubmissionId,
        file: VideoFile,
    },
    /// Spawn the single poller bound to `job_id`.
    StartPolling { poll: PollId, job_id: JobId },
    /// Hand the processed video to the presentation boundary.
    SaveArtifact { job_id: JobId, bytes: Vec<u8> },
    LoadSavingState,
    SetSaving { enable: bool },
    ListFootages,
    FetchFootage { name: String },
    SaveFootage { name: String, bytes: Vec<u8> },
}
