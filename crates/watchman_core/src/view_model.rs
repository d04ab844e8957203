use crate::{FileInfo, JobId, SubmissionResult, SubmissionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub submission: SubmissionView,
    pub live: LiveView,
    pub footages: FootageView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionView {
    pub status: SubmissionStatus,
    pub file: Option<FileInfo>,
    pub job_id: Option<JobId>,
    /// User-facing failure text, present only when the submission failed.
    pub error: Option<String>,
    pub result: Option<SubmissionResult>,
    pub saved_to: Option<String>,
    pub save_error: Option<String>,
    pub poll_attempts: u32,
    /// False while a job is being processed; new files are rejected then.
    pub accepting_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveView {
    pub saving_enabled: bool,
    pub status_known: bool,
    pub status_error: Option<String>,
    pub toggle_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FootageView {
    pub names: Vec<String>,
    pub selected: Option<String>,
    pub loaded: bool,
    pub error: Option<String>,
    pub saved_to: Option<String>,
}
