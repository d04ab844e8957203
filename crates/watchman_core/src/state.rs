use crate::live::LiveSession;
use crate::view_model::{AppViewModel, FootageView, SubmissionView};
use crate::SubmissionError;

/// Opaque job identifier handed out by the analysis service.
pub type JobId = String;
pub type SubmissionId = u64;
pub type PollId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Uploading,
    AwaitingResult,
    Succeeded,
    Failed,
}

/// A video selected for upload. Only travels inside messages and effects;
/// the state keeps a [`FileInfo`] summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl VideoFile {
    pub fn is_video(&self) -> bool {
        let essence = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        essence
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("video/"))
            && essence.len() > 6
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.bytes.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// What the service answered to an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadReceipt {
    /// Asynchronous service: poll this job for the result.
    Job(JobId),
    /// Synchronous service: the processed video is already stored remotely.
    Stored { video_path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Processed video downloaded from the status endpoint.
    Artifact { byte_len: u64 },
    /// Processed video stored by a synchronous service.
    RemotePath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    id: SubmissionId,
    status: SubmissionStatus,
    file: Option<FileInfo>,
    job_id: Option<JobId>,
    error: Option<SubmissionError>,
    result: Option<SubmissionResult>,
    active_poll: Option<PollId>,
    poll_attempts: u32,
    saved_to: Option<String>,
    save_error: Option<String>,
}

impl Submission {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn error(&self) -> Option<&SubmissionError> {
        self.error.as_ref()
    }

    pub fn active_poll(&self) -> Option<PollId> {
        self.active_poll
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FootageBrowser {
    pub(crate) names: Vec<String>,
    pub(crate) selected: Option<String>,
    pub(crate) loaded: bool,
    pub(crate) error: Option<String>,
    pub(crate) saved_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    submission: Submission,
    live: LiveSession,
    footages: FootageBrowser,
    next_submission_id: SubmissionId,
    next_poll_id: PollId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn live(&self) -> &LiveSession {
        &self.live
    }

    pub fn footages(&self) -> &FootageBrowser {
        &self.footages
    }

    pub fn view(&self) -> AppViewModel {
        let submission = &self.submission;
        AppViewModel {
            submission: SubmissionView {
                status: submission.status,
                file: submission.file.clone(),
                job_id: submission.job_id.clone(),
                error: submission.error.as_ref().map(ToString::to_string),
                result: submission.result.clone(),
                saved_to: submission.saved_to.clone(),
                save_error: submission.save_error.clone(),
                poll_attempts: submission.poll_attempts,
                accepting_files: submission.status != SubmissionStatus::AwaitingResult,
            },
            live: self.live.view(),
            footages: FootageView {
                names: self.footages.names.clone(),
                selected: self.footages.selected.clone(),
                loaded: self.footages.loaded,
                error: self.footages.error.clone(),
                saved_to: self.footages.saved_to.clone(),
            },
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Resets the submission for a new file and returns its id.
    pub(crate) fn begin_submission(&mut self, file: FileInfo) -> SubmissionId {
        self.next_submission_id += 1;
        self.submission = Submission {
            id: self.next_submission_id,
            status: SubmissionStatus::Uploading,
            file: Some(file),
            ..Submission::default()
        };
        self.mark_dirty();
        self.submission.id
    }

    /// Moves the current submission to `AwaitingResult` and allocates the
    /// poll id bound to `job_id`.
    pub(crate) fn await_job(&mut self, job_id: JobId) -> PollId {
        self.next_poll_id += 1;
        let poll = self.next_poll_id;
        self.submission.status = SubmissionStatus::AwaitingResult;
        self.submission.job_id = Some(job_id);
        self.submission.active_poll = Some(poll);
        self.mark_dirty();
        poll
    }

    pub(crate) fn record_poll_attempt(&mut self, attempt: u32) {
        self.submission.poll_attempts = attempt;
        self.mark_dirty();
    }

    pub(crate) fn succeed(&mut self, result: SubmissionResult) {
        self.submission.status = SubmissionStatus::Succeeded;
        self.submission.result = Some(result);
        self.submission.active_poll = None;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, error: SubmissionError) {
        if !error.is_after_acceptance() {
            self.submission.job_id = None;
        }
        self.submission.status = SubmissionStatus::Failed;
        self.submission.error = Some(error);
        self.submission.active_poll = None;
        self.mark_dirty();
    }

    pub(crate) fn record_artifact_saved(&mut self, outcome: Result<String, String>) {
        match outcome {
            Ok(path) => self.submission.saved_to = Some(path),
            Err(message) => self.submission.save_error = Some(message),
        }
        self.mark_dirty();
    }

    pub(crate) fn live_mut(&mut self) -> &mut LiveSession {
        self.mark_dirty();
        &mut self.live
    }

    pub(crate) fn footages_mut(&mut self) -> &mut FootageBrowser {
        self.mark_dirty();
        &mut self.footages
    }
}
