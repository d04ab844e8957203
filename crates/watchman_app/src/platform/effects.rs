use std::path::PathBuf;
use std::time::Duration;

use watchman_core::{Effect, Msg, SubmissionError, UploadReceipt, VideoFile};
use watchman_engine::{
    ApiError, AtomicFileWriter, ClientSettings, EngineError, EngineEvent, EngineHandle,
    FailureKind, PollOutcome, UploadFile, UploadResponse,
};
use watchman_logging::{watch_debug, watch_info, watch_warn};

/// File name the processed video is saved under.
pub const ARTIFACT_FILENAME: &str = "processed_video.mp4";

/// Turns core effects into engine commands and engine events into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: AtomicFileWriter,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings, output_dir: PathBuf) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(settings)?;
        Ok(Self {
            engine,
            writer: AtomicFileWriter::new(output_dir),
        })
    }

    /// Starts every effect. Effects that complete locally answer right away
    /// with their message; the rest come back through [`EffectRunner::next_msg`].
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut immediate = Vec::new();
        for effect in effects {
            match effect {
                Effect::Upload { submission, file } => {
                    watch_debug!("Submission {} selected {}", submission, file.name);
                    self.engine.upload(submission, upload_file(file));
                }
                Effect::StartPolling { poll, job_id } => {
                    watch_info!("Job {} accepted; polling (poll {})", job_id, poll);
                    self.engine.start_polling(poll, job_id);
                }
                Effect::SaveArtifact { job_id, bytes } => {
                    watch_debug!("Saving result of job {}", job_id);
                    immediate.push(Msg::ArtifactSaved(self.save(ARTIFACT_FILENAME, &bytes)));
                }
                Effect::LoadSavingState => self.engine.load_saving_state(),
                Effect::SetSaving { enable } => self.engine.set_saving(enable),
                Effect::ListFootages => self.engine.list_footages(),
                Effect::FetchFootage { name } => self.engine.fetch_footage(name),
                Effect::SaveFootage { name, bytes } => {
                    immediate.push(Msg::FootageSaved(self.save(&name, &bytes)));
                }
            }
        }
        immediate
    }

    /// Waits up to `timeout` for the next engine result.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(event_to_msg)
    }

    fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, String> {
        match self.writer.write(filename, bytes) {
            Ok(path) => {
                watch_info!("Saved {} bytes to {:?}", bytes.len(), path);
                Ok(path.display().to_string())
            }
            Err(err) => {
                watch_warn!(
                    "Failed to save {} into {:?}: {}",
                    filename,
                    self.writer.dir(),
                    err
                );
                Err(err.to_string())
            }
        }
    }
}

fn upload_file(file: VideoFile) -> UploadFile {
    UploadFile {
        name: file.name,
        mime_type: file.mime_type,
        bytes: file.bytes,
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted { ticket, result } => Msg::UploadFinished {
            submission: ticket,
            result: result.map(upload_receipt).map_err(upload_error),
        },
        EngineEvent::PollProgress(progress) => Msg::PollAttempted {
            poll: progress.poll,
            attempt: progress.attempt,
        },
        EngineEvent::PollCompleted { poll, outcome, .. } => Msg::PollFinished {
            poll,
            result: poll_result(outcome),
        },
        EngineEvent::SavingState(result) => {
            if let Err(err) = &result {
                watch_warn!("Reading saving state failed: {}", err);
            }
            Msg::SavingStateLoaded(result.map_err(|err| err.to_string()))
        }
        EngineEvent::SavingToggled { enable, result } => {
            if let Err(err) = &result {
                watch_warn!(
                    "{} saving failed: {}",
                    if enable { "Starting" } else { "Stopping" },
                    err
                );
            }
            Msg::SavingToggled {
                enable,
                succeeded: result.is_ok(),
            }
        }
        EngineEvent::FootagesListed(result) => {
            Msg::FootagesLoaded(result.map_err(|err| footage_error("list footages", &err)))
        }
        EngineEvent::FootageFetched { name, result } => Msg::FootageFetched {
            result: result
                .map(|artifact| artifact.bytes)
                .map_err(|err| footage_error(&format!("fetch {name}"), &err)),
            name,
        },
    }
}

fn upload_receipt(response: UploadResponse) -> UploadReceipt {
    match response {
        UploadResponse::Job { job_id } => UploadReceipt::Job(job_id),
        UploadResponse::Stored { video_path } => UploadReceipt::Stored { video_path },
    }
}

pub(crate) fn upload_error(err: ApiError) -> SubmissionError {
    match err.kind {
        FailureKind::HttpStatus(status) => SubmissionError::UploadRejected { status },
        FailureKind::Decode | FailureKind::TooLarge { .. } => {
            SubmissionError::MalformedResponse(err.message)
        }
        FailureKind::InvalidUrl | FailureKind::Timeout | FailureKind::Network => {
            SubmissionError::UploadTransport(err.message)
        }
    }
}

pub(crate) fn poll_result(outcome: PollOutcome) -> Result<Vec<u8>, SubmissionError> {
    match outcome {
        PollOutcome::Ready(artifact) => Ok(artifact.bytes),
        PollOutcome::NotFound => Err(SubmissionError::JobNotFound),
        PollOutcome::TransportFault(err) => Err(SubmissionError::PollTransport(err.message)),
        PollOutcome::DeadlineExceeded { elapsed } => Err(SubmissionError::PollTimeout {
            elapsed_secs: elapsed.as_secs(),
        }),
    }
}

fn footage_error(action: &str, err: &ApiError) -> String {
    match err.kind {
        FailureKind::HttpStatus(404) => format!("Could not {action}: not found"),
        _ => format!("Could not {action}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watchman_engine::{Artifact, PollProgress};

    fn api_error(kind: FailureKind, message: &str) -> ApiError {
        ApiError {
            kind,
            message: message.to_string(),
        }
    }

    #[test]
    fn processed_video_is_written_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let runner = EffectRunner::new(ClientSettings::default(), output.clone()).unwrap();

        let msgs = runner.enqueue(vec![Effect::SaveArtifact {
            job_id: "abc123".to_string(),
            bytes: b"processed".to_vec(),
        }]);

        let expected = output.join(ARTIFACT_FILENAME);
        assert_eq!(
            msgs,
            vec![Msg::ArtifactSaved(Ok(expected.display().to_string()))]
        );
        assert_eq!(std::fs::read(&expected).unwrap(), b"processed");
    }

    #[test]
    fn footage_is_saved_under_its_own_name() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let runner = EffectRunner::new(ClientSettings::default(), output.clone()).unwrap();

        let msgs = runner.enqueue(vec![Effect::SaveFootage {
            name: "../2024-05-01_10-00-00.mp4".to_string(),
            bytes: b"segment".to_vec(),
        }]);

        let expected = output.join("2024-05-01_10-00-00.mp4");
        assert_eq!(
            msgs,
            vec![Msg::FootageSaved(Ok(expected.display().to_string()))]
        );
        assert_eq!(std::fs::read(&expected).unwrap(), b"segment");
    }

    #[test]
    fn rejected_upload_shows_generic_message() {
        let err = upload_error(api_error(FailureKind::HttpStatus(500), "http status 500"));
        assert_eq!(err, SubmissionError::UploadRejected { status: 500 });
        assert_eq!(err.to_string(), "Failed to upload video. Please try again.");
    }

    #[test]
    fn transport_upload_failure_keeps_message() {
        let err = upload_error(api_error(FailureKind::Network, "connection refused"));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn poll_outcomes_map_to_submission_errors() {
        assert_eq!(poll_result(PollOutcome::NotFound), Err(SubmissionError::JobNotFound));
        assert_eq!(
            poll_result(PollOutcome::TransportFault(api_error(
                FailureKind::Timeout,
                "timed out"
            )))
            .unwrap_err()
            .to_string(),
            "Error checking job status. Please refresh and try again."
        );
        assert_eq!(
            poll_result(PollOutcome::DeadlineExceeded {
                elapsed: Duration::from_secs(61)
            }),
            Err(SubmissionError::PollTimeout { elapsed_secs: 61 })
        );
        assert_eq!(
            poll_result(PollOutcome::Ready(Artifact {
                bytes: b"mp4".to_vec(),
                content_type: None
            })),
            Ok(b"mp4".to_vec())
        );
    }

    #[test]
    fn engine_events_become_messages() {
        assert_eq!(
            event_to_msg(EngineEvent::UploadCompleted {
                ticket: 4,
                result: Ok(UploadResponse::Job {
                    job_id: "abc123".to_string()
                }),
            }),
            Msg::UploadFinished {
                submission: 4,
                result: Ok(UploadReceipt::Job("abc123".to_string())),
            }
        );
        assert_eq!(
            event_to_msg(EngineEvent::PollProgress(PollProgress {
                poll: 2,
                job_id: "abc123".to_string(),
                attempt: 3,
                status: 202,
            })),
            Msg::PollAttempted {
                poll: 2,
                attempt: 3
            }
        );
        assert_eq!(
            event_to_msg(EngineEvent::SavingToggled {
                enable: true,
                result: Err(api_error(FailureKind::HttpStatus(503), "http status 503")),
            }),
            Msg::SavingToggled {
                enable: true,
                succeeded: false
            }
        );
    }

    #[test]
    fn missing_footage_reads_as_not_found() {
        let msg = event_to_msg(EngineEvent::FootageFetched {
            name: "gone.mp4".to_string(),
            result: Err(api_error(FailureKind::HttpStatus(404), "http status 404")),
        });
        assert_eq!(
            msg,
            Msg::FootageFetched {
                name: "gone.mp4".to_string(),
                result: Err("Could not fetch gone.mp4: not found".to_string()),
            }
        );
    }
}
