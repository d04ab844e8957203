use crate::{AppState, Effect, Msg, SubmissionResult, SubmissionStatus, UploadReceipt};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            // The drop target is disabled while a job is processing; a second
            // poller must never start for the same submission.
            if state.submission().status() == SubmissionStatus::AwaitingResult {
                return (state, Vec::new());
            }
            if file.is_empty() || !file.is_video() {
                return (state, Vec::new());
            }
            let submission = state.begin_submission(file.info());
            vec![Effect::Upload { submission, file }]
        }
        Msg::UploadFinished { submission, result } => {
            // An upload superseded by a newer selection must not start a poller.
            if submission != state.submission().id()
                || state.submission().status() != SubmissionStatus::Uploading
            {
                return (state, Vec::new());
            }
            match result {
                Ok(UploadReceipt::Job(job_id)) => {
                    let poll = state.await_job(job_id.clone());
                    vec![Effect::StartPolling { poll, job_id }]
                }
                Ok(UploadReceipt::Stored { video_path }) => {
                    state.succeed(SubmissionResult::RemotePath(video_path));
                    Vec::new()
                }
                Err(err) => {
                    state.fail(err);
                    Vec::new()
                }
            }
        }
        Msg::PollAttempted { poll, attempt } => {
            if state.submission().active_poll() == Some(poll) {
                state.record_poll_attempt(attempt);
            }
            Vec::new()
        }
        Msg::PollFinished { poll, result } => {
            if state.submission().active_poll() != Some(poll) {
                return (state, Vec::new());
            }
            let Some(job_id) = state.submission().job_id().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            match result {
                Ok(bytes) => {
                    state.succeed(SubmissionResult::Artifact {
                        byte_len: bytes.len() as u64,
                    });
                    vec![Effect::SaveArtifact { job_id, bytes }]
                }
                Err(err) => {
                    state.fail(err);
                    Vec::new()
                }
            }
        }
        Msg::ArtifactSaved(outcome) => {
            if state.submission().status() == SubmissionStatus::Succeeded {
                state.record_artifact_saved(outcome);
            }
            Vec::new()
        }
        Msg::Initialize => vec![Effect::LoadSavingState],
        Msg::SavingStateLoaded(result) => {
            match result {
                Ok(saving) => state.live_mut().apply_status(saving),
                Err(message) => state.live_mut().record_status_error(message),
            }
            Vec::new()
        }
        Msg::ToggleSavingClicked => {
            let enable = state.live_mut().begin_toggle();
            vec![Effect::SetSaving { enable }]
        }
        Msg::SavingToggled {
            enable: _,
            succeeded,
        } => {
            state.live_mut().finish_toggle(succeeded);
            Vec::new()
        }
        Msg::LoadFootages => vec![Effect::ListFootages],
        Msg::FootagesLoaded(result) => {
            let footages = state.footages_mut();
            match result {
                Ok(names) => {
                    let keep_selection = footages
                        .selected
                        .as_ref()
                        .is_some_and(|selected| names.contains(selected));
                    if !keep_selection {
                        footages.selected = names.first().cloned();
                    }
                    footages.names = names;
                    footages.loaded = true;
                    footages.error = None;
                }
                Err(message) => footages.error = Some(message),
            }
            Vec::new()
        }
        Msg::FootageSelected(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return (state, Vec::new());
            }
            let footages = state.footages_mut();
            footages.selected = Some(name.clone());
            footages.error = None;
            footages.saved_to = None;
            vec![Effect::FetchFootage { name }]
        }
        Msg::FootageFetched { name, result } => {
            if state.footages().selected.as_deref() != Some(name.as_str()) {
                return (state, Vec::new());
            }
            match result {
                Ok(bytes) => vec![Effect::SaveFootage { name, bytes }],
                Err(message) => {
                    state.footages_mut().error = Some(message);
                    Vec::new()
                }
            }
        }
        Msg::FootageSaved(outcome) => {
            let footages = state.footages_mut();
            match outcome {
                Ok(path) => footages.saved_to = Some(path),
                Err(message) => footages.error = Some(message),
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

