use watchman_core::{FootageView, LiveView, SubmissionResult, SubmissionStatus, SubmissionView};

/// Status lines for the submission in progress.
pub fn submission_lines(view: &SubmissionView) -> Vec<String> {
    let mut lines = Vec::new();
    let file = view
        .file
        .as_ref()
        .map(|file| format!("{} ({}, {} bytes)", file.name, file.mime_type, file.size))
        .unwrap_or_else(|| "no file".to_string());

    match view.status {
        SubmissionStatus::Idle => lines.push("Waiting for a video".to_string()),
        SubmissionStatus::Uploading => lines.push(format!("Uploading {file}")),
        SubmissionStatus::AwaitingResult => {
            let job = view.job_id.as_deref().unwrap_or("?");
            if view.poll_attempts == 0 {
                lines.push(format!("Processing job {job}"));
            } else {
                lines.push(format!(
                    "Processing job {job} (checked {} times)",
                    view.poll_attempts
                ));
            }
        }
        SubmissionStatus::Succeeded => match &view.result {
            Some(SubmissionResult::Artifact { byte_len }) => {
                lines.push(format!("Processing complete ({byte_len} bytes)"))
            }
            Some(SubmissionResult::RemotePath(path)) => {
                lines.push(format!("Processing complete; stored at {path}"))
            }
            None => lines.push("Processing complete".to_string()),
        },
        SubmissionStatus::Failed => {
            let message = view.error.as_deref().unwrap_or("Submission failed");
            lines.push(format!("Error: {message}"));
        }
    }

    if let Some(path) = &view.saved_to {
        lines.push(format!("Processed video saved to {path}"));
    }
    if let Some(err) = &view.save_error {
        lines.push(format!("Could not save processed video: {err}"));
    }
    lines
}

pub fn live_lines(view: &LiveView) -> Vec<String> {
    let state = if !view.status_known {
        "unknown"
    } else if view.saving_enabled {
        "on"
    } else {
        "off"
    };
    let mut line = format!("Saving matching footage: {state}");
    if view.toggle_pending {
        line.push_str(" (change pending)");
    }
    let mut lines = vec![line];
    if let Some(err) = &view.status_error {
        lines.push(format!("Error: could not read saving state: {err}"));
    }
    lines
}

pub fn footage_lines(view: &FootageView) -> Vec<String> {
    let mut lines = Vec::new();
    if view.loaded {
        if view.names.is_empty() {
            lines.push("No saved footage".to_string());
        }
        for name in &view.names {
            let marker = if view.selected.as_deref() == Some(name.as_str()) {
                '*'
            } else {
                ' '
            };
            lines.push(format!("{marker} {name}"));
        }
    }
    if let Some(path) = &view.saved_to {
        lines.push(format!("Footage saved to {path}"));
    }
    if let Some(err) = &view.error {
        lines.push(format!("Error: {err}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watchman_core::FileInfo;

    #[test]
    fn awaiting_result_shows_job_and_attempts() {
        let view = SubmissionView {
            status: SubmissionStatus::AwaitingResult,
            file: Some(FileInfo {
                name: "clip.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                size: 10,
            }),
            job_id: Some("abc123".to_string()),
            poll_attempts: 2,
            ..SubmissionView::default()
        };
        assert_eq!(
            submission_lines(&view),
            vec!["Processing job abc123 (checked 2 times)".to_string()]
        );
    }

    #[test]
    fn failure_shows_user_message() {
        let view = SubmissionView {
            status: SubmissionStatus::Failed,
            error: Some("Processing failed. Please try again.".to_string()),
            ..SubmissionView::default()
        };
        assert_eq!(
            submission_lines(&view),
            vec!["Error: Processing failed. Please try again.".to_string()]
        );
    }

    #[test]
    fn live_flag_states() {
        assert_eq!(
            live_lines(&LiveView::default()),
            vec!["Saving matching footage: unknown".to_string()]
        );
        let view = LiveView {
            saving_enabled: true,
            status_known: true,
            status_error: None,
            toggle_pending: true,
        };
        assert_eq!(
            live_lines(&view),
            vec!["Saving matching footage: on (change pending)".to_string()]
        );
    }

    #[test]
    fn failed_status_read_is_shown() {
        let view = LiveView {
            status_error: Some("connection refused".to_string()),
            ..LiveView::default()
        };
        assert_eq!(
            live_lines(&view),
            vec![
                "Saving matching footage: unknown".to_string(),
                "Error: could not read saving state: connection refused".to_string(),
            ]
        );
    }

    #[test]
    fn footage_list_marks_selection() {
        let view = FootageView {
            names: vec!["a.mp4".to_string(), "b.mp4".to_string()],
            selected: Some("a.mp4".to_string()),
            loaded: true,
            ..FootageView::default()
        };
        assert_eq!(
            footage_lines(&view),
            vec!["* a.mp4".to_string(), "  b.mp4".to_string()]
        );
    }
}
