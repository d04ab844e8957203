use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use watchman_logging::{watch_debug, watch_info, watch_warn};

use crate::{
    AnalysisApi, ApiError, Artifact, EngineEvent, EventSink, JobId, JobStatus, PollId,
    PollProgress, PollSettings,
};

/// Terminal result of one poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ready(Artifact),
    NotFound,
    TransportFault(ApiError),
    /// Only produced when `PollSettings::max_duration` is set.
    DeadlineExceeded { elapsed: Duration },
}

/// Repeating status query bound to a single job.
///
/// The first query fires one interval after [`JobPoller::run`] starts. Each
/// query is awaited before the next interval begins, so queries for the same
/// job never overlap. `run` consumes the poller: it cannot be reused for
/// another job.
#[derive(Debug)]
pub struct JobPoller {
    poll: PollId,
    job_id: JobId,
    settings: PollSettings,
    attempts: u32,
}

impl JobPoller {
    pub fn new(poll: PollId, job_id: impl Into<JobId>, settings: PollSettings) -> Self {
        Self {
            poll,
            job_id: job_id.into(),
            settings,
            attempts: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub async fn run(mut self, api: &dyn AnalysisApi, sink: &dyn EventSink) -> PollOutcome {
        let started = Instant::now();
        let interval = self.settings.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(started + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        watch_info!(
            "Polling job {} every {:?} (poll {})",
            self.job_id,
            interval,
            self.poll
        );

        let outcome = loop {
            ticker.tick().await;
            self.attempts = self.attempts.saturating_add(1);

            match api.job_status(&self.job_id).await {
                Ok(JobStatus::Ready(artifact)) => break PollOutcome::Ready(artifact),
                Ok(JobStatus::NotFound) => break PollOutcome::NotFound,
                Ok(JobStatus::Pending { status }) => {
                    watch_debug!(
                        "Job {} still processing (status {}, attempt {})",
                        self.job_id,
                        status,
                        self.attempts
                    );
                    sink.emit(EngineEvent::PollProgress(PollProgress {
                        poll: self.poll,
                        job_id: self.job_id.clone(),
                        attempt: self.attempts,
                        status,
                    }));
                    if let Some(max) = self.settings.max_duration {
                        let elapsed = started.elapsed();
                        if elapsed >= max {
                            break PollOutcome::DeadlineExceeded { elapsed };
                        }
                    }
                }
                Err(err) => break PollOutcome::TransportFault(err),
            }
        };

        // The timer goes away before the caller gets to deliver the outcome.
        drop(ticker);

        match &outcome {
            PollOutcome::Ready(artifact) => watch_info!(
                "Job {} finished after {} queries ({} bytes)",
                self.job_id,
                self.attempts,
                artifact.bytes.len()
            ),
            PollOutcome::NotFound => {
                watch_warn!("Job {} not found after {} queries", self.job_id, self.attempts)
            }
            PollOutcome::TransportFault(err) => {
                watch_warn!("Polling job {} failed: {}", self.job_id, err)
            }
            PollOutcome::DeadlineExceeded { elapsed } => watch_warn!(
                "Gave up on job {} after {:?} ({} queries)",
                self.job_id,
                elapsed,
                self.attempts
            ),
        }
        outcome
    }
}
