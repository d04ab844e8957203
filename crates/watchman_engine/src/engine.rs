use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use watchman_logging::{watch_debug, watch_warn};

use crate::{
    AnalysisApi, ApiError, ChannelEventSink, ClientSettings, EngineEvent, EventSink, JobId,
    JobPoller, PollId, PollSettings, ReqwestApi, Ticket, UploadFile,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("http client setup failed: {0}")]
    Client(#[from] ApiError),
    #[error("async runtime setup failed: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    Upload { ticket: Ticket, file: UploadFile },
    StartPolling { poll: PollId, job_id: JobId },
    LoadSavingState,
    SetSaving { enable: bool },
    ListFootages,
    FetchFootage { name: String },
}

/// Runs all service IO on a background runtime thread.
///
/// Commands go in through the handle methods; results come back as
/// [`EngineEvent`]s. Dropping the handle stops the thread and cancels any
/// request or poller still in flight.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let poll = settings.poll.clone();
        let api = ReqwestApi::new(settings)?;
        Self::with_api(Arc::new(api), poll)
    }

    pub fn with_api(api: Arc<dyn AnalysisApi>, poll: PollSettings) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let mut worker = Worker {
                runtime,
                api,
                poll,
                event_tx,
                current_poll: None,
            };
            while let Ok(command) = cmd_rx.recv() {
                worker.handle(command);
            }
            worker.stop_current_poll();
            watch_debug!("Engine command loop finished");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, ticket: Ticket, file: UploadFile) {
        self.send(EngineCommand::Upload { ticket, file });
    }

    pub fn start_polling(&self, poll: PollId, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StartPolling {
            poll,
            job_id: job_id.into(),
        });
    }

    pub fn load_saving_state(&self) {
        self.send(EngineCommand::LoadSavingState);
    }

    pub fn set_saving(&self, enable: bool) {
        self.send(EngineCommand::SetSaving { enable });
    }

    pub fn list_footages(&self) {
        self.send(EngineCommand::ListFootages);
    }

    pub fn fetch_footage(&self, name: impl Into<String>) {
        self.send(EngineCommand::FetchFootage { name: name.into() });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            watch_warn!("Engine thread is gone; command dropped");
        }
    }
}

struct Worker {
    runtime: Runtime,
    api: Arc<dyn AnalysisApi>,
    poll: PollSettings,
    event_tx: mpsc::Sender<EngineEvent>,
    current_poll: Option<(PollId, JoinHandle<()>)>,
}

impl Worker {
    fn handle(&mut self, command: EngineCommand) {
        if let EngineCommand::StartPolling { poll, job_id } = command {
            self.start_poller(poll, job_id);
            return;
        }

        let api = self.api.clone();
        let sink = ChannelEventSink::new(self.event_tx.clone());
        self.runtime.spawn(async move {
            let event = match command {
                EngineCommand::Upload { ticket, file } => EngineEvent::UploadCompleted {
                    ticket,
                    result: api.upload(&file).await,
                },
                EngineCommand::LoadSavingState => EngineEvent::SavingState(api.is_saving().await),
                EngineCommand::SetSaving { enable } => EngineEvent::SavingToggled {
                    enable,
                    result: api.set_saving(enable).await,
                },
                EngineCommand::ListFootages => {
                    EngineEvent::FootagesListed(api.list_footages().await)
                }
                EngineCommand::FetchFootage { name } => {
                    let result = api.fetch_footage(&name).await;
                    EngineEvent::FootageFetched { name, result }
                }
                EngineCommand::StartPolling { .. } => return,
            };
            sink.emit(event);
        });
    }

    /// At most one poller runs at a time; a new one replaces any leftover.
    fn start_poller(&mut self, poll: PollId, job_id: JobId) {
        self.stop_current_poll();

        let api = self.api.clone();
        let sink = ChannelEventSink::new(self.event_tx.clone());
        let poller = JobPoller::new(poll, job_id.clone(), self.poll.clone());
        let handle = self.runtime.spawn(async move {
            let outcome = poller.run(api.as_ref(), &sink).await;
            sink.emit(EngineEvent::PollCompleted {
                poll,
                job_id,
                outcome,
            });
        });
        self.current_poll = Some((poll, handle));
    }

    fn stop_current_poll(&mut self) {
        if let Some((previous, handle)) = self.current_poll.take() {
            if !handle.is_finished() {
                watch_warn!("Stopping poll {} that was still running", previous);
                handle.abort();
            }
        }
    }
}
