use std::collections::VecDeque;
use std::time::Duration;

use chrono::Local;
use watchman_core::{
    update, AppState, AppViewModel, Msg, SubmissionResult, SubmissionStatus, VideoFile,
};
use watchman_logging::watch_debug;

use super::effects::EffectRunner;
use super::render;

/// How long to wait for engine results before feeding a tick.
const TICK: Duration = Duration::from_millis(75);

/// One command-line task driven to completion through the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Upload(VideoFile),
    LiveStatus,
    LiveToggle,
    FootageList,
    FootageFetch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    fn from_ok(ok: bool) -> Self {
        if ok {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Runs `session` until its terminal message arrives.
pub fn run_session(session: Session, runner: &EffectRunner) -> Outcome {
    let (goal, initial) = Goal::start(session);
    let mut inbox: VecDeque<Msg> = initial.into();
    let mut printer = Printer::default();
    let mut state = AppState::new();

    loop {
        let msg = match inbox.pop_front() {
            Some(msg) => msg,
            None => runner.next_msg(TICK).unwrap_or(Msg::Tick),
        };
        let signal = Signal::of(&msg);

        let (next, effects) = update(state, msg);
        state = next;
        inbox.extend(runner.enqueue(effects));

        let view = state.view();
        if state.consume_dirty() {
            printer.show(goal.lines(&view));
        }

        match goal.step(signal, &view) {
            Step::Continue => {}
            Step::Dispatch(msg) => inbox.push_back(msg),
            Step::Finish(outcome) => {
                watch_debug!("Session finished: {:?}", outcome);
                return outcome;
            }
        }
    }
}

/// Payload-free summary of a message, taken before `update` consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    SavingLoaded { ok: bool },
    SavingToggled { ok: bool },
    FootagesLoaded { ok: bool },
    FootageFetched { ok: bool },
    FootageSaved { ok: bool },
    Other,
}

impl Signal {
    fn of(msg: &Msg) -> Self {
        match msg {
            Msg::SavingStateLoaded(result) => Signal::SavingLoaded { ok: result.is_ok() },
            Msg::SavingToggled { succeeded, .. } => Signal::SavingToggled { ok: *succeeded },
            Msg::FootagesLoaded(result) => Signal::FootagesLoaded { ok: result.is_ok() },
            Msg::FootageFetched { result, .. } => Signal::FootageFetched { ok: result.is_ok() },
            Msg::FootageSaved(result) => Signal::FootageSaved { ok: result.is_ok() },
            _ => Signal::Other,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Dispatch(Msg),
    Finish(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    Upload,
    LiveStatus,
    LiveToggle,
    FootageList,
    FootageFetch,
}

impl Goal {
    fn start(session: Session) -> (Self, Vec<Msg>) {
        match session {
            Session::Upload(file) => (Goal::Upload, vec![Msg::FileSelected(file)]),
            Session::LiveStatus => (Goal::LiveStatus, vec![Msg::Initialize]),
            Session::LiveToggle => (Goal::LiveToggle, vec![Msg::Initialize]),
            Session::FootageList => (Goal::FootageList, vec![Msg::LoadFootages]),
            Session::FootageFetch(name) => (Goal::FootageFetch, vec![Msg::FootageSelected(name)]),
        }
    }

    fn lines(&self, view: &AppViewModel) -> Vec<String> {
        match self {
            Goal::Upload => render::submission_lines(&view.submission),
            Goal::LiveStatus | Goal::LiveToggle => render::live_lines(&view.live),
            Goal::FootageList | Goal::FootageFetch => render::footage_lines(&view.footages),
        }
    }

    fn step(&self, signal: Signal, view: &AppViewModel) -> Step {
        match self {
            Goal::Upload => upload_step(view),
            Goal::LiveStatus => match signal {
                Signal::SavingLoaded { ok } => Step::Finish(Outcome::from_ok(ok)),
                _ => Step::Continue,
            },
            // The toggle direction comes from the flag, so read it first.
            Goal::LiveToggle => match signal {
                Signal::SavingLoaded { ok: true } => Step::Dispatch(Msg::ToggleSavingClicked),
                Signal::SavingLoaded { ok: false } => Step::Finish(Outcome::Failure),
                Signal::SavingToggled { ok } => Step::Finish(Outcome::from_ok(ok)),
                _ => Step::Continue,
            },
            Goal::FootageList => match signal {
                Signal::FootagesLoaded { ok } => Step::Finish(Outcome::from_ok(ok)),
                _ => Step::Continue,
            },
            Goal::FootageFetch => match signal {
                Signal::FootageFetched { ok: false } => Step::Finish(Outcome::Failure),
                Signal::FootageSaved { ok } => Step::Finish(Outcome::from_ok(ok)),
                _ => Step::Continue,
            },
        }
    }
}

fn upload_step(view: &AppViewModel) -> Step {
    let submission = &view.submission;
    match submission.status {
        // Only reachable when the core refused the file.
        SubmissionStatus::Idle => Step::Finish(Outcome::Failure),
        SubmissionStatus::Uploading | SubmissionStatus::AwaitingResult => Step::Continue,
        SubmissionStatus::Failed => Step::Finish(Outcome::Failure),
        SubmissionStatus::Succeeded => match &submission.result {
            Some(SubmissionResult::Artifact { .. }) => {
                if submission.saved_to.is_some() {
                    Step::Finish(Outcome::Success)
                } else if submission.save_error.is_some() {
                    Step::Finish(Outcome::Failure)
                } else {
                    Step::Continue
                }
            }
            _ => Step::Finish(Outcome::Success),
        },
    }
}

/// Prints a block of status lines whenever it changes.
#[derive(Default)]
struct Printer {
    last: Vec<String>,
}

impl Printer {
    fn show(&mut self, lines: Vec<String>) {
        if lines == self.last {
            return;
        }
        let stamp = Local::now().format("%H:%M:%S");
        for line in lines.iter().filter(|line| !self.last.contains(line)) {
            println!("[{stamp}] {line}");
        }
        self.last = lines;
    }
}
