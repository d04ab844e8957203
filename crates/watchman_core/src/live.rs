use crate::view_model::LiveView;

/// Remote "save matching segments" flag as last confirmed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveSession {
    saving_enabled: bool,
    status_known: bool,
    status_error: Option<String>,
    pending_toggles: u32,
}

impl LiveSession {
    pub fn saving_enabled(&self) -> bool {
        self.saving_enabled
    }

    pub fn status_known(&self) -> bool {
        self.status_known
    }

    /// Why the last status read failed, until a later read succeeds.
    pub fn status_error(&self) -> Option<&str> {
        self.status_error.as_deref()
    }

    pub fn pending_toggles(&self) -> u32 {
        self.pending_toggles
    }

    /// Applies a status read. Every read overwrites the flag; the last one wins.
    pub(crate) fn apply_status(&mut self, saving: bool) {
        self.saving_enabled = saving;
        self.status_known = true;
        self.status_error = None;
    }

    /// A failed read leaves the flag as it was.
    pub(crate) fn record_status_error(&mut self, message: String) {
        self.status_error = Some(message);
    }

    /// Registers an outgoing toggle and returns the value it asks the service for.
    pub(crate) fn begin_toggle(&mut self) -> bool {
        self.pending_toggles += 1;
        toggle_target(self.saving_enabled)
    }

    pub(crate) fn finish_toggle(&mut self, succeeded: bool) {
        self.pending_toggles = self.pending_toggles.saturating_sub(1);
        self.saving_enabled = toggle_transition(self.saving_enabled, succeeded);
    }

    pub(crate) fn view(&self) -> LiveView {
        LiveView {
            saving_enabled: self.saving_enabled,
            status_known: self.status_known,
            status_error: self.status_error.clone(),
            toggle_pending: self.pending_toggles > 0,
        }
    }
}

/// Value a toggle requests: enable when currently disabled and vice versa.
pub fn toggle_target(current: bool) -> bool {
    !current
}

/// Confirmed state after a toggle request completes. The flag only flips
/// once the service acknowledged the request.
pub fn toggle_transition(prior: bool, succeeded: bool) -> bool {
    if succeeded {
        !prior
    } else {
        prior
    }
}
