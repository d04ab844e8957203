use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the analysis service answers an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServiceMode {
    /// Upload returns `{ "job_id": ... }`; the result is polled for.
    #[default]
    Async,
    /// Upload returns `{ "video_path": ... }` once processing is done.
    Sync,
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Delay before the first query and between queries.
    pub interval: Duration,
    /// Give up after this long. `None` polls until the service answers terminally.
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_duration: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Path prefix the service is mounted under, `/api` by default.
    pub api_prefix: String,
    pub mode: ServiceMode,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
    pub poll: PollSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            api_prefix: "/api".to_string(),
            mode: ServiceMode::Async,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(600),
            max_download_bytes: 1024 * 1024 * 1024,
            poll: PollSettings::default(),
        }
    }
}
