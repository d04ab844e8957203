use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use url::Url;
use watchman_logging::{watch_debug, watch_info};

use crate::{
    ApiError, Artifact, ClientSettings, FailureKind, JobStatus, ServiceMode, UploadFile,
    UploadResponse,
};

/// Multipart field the service reads the video from.
const UPLOAD_FIELD: &str = "file";

/// HTTP contract of the analysis service.
#[async_trait::async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError>;

    async fn is_saving(&self) -> Result<bool, ApiError>;

    async fn set_saving(&self, enable: bool) -> Result<(), ApiError>;

    async fn list_footages(&self) -> Result<Vec<String>, ApiError>;

    async fn fetch_footage(&self, name: &str) -> Result<Artifact, ApiError>;

    /// Location of the live image stream. Consumed by a viewer, never parsed here.
    fn live_feed_url(&self) -> Result<Url, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    settings: ClientSettings,
}

#[derive(Deserialize)]
struct SavingBody {
    saving: bool,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        // Validate once so every endpoint() call below only fails on odd segments.
        Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Joins base url, api prefix and `segments`; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
            })?;
            path.pop_if_empty();
            for prefix in self.settings.api_prefix.split('/').filter(|s| !s.is_empty()) {
                path.push(prefix);
            }
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn get(&self, segments: &[&str]) -> Result<Response, ApiError> {
        let url = self.endpoint(segments)?;
        watch_debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)
    }

    async fn read_artifact(&self, response: Response) -> Result<Artifact, ApiError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = read_body(response, self.settings.max_download_bytes).await?;
        Ok(Artifact {
            bytes,
            content_type,
        })
    }
}

#[async_trait::async_trait]
impl AnalysisApi for ReqwestApi {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ApiError> {
        let url = self.endpoint(&["upload"])?;
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        watch_info!(
            "Uploading {} ({} bytes, {}) to {}",
            file.name,
            file.bytes.len(),
            file.mime_type,
            url
        );
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = read_body(response, self.settings.max_download_bytes).await?;
        parse_upload_response(self.settings.mode, &body)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        let response = self.get(&["status", job_id]).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(JobStatus::NotFound);
        }
        // 202 and 204 are the service's "still working" answers.
        if !status.is_success() || status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT
        {
            return Ok(JobStatus::Pending {
                status: status.as_u16(),
            });
        }
        let artifact = self.read_artifact(response).await?;
        if artifact.bytes.is_empty() {
            return Ok(JobStatus::Pending {
                status: status.as_u16(),
            });
        }
        Ok(JobStatus::Ready(artifact))
    }

    async fn is_saving(&self) -> Result<bool, ApiError> {
        let response = self.get(&["is-saving"]).await?;
        let body = read_success_body(response, self.settings.max_download_bytes).await?;
        let parsed: SavingBody = serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        Ok(parsed.saving)
    }

    async fn set_saving(&self, enable: bool) -> Result<(), ApiError> {
        let action = if enable { "start-saving" } else { "stop-saving" };
        let url = self.endpoint(&[action])?;
        watch_info!("POST {}", url);
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ))
        }
    }

    async fn list_footages(&self) -> Result<Vec<String>, ApiError> {
        let response = self.get(&["footages"]).await?;
        let body = read_success_body(response, self.settings.max_download_bytes).await?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn fetch_footage(&self, name: &str) -> Result<Artifact, ApiError> {
        let response = self.get(&["footages", name]).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        self.read_artifact(response).await
    }

    fn live_feed_url(&self) -> Result<Url, ApiError> {
        self.endpoint(&["video"])
    }
}

/// Interprets an upload body according to the service mode.
///
/// Job ids are opaque: numeric ids are accepted and kept as their decimal text.
pub(crate) fn parse_upload_response(
    mode: ServiceMode,
    body: &[u8],
) -> Result<UploadResponse, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
    let field = match mode {
        ServiceMode::Async => "job_id",
        ServiceMode::Sync => "video_path",
    };
    let text = match value.get(field) {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(serde_json::Value::Number(number)) if mode == ServiceMode::Async => {
            number.to_string()
        }
        _ => {
            return Err(ApiError::new(
                FailureKind::Decode,
                format!("response has no usable `{field}`"),
            ))
        }
    };
    Ok(match mode {
        ServiceMode::Async => UploadResponse::Job { job_id: text },
        ServiceMode::Sync => UploadResponse::Stored { video_path: text },
    })
}

async fn read_success_body(response: Response, max_bytes: u64) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    read_body(response, max_bytes).await
}

async fn read_body(response: Response, max_bytes: u64) -> Result<Vec<u8>, ApiError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(ApiError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(ApiError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str, prefix: &str) -> ReqwestApi {
        ReqwestApi::new(ClientSettings {
            base_url: base_url.to_string(),
            api_prefix: prefix.to_string(),
            ..ClientSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_prefix_and_encodes_segments() {
        let api = api("http://localhost:5001/", "/api");
        assert_eq!(
            api.endpoint(&["status", "abc123"]).unwrap().as_str(),
            "http://localhost:5001/api/status/abc123"
        );
        assert_eq!(
            api.endpoint(&["footages", "a b/../c.mp4"]).unwrap().as_str(),
            "http://localhost:5001/api/footages/a%20b%2F..%2Fc.mp4"
        );
    }

    #[test]
    fn endpoint_supports_nested_prefix_and_base_path() {
        let api = api("http://10.0.0.2:5000/watchman", "api/v1/");
        assert_eq!(
            api.endpoint(&["is-saving"]).unwrap().as_str(),
            "http://10.0.0.2:5000/watchman/api/v1/is-saving"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestApi::new(ClientSettings {
            base_url: "not a url".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }

    #[test]
    fn upload_response_by_mode() {
        assert_eq!(
            parse_upload_response(ServiceMode::Async, br#"{"job_id":"abc123"}"#).unwrap(),
            UploadResponse::Job {
                job_id: "abc123".to_string()
            }
        );
        assert_eq!(
            parse_upload_response(ServiceMode::Async, br#"{"job_id":42}"#).unwrap(),
            UploadResponse::Job {
                job_id: "42".to_string()
            }
        );
        assert_eq!(
            parse_upload_response(ServiceMode::Sync, br#"{"video_path":"out/a.mp4"}"#).unwrap(),
            UploadResponse::Stored {
                video_path: "out/a.mp4".to_string()
            }
        );
    }

    #[test]
    fn upload_response_without_id_is_a_decode_error() {
        let err = parse_upload_response(ServiceMode::Async, br#"{"video_path":"x"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
        let err = parse_upload_response(ServiceMode::Async, br#"{"job_id":""}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
        let err = parse_upload_response(ServiceMode::Sync, b"<html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }
}
