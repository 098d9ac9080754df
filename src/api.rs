use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::audio::ConvertedAudio;
use crate::config::ApiConfig;

/// Errors raised by the remote transcription service client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("malformed response from {endpoint}: {detail}")]
    MalformedResponse { endpoint: String, detail: String },
}

/// Opaque identifier of a stored video asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize)]
struct TranscriptionRequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

/// Remote service consumed by the upload pipeline: stores an audio clip and
/// starts a transcription for it.
#[async_trait]
pub trait TranscriptionApi: Send + Sync {
    /// Store the converted clip, returning the generated identifier
    async fn create_video(&self, audio: &ConvertedAudio) -> Result<VideoId, ApiError>;

    /// Ask the service to transcribe the stored asset
    async fn request_transcription(
        &self,
        id: &VideoId,
        prompt: Option<&str>,
    ) -> Result<(), ApiError>;
}

/// HTTP client for the transcription service
///
/// No request timeout is applied; each call runs until the service settles.
pub struct UploadClient {
    base_url: Url,
    client: reqwest::Client,
}

impl UploadClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ApiError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|source| ApiError::BaseUrl {
            url: format!("{}{}", self.base_url, path),
            source,
        })
    }
}

#[async_trait]
impl TranscriptionApi for UploadClient {
    async fn create_video(&self, audio: &ConvertedAudio) -> Result<VideoId, ApiError> {
        let endpoint = self.endpoint("/videos")?;

        info!(
            "📤 Uploading {} ({} bytes) to {}",
            audio.file_name,
            audio.size(),
            endpoint
        );

        let part = reqwest::multipart::Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)
            .map_err(|source| ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|source| ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let id = body["video"]["id"]
            .as_str()
            .ok_or_else(|| ApiError::MalformedResponse {
                endpoint: endpoint.to_string(),
                detail: "missing video.id field".to_string(),
            })?;

        info!("✅ Upload accepted, video id {}", id);
        Ok(VideoId::new(id))
    }

    async fn request_transcription(
        &self,
        id: &VideoId,
        prompt: Option<&str>,
    ) -> Result<(), ApiError> {
        let endpoint = self.endpoint(&format!("/videos/{}/transcription", id))?;

        info!("📝 Requesting transcription for video {}", id);
        debug!("Transcription prompt: {:?}", prompt);

        let response = self
            .client
            .post(endpoint.clone())
            .json(&TranscriptionRequestBody { prompt })
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        // Response payload is not consumed
        info!("✅ Transcription requested for video {}", id);
        Ok(())
    }
}
