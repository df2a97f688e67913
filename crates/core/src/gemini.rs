//! Client for the Gemini File API and `generateContent` endpoint.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tokio::fs;

use crate::{
    error::{Result, SentiscopeError},
    provider::ProviderConfig,
    types::RemoteFile,
};

/// The remote operations the pipeline needs from a generative-AI provider.
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile>;

    async fn get_file(&self, name: &str) -> Result<RemoteFile>;

    async fn delete_file(&self, name: &str) -> Result<()>;

    /// Send a prompt together with a processed file and return the reply text.
    async fn generate_content(&self, prompt: &str, file: &RemoteFile) -> Result<String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: ProviderConfig,
    api_key: String,
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: RemoteFile,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self> {
        let api_key = config.validate_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SentiscopeError::Http)?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl MediaApi for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile> {
        let bytes = fs::read(path).await?;

        let start = self
            .http
            .post(self.config.upload_url())
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({
                "file": { "display_name": display_name }
            }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| SentiscopeError::InvalidApiResponse {
                reason: "upload session did not return x-goog-upload-url".to_string(),
            })?;

        let response = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let envelope: FileEnvelope = check_status(response).await?.json().await?;

        tracing::info!(file = %envelope.file.name, "uploaded video");
        Ok(envelope.file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        let response = self
            .http
            .get(self.config.file_url(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.config.file_url(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn generate_content(&self, prompt: &str, file: &RemoteFile) -> Result<String> {
        let response = self
            .http
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": prompt },
                        {
                            "file_data": {
                                "mime_type": file.mime_type,
                                "file_uri": file.uri,
                            }
                        },
                    ],
                }],
            }))
            .send()
            .await?;

        let body = check_status(response)
            .await?
            .json::<serde_json::Value>()
            .await?;

        extract_text(&body)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> SentiscopeError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SentiscopeError::PermissionDenied { reason: message }
        }
        _ => SentiscopeError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Concatenate the text parts of the first candidate.
pub fn extract_text(body: &serde_json::Value) -> Result<String> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(SentiscopeError::InvalidApiResponse {
            reason: format!("prompt blocked: {reason}"),
        });
    }

    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| SentiscopeError::InvalidApiResponse {
            reason: format!("no candidate content in response: {body}"),
        })?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();

    if text.trim().is_empty() {
        return Err(SentiscopeError::InvalidApiResponse {
            reason: "candidate contained no text".to_string(),
        });
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Overall sentiment: calm\n\n" },
                        { "text": "Transcription:\nhello" }
                    ]
                }
            }]
        });
        let text = extract_text(&body).unwrap();
        assert_eq!(text, "Overall sentiment: calm\n\nTranscription:\nhello");
    }

    #[test]
    fn blocked_prompt_is_an_invalid_response() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_text(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn forbidden_maps_to_permission_denied() {
        let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        match status_error(StatusCode::FORBIDDEN, body) {
            SentiscopeError::PermissionDenied { reason } => {
                assert_eq!(reason, "API key not valid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn quota_errors_keep_status_and_are_not_retryable() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "quota exhausted");
        assert!(matches!(err, SentiscopeError::Api { status: 429, .. }));
        assert!(!err.is_retryable());
    }
}
