use std::sync::Arc;

use serde::Serialize;

use crate::{
    analyze::analyze_video_sentiment,
    config::AnalyzerConfig,
    error::Result,
    gemini::{GeminiClient, MediaApi},
    parser::{ParseDiagnostics, parse_response, validate},
    retry::RetryPolicy,
    types::{ProcessedVideo, RemoteFile, SentimentReport},
    upload::VideoProcessor,
};

/// Everything one analysis run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub report: SentimentReport,
    pub diagnostics: ParseDiagnostics,
    #[serde(skip)]
    pub file: RemoteFile,
    pub cached_upload: bool,
    #[serde(skip)]
    pub raw_response: String,
}

pub struct Analyzer {
    api: Arc<dyn MediaApi>,
    processor: VideoProcessor,
    retry: RetryPolicy,
}

impl Analyzer {
    pub fn new(api: Arc<dyn MediaApi>, config: &AnalyzerConfig) -> Self {
        Self {
            processor: VideoProcessor::new(Arc::clone(&api), config),
            api,
            retry: config.retry.clone(),
        }
    }

    /// Build an analyzer talking to Gemini.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let client = GeminiClient::new(config.provider.clone(), config.http_timeout)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn processor(&self) -> &VideoProcessor {
        &self.processor
    }

    /// Upload the video and wait for the provider to finish processing it.
    pub async fn process(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<ProcessedVideo> {
        tracing::info!(display_name, bytes = bytes.len(), "processing video");
        self.processor
            .upload_and_process(bytes, mime_type, display_name)
            .await
    }

    /// Request the sentiment analysis for a processed video and parse it.
    pub async fn analyze(&self, video: &ProcessedVideo) -> Result<AnalysisOutcome> {
        let raw_response =
            analyze_video_sentiment(self.api.as_ref(), &video.file, &self.retry).await?;
        let report = parse_response(&raw_response);
        let diagnostics = validate(&report);

        if !diagnostics.is_complete() {
            tracing::warn!(missing = ?diagnostics.missing, "model response is missing sections");
        }

        Ok(AnalysisOutcome {
            report,
            diagnostics,
            file: video.file.clone(),
            cached_upload: video.cached,
            raw_response,
        })
    }

    pub async fn run(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<AnalysisOutcome> {
        let video = self.process(bytes, mime_type, display_name).await?;
        self.analyze(&video).await
    }
}
