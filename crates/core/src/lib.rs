//! Sentiscope Core Library
//!
//! Uploads videos to Gemini, asks for a sentiment analysis, parses the free-text
//! reply into a structured report, and builds charts from it.

pub mod analyze;
pub mod cache;
pub mod charts;
pub mod config;
pub mod error;
pub mod format;
pub mod gemini;
pub mod parser;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod retry;
pub mod session;
pub mod types;
pub mod upload;

// Re-export commonly used items at crate root
pub use cache::{
    content_hash, get_cache_dir, get_report_path, get_root_cache_dir, load_report, save_report,
};
pub use charts::{emotion_pie_chart, timeline_chart, timestamp_to_seconds, word_cloud};
pub use config::{AnalyzerConfig, PollPolicy};
pub use error::{ErrorCategory, Result, SentiscopeError};
pub use format::format_report_readable;
pub use gemini::{GeminiClient, MediaApi};
pub use parser::{ParseDiagnostics, Section, parse_response, validate};
pub use pipeline::{AnalysisOutcome, Analyzer};
pub use provider::ProviderConfig;
pub use retry::RetryPolicy;
pub use session::SessionStore;
pub use types::{FileState, Moment, ProcessedVideo, RemoteFile, SentimentReport, TimelinePoint};
pub use upload::{VideoProcessor, video_mime_type};
