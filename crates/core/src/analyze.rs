use crate::{error::Result, gemini::MediaApi, retry::RetryPolicy, types::RemoteFile};

pub static SENTIMENT_PROMPT: &str = r#"
Analyze the sentiment of this video and provide the following information:
1. Overall sentiment: Give a brief summary of the overall sentiment.
2. Emotional moments: List at least 5 key emotional moments with their timestamps (in MM:SS format), detected emotion, and a brief description.
3. Sentiment timeline: Provide a sentiment score for at least 10 timestamps throughout the video, with scores ranging from -1 (very negative) to 1 (very positive).
4. Key emotions: List the top 10 key emotions detected in the video.
5. Transcription: Provide a brief transcription of important dialogue or narration.

Format your response as follows:

Overall sentiment: [Your summary here]

Emotional moments:
- [MM:SS] - [Emotion]: [Description]
[Repeat for at least 5 moments]

Sentiment timeline:
[MM:SS]: [Score]
[Repeat for at least 10 timestamps]

Key emotions:
[List of 10 emotions]

Transcription:
[Your transcription here]
"#;

/// Ask the model for a sentiment analysis of a processed video.
///
/// Connection failures are retried according to `retry`; every other error
/// is returned on the first occurrence.
pub async fn analyze_video_sentiment(
    api: &dyn MediaApi,
    file: &RemoteFile,
    retry: &RetryPolicy,
) -> Result<String> {
    let text = retry
        .run("sentiment request", || api.generate_content(SENTIMENT_PROMPT, file))
        .await?;

    tracing::info!(file = %file.name, chars = text.len(), "received sentiment analysis");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_section_label() {
        for label in [
            "Overall sentiment:",
            "Emotional moments:",
            "Sentiment timeline:",
            "Key emotions:",
            "Transcription:",
        ] {
            assert!(SENTIMENT_PROMPT.contains(label), "missing {label}");
        }
    }
}
