//! Turns the model's free-text reply into a [`SentimentReport`].
//!
//! Parsing never fails: a section whose label is absent comes back empty.
//! Use [`validate`] to find out which sections were missing.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::{Moment, SentimentReport, TimelinePoint};

static OVERALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Overall sentiment:(.*?)(?:\n\n|\z)").unwrap());
static MOMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- (\d{2}:\d{2}) - ([^:\n]+): (.+)").unwrap());
static TIMELINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}:\d{2}): (-?\d+(?:\.\d+)?)").unwrap());
static KEY_EMOTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Key emotions:(.*?)(?:\n\n|\z)").unwrap());
static TRANSCRIPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Transcription:(.*)").unwrap());
static BRACKETED_TS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d{2}:\d{2})\]").unwrap());
static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    OverallSentiment,
    EmotionalMoments,
    SentimentTimeline,
    KeyEmotions,
    Transcription,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::OverallSentiment,
        Section::EmotionalMoments,
        Section::SentimentTimeline,
        Section::KeyEmotions,
        Section::Transcription,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::OverallSentiment => "Overall sentiment:",
            Section::EmotionalMoments => "Emotional moments:",
            Section::SentimentTimeline => "Sentiment timeline:",
            Section::KeyEmotions => "Key emotions:",
            Section::Transcription => "Transcription:",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end_matches(':'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseDiagnostics {
    pub missing: Vec<Section>,
}

impl ParseDiagnostics {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn parse_response(text: &str) -> SentimentReport {
    let text = normalize(text);
    let mut report = SentimentReport::default();

    if let Some(caps) = OVERALL_RE.captures(&text) {
        report.overall_sentiment = caps[1].trim().to_string();
    }

    report.emotional_moments = MOMENT_RE
        .captures_iter(&text)
        .map(|caps| Moment {
            timestamp: caps[1].to_string(),
            emotion: caps[2].trim().to_string(),
            description: caps[3].trim().to_string(),
        })
        .collect();

    report.sentiment_timeline = TIMELINE_RE
        .captures_iter(timeline_section(&text))
        .filter_map(|caps| {
            let score = caps[2].parse::<f64>().ok().filter(|s| s.is_finite())?;
            Some(TimelinePoint {
                timestamp: caps[1].to_string(),
                score,
            })
        })
        .collect();

    if let Some(caps) = KEY_EMOTIONS_RE.captures(&text) {
        report.key_emotions = split_emotions(caps[1].trim());
    }

    if let Some(caps) = TRANSCRIPTION_RE.captures(&text) {
        report.transcription = caps[1].trim().to_string();
    }

    report
}

/// Report which sections came back empty.
pub fn validate(report: &SentimentReport) -> ParseDiagnostics {
    let missing = Section::ALL
        .into_iter()
        .filter(|section| match section {
            Section::OverallSentiment => report.overall_sentiment.is_empty(),
            Section::EmotionalMoments => report.emotional_moments.is_empty(),
            Section::SentimentTimeline => report.sentiment_timeline.is_empty(),
            Section::KeyEmotions => report.key_emotions.is_empty(),
            Section::Transcription => report.transcription.is_empty(),
        })
        .collect();

    ParseDiagnostics { missing }
}

fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace("**", "").replace("__", "");
    BRACKETED_TS_RE.replace_all(&text, "$1").into_owned()
}

/// The slice holding the timeline, or the whole text when it has no label.
fn timeline_section(text: &str) -> &str {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let label = Section::SentimentTimeline.label().to_ascii_lowercase();

    let Some(pos) = lower.find(&label) else {
        return text;
    };
    let start = pos + label.len();

    let end = Section::ALL
        .iter()
        .filter(|s| **s != Section::SentimentTimeline)
        .filter_map(|s| lower[start..].find(&s.label().to_ascii_lowercase()))
        .min()
        .map(|offset| start + offset)
        .unwrap_or(text.len());

    &text[start..end]
}

fn split_emotions(block: &str) -> Vec<String> {
    let lines: Vec<&str> = block.lines().collect();
    let entries: Vec<&str> = if lines.len() == 1 && lines[0].contains(',') {
        lines[0].split(',').collect()
    } else {
        lines
    };

    entries
        .into_iter()
        .map(|e| LIST_MARKER_RE.replace(e.trim(), "").trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Overall sentiment: The video is mostly hopeful, with a tense middle section.

Emotional moments:
- 00:05 - Joy: The host greets the audience with a big smile.
- 00:42 - Anxiety: A sudden alarm interrupts the conversation.
- 01:10 - Sadness: The guest recalls losing their job.
- 02:03 - Relief: The problem is resolved.
- 02:45 - Gratitude: Everyone thanks the volunteers.

Sentiment timeline:
00:00: 0.5
00:15: 0.6
00:30: 0.2
00:45: -0.4
01:00: -0.6
01:15: -0.7
01:30: -0.2
01:45: 0.1
02:00: 0.5
02:30: 0.8

Key emotions:
Joy
Anxiety
Sadness
Relief
Gratitude
Hope
Fear
Surprise
Calm
Pride

Transcription:
Host: Welcome back everyone!
Guest: It has been a hard year.";

    #[test]
    fn well_formed_response_fills_every_field() {
        let report = parse_response(WELL_FORMED);

        assert_eq!(
            report.overall_sentiment,
            "The video is mostly hopeful, with a tense middle section."
        );
        assert_eq!(report.emotional_moments.len(), 5);
        assert_eq!(report.sentiment_timeline.len(), 10);
        assert_eq!(report.key_emotions.len(), 10);
        assert_eq!(report.key_emotions[0], "Joy");
        assert_eq!(report.key_emotions[9], "Pride");
        assert!(report.transcription.starts_with("Host: Welcome back"));
        assert!(validate(&report).is_complete());

        let moment = &report.emotional_moments[1];
        assert_eq!(moment.timestamp, "00:42");
        assert_eq!(moment.emotion, "Anxiety");
        assert_eq!(
            moment.description,
            "A sudden alarm interrupts the conversation."
        );
    }

    #[test]
    fn missing_overall_label_yields_empty_field() {
        let report = parse_response("Key emotions:\nJoy\n\nTranscription: hi");

        assert_eq!(report.overall_sentiment, "");
        assert_eq!(report.key_emotions, vec!["Joy"]);
        let diagnostics = validate(&report);
        assert!(diagnostics.missing.contains(&Section::OverallSentiment));
        assert!(diagnostics.missing.contains(&Section::SentimentTimeline));
        assert!(!diagnostics.missing.contains(&Section::Transcription));
    }

    #[test]
    fn timeline_scores_parse_as_floats() {
        let report = parse_response("01:30: 0.75\n02:00: -1");

        assert_eq!(
            report.sentiment_timeline,
            vec![
                TimelinePoint {
                    timestamp: "01:30".into(),
                    score: 0.75
                },
                TimelinePoint {
                    timestamp: "02:00".into(),
                    score: -1.0
                },
            ]
        );
    }

    #[test]
    fn out_of_range_scores_are_kept() {
        let report = parse_response("Sentiment timeline:\n00:10: 3.5\n00:20: -2");
        let scores: Vec<f64> = report.sentiment_timeline.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![3.5, -2.0]);
    }

    #[test]
    fn overflowing_scores_are_dropped() {
        let text = format!("Sentiment timeline:\n00:10: 1{}\n00:20: 0.5", "0".repeat(400));
        let report = parse_response(&text);

        assert_eq!(report.sentiment_timeline.len(), 1);
        assert_eq!(report.sentiment_timeline[0].timestamp, "00:20");

        let json = serde_json::to_string(&report).unwrap();
        let reloaded: SentimentReport = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, report);
    }

    #[test]
    fn labelled_timeline_ignores_pairs_in_other_sections() {
        let text = "Sentiment timeline:\n00:10: 0.5\n00:20: 0.25\n\n\
                    Transcription:\nAt 00:30: 3 people arrive.";
        let report = parse_response(text);

        assert_eq!(report.sentiment_timeline.len(), 2);
        assert_eq!(report.transcription, "At 00:30: 3 people arrive.");
    }

    #[test]
    fn markdown_and_brackets_are_tolerated() {
        let text = "**Overall sentiment:** Warm and positive.\n\n\
                    **Emotional moments:**\n- [00:12] - Joy: Laughter at the start.\n\n\
                    **Sentiment timeline:**\n[00:12]: 0.9\n";
        let report = parse_response(text);

        assert_eq!(report.overall_sentiment, "Warm and positive.");
        assert_eq!(report.emotional_moments.len(), 1);
        assert_eq!(report.emotional_moments[0].timestamp, "00:12");
        assert_eq!(report.sentiment_timeline[0].score, 0.9);
    }

    #[test]
    fn key_emotions_accept_bullets_and_commas() {
        let bullets = parse_response("Key emotions:\n- Joy\n2. Fear\n* Awe\n");
        assert_eq!(bullets.key_emotions, vec!["Joy", "Fear", "Awe"]);

        let inline = parse_response("Key emotions: Joy, Fear, Awe\n\nTranscription: x");
        assert_eq!(inline.key_emotions, vec!["Joy", "Fear", "Awe"]);
    }

    #[test]
    fn empty_response_is_blank_not_an_error() {
        let report = parse_response("");
        assert_eq!(report, SentimentReport::default());
        assert_eq!(validate(&report).missing, Section::ALL.to_vec());
    }
}
