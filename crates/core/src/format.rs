use crate::{parser::ParseDiagnostics, types::SentimentReport};

/// Render a score as a small bar, e.g. `-0.50 ▓▓▓▓▓░░░░░|`.
fn score_bar(score: f64) -> String {
    let filled = ((score.clamp(-1.0, 1.0).abs() * 10.0).round()) as usize;
    let bar = format!("{}{}", "▓".repeat(filled), "░".repeat(10 - filled));
    if score < 0.0 {
        format!("{:+.2} {}|", score, bar.chars().rev().collect::<String>())
    } else {
        format!("{:+.2} |{}", score, bar)
    }
}

/// Format a sentiment report as human-readable markdown
pub fn format_report_readable(report: &SentimentReport, diagnostics: &ParseDiagnostics) -> String {
    let mut output = String::new();

    output.push_str("# Video Sentiment Analysis\n\n");

    if !diagnostics.is_complete() {
        let missing: Vec<String> = diagnostics.missing.iter().map(|s| s.to_string()).collect();
        output.push_str(&format!(
            "> Missing from the model response: {}\n\n",
            missing.join(", ")
        ));
    }

    output.push_str("## Overall Sentiment\n\n");
    output.push_str(&report.overall_sentiment);
    output.push_str("\n\n");

    output.push_str("## Emotional Moments\n\n");
    for moment in &report.emotional_moments {
        output.push_str(&format!(
            "**{}** - {}\n{}\n\n",
            moment.timestamp, moment.emotion, moment.description
        ));
    }

    output.push_str("## Sentiment Timeline\n\n");
    for point in &report.sentiment_timeline {
        output.push_str(&format!("{}  {}\n", point.timestamp, score_bar(point.score)));
    }
    output.push('\n');

    output.push_str("## Key Emotions\n\n");
    for emotion in &report.key_emotions {
        output.push_str(&format!("• {}\n", emotion));
    }
    output.push('\n');

    output.push_str("## Transcription\n\n");
    output.push_str(&report.transcription);
    output.push('\n');

    output
}
