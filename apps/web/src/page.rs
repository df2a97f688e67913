//! Server-rendered HTML for the single analysis page.

use std::fmt::Write;

use sentiscope_core::{Moment, SentimentReport, render::escape, upload::SUPPORTED_EXTENSIONS};

use crate::state::{FlashKind, PageState};

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { margin-bottom: 0.2rem; }
.subtitle { color: #666; margin-top: 0; }
.flash { padding: 0.8rem 1rem; border-radius: 6px; margin: 1rem 0; }
.flash.success { background: #e6f4ea; color: #1e6b34; }
.flash.error { background: #fdecea; color: #8a1c1c; }
section { margin: 2rem 0; }
img.chart { max-width: 100%; border: 1px solid #eee; }
video { max-width: 100%; }
.moment { background: #f5f7ff; padding: 0.8rem 1rem; border-radius: 6px; }
.transcription { white-space: pre-wrap; background: #fafafa; padding: 1rem; }
"#;

/// Choose the moment to show: the requested one, else the first.
pub fn selected_moment<'a>(report: &'a SentimentReport, requested: Option<&str>) -> Option<&'a Moment> {
    requested
        .and_then(|ts| report.moment_at(ts))
        .or_else(|| report.emotional_moments.first())
}

pub fn render_page(page: &PageState, requested_moment: Option<&str>) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Video Sentiment Analysis</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>");
    html.push_str("<h1>Video Sentiment Analysis</h1>\n");
    html.push_str("<p class=\"subtitle\">Upload a video to analyze its emotional content.</p>\n");

    if let Some(flash) = &page.flash {
        let class = match flash.kind {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        };
        let _ = writeln!(
            html,
            "<div class=\"flash {class}\">{}</div>",
            escape(&flash.message)
        );
    }

    push_upload_form(&mut html);

    if let Some(video) = &page.video {
        let _ = writeln!(
            html,
            "<section><video controls src=\"/video\" title=\"{}\"></video></section>",
            escape(&video.file_name)
        );
    }

    if let Some(outcome) = &page.outcome {
        push_report(&mut html, &outcome.report, requested_moment);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_upload_form(html: &mut String) {
    let accept: Vec<String> = SUPPORTED_EXTENSIONS.iter().map(|e| format!(".{e}")).collect();
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/analyze\" enctype=\"multipart/form-data\">\n\
         <label>Choose a video file ({})</label>\n\
         <input type=\"file\" name=\"video\" accept=\"{}\" required>\n\
         <button type=\"submit\">Analyze</button>\n</form>",
        SUPPORTED_EXTENSIONS.join(", "),
        accept.join(",")
    );
}

fn push_report(html: &mut String, report: &SentimentReport, requested_moment: Option<&str>) {
    html.push_str("<section>\n<h2>Overall Sentiment</h2>\n");
    let _ = writeln!(html, "<p>{}</p>\n</section>", escape(&report.overall_sentiment));

    html.push_str("<section>\n<h2>Sentiment Timeline</h2>\n");
    html.push_str("<img class=\"chart\" src=\"/charts/timeline.svg\" alt=\"Sentiment timeline\">\n</section>\n");

    html.push_str("<section>\n<h2>Emotion Word Cloud</h2>\n");
    html.push_str("<img class=\"chart\" src=\"/charts/wordcloud.svg\" alt=\"Emotion word cloud\">\n</section>\n");

    html.push_str("<section>\n<h2>Key Emotional Moments</h2>\n<ul>\n");
    for moment in &report.emotional_moments {
        let _ = writeln!(
            html,
            "<li><strong>{}</strong> - {}: {}</li>",
            escape(&moment.timestamp),
            escape(&moment.emotion),
            escape(&moment.description)
        );
    }
    html.push_str("</ul>\n</section>\n");

    html.push_str("<section>\n<h2>Emotion Distribution</h2>\n");
    html.push_str("<img class=\"chart\" src=\"/charts/emotions.svg\" alt=\"Emotion distribution\">\n</section>\n");

    html.push_str("<section>\n<h2>Transcription</h2>\n");
    let _ = writeln!(
        html,
        "<div class=\"transcription\">{}</div>\n</section>",
        escape(&report.transcription)
    );

    push_moment_browser(html, report, requested_moment);
}

fn push_moment_browser(html: &mut String, report: &SentimentReport, requested_moment: Option<&str>) {
    let Some(current) = selected_moment(report, requested_moment) else {
        return;
    };

    html.push_str("<section>\n<h2>Explore Emotional Moments</h2>\n");
    html.push_str("<form method=\"get\" action=\"/\">\n<select name=\"moment\" onchange=\"this.form.submit()\">\n");
    for moment in &report.emotional_moments {
        let selected = if moment.timestamp == current.timestamp {
            " selected"
        } else {
            ""
        };
        let ts = escape(&moment.timestamp);
        let _ = writeln!(html, "<option value=\"{ts}\"{selected}>{ts}</option>");
    }
    html.push_str("</select>\n<button type=\"submit\">Show</button>\n</form>\n");

    let _ = writeln!(
        html,
        "<div class=\"moment\"><p><strong>Emotion at {}:</strong> {}</p><p><strong>Description:</strong> {}</p></div>\n</section>",
        escape(&current.timestamp),
        escape(&current.emotion),
        escape(&current.description)
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sentiscope_core::{AnalysisOutcome, ParseDiagnostics, RemoteFile};

    use super::*;
    use crate::state::Flash;

    fn moment(ts: &str, emotion: &str) -> Moment {
        Moment {
            timestamp: ts.into(),
            emotion: emotion.into(),
            description: format!("{emotion} happens"),
        }
    }

    fn page_with_report() -> PageState {
        let report = SentimentReport {
            overall_sentiment: "Upbeat <mostly>".into(),
            emotional_moments: vec![moment("00:05", "Joy"), moment("00:40", "Fear")],
            key_emotions: vec!["Joy".into()],
            ..SentimentReport::default()
        };
        PageState {
            outcome: Some(Arc::new(AnalysisOutcome {
                report,
                diagnostics: ParseDiagnostics::default(),
                file: RemoteFile::default(),
                cached_upload: false,
                raw_response: String::new(),
            })),
            ..PageState::default()
        }
    }

    #[test]
    fn empty_session_shows_only_the_form() {
        let html = render_page(&PageState::default(), None);
        assert!(html.contains("action=\"/analyze\""));
        assert!(html.contains("accept=\".mp4,.avi,.mov,.mpeg\""));
        assert!(!html.contains("Overall Sentiment"));
        assert!(!html.contains("<video"));
    }

    #[test]
    fn report_is_escaped_and_charted() {
        let html = render_page(&page_with_report(), None);
        assert!(html.contains("Upbeat &lt;mostly&gt;"));
        assert!(html.contains("/charts/timeline.svg"));
        assert!(html.contains("/charts/wordcloud.svg"));
        assert!(html.contains("/charts/emotions.svg"));
    }

    #[test]
    fn moment_browser_defaults_to_first_moment() {
        let html = render_page(&page_with_report(), Some("09:99"));
        assert!(html.contains("<option value=\"00:05\" selected>"));
        assert!(html.contains("Emotion at 00:05:</strong> Joy"));
    }

    #[test]
    fn moment_browser_follows_selection() {
        let html = render_page(&page_with_report(), Some("00:40"));
        assert!(html.contains("<option value=\"00:40\" selected>"));
        assert!(html.contains("Emotion at 00:40:</strong> Fear"));
        assert!(html.contains("Description:</strong> Fear happens"));
    }

    #[test]
    fn flash_is_rendered_with_its_kind() {
        let page = PageState {
            flash: Some(Flash::error("Error: bad <file>")),
            ..PageState::default()
        };
        let html = render_page(&page, None);
        assert!(html.contains("<div class=\"flash error\">Error: bad &lt;file&gt;</div>"));
    }
}
