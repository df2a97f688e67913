use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use sentiscope_core::{
    SentimentReport, emotion_pie_chart,
    render::{pie_chart_svg, timeline_svg, word_cloud_svg},
    timeline_chart, video_mime_type, word_cloud,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    page::render_page,
    session,
    state::{AppState, Flash, PageState, UploadedVideo},
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub moment: Option<String>,
}

fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let (id, cookie) = session::resolve(&state, &headers);
    let page = take_page(&state, id);
    let html = render_page(&page, query.moment.as_deref());
    with_cookie(Html(html).into_response(), cookie)
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let (id, cookie) = session::resolve(&state, &headers);

    let flash = match read_video(multipart).await {
        Ok(Some((file_name, bytes))) => run_analysis(&state, id, file_name, bytes).await,
        Ok(None) => Flash::error("Error: please choose a video file to upload."),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read upload");
            Flash::error(format!("An unexpected error occurred: {e}"))
        }
    };

    state.sessions.update(id, |page| page.flash = Some(flash));
    with_cookie(Redirect::to("/").into_response(), cookie)
}

/// Snapshot of the session for rendering; the flash is shown once.
fn take_page(state: &AppState, id: Uuid) -> PageState {
    state.sessions.update(id, |page| {
        let snapshot = page.clone();
        page.flash = None;
        snapshot
    })
}

/// The `video` field's file name and contents, if it was sent.
async fn read_video(
    mut multipart: Multipart,
) -> Result<Option<(String, Bytes)>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("video") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some((file_name, bytes)));
    }
    Ok(None)
}

async fn run_analysis(state: &AppState, id: Uuid, file_name: String, bytes: Bytes) -> Flash {
    let mime_type = match video_mime_type(&file_name) {
        Ok(mime) => mime,
        Err(e) => return Flash::from_error(&e),
    };

    match state.analyzer.run(&bytes, mime_type, &file_name).await {
        Ok(outcome) => {
            tracing::info!(
                session = %id,
                file = %file_name,
                cached = outcome.cached_upload,
                "analysis complete"
            );
            let flash = if outcome.diagnostics.is_complete() {
                Flash::success("Analysis complete!")
            } else {
                let missing: Vec<String> =
                    outcome.diagnostics.missing.iter().map(|s| s.to_string()).collect();
                Flash::success(format!(
                    "Analysis complete, but the response was missing: {}",
                    missing.join(", ")
                ))
            };
            // The preview and the report always describe the same upload.
            let video = UploadedVideo {
                file_name,
                mime_type,
                bytes,
            };
            let outcome = Arc::new(outcome);
            state.sessions.update(id, |page| {
                page.video = Some(video);
                page.outcome = Some(outcome);
            });
            flash
        }
        Err(e) => {
            tracing::error!(session = %id, file = %file_name, error = %e, "analysis failed");
            Flash::from_error(&e)
        }
    }
}

/// Render one of the report's charts as SVG.
pub fn chart_svg(name: &str, report: &SentimentReport) -> Option<String> {
    match name {
        "timeline.svg" => Some(timeline_svg(&timeline_chart(&report.sentiment_timeline))),
        "wordcloud.svg" => Some(word_cloud_svg(&word_cloud(&report.key_emotions))),
        "emotions.svg" => Some(pie_chart_svg(&emotion_pie_chart(&report.key_emotions))),
        _ => None,
    }
}

pub async fn chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    let page = session::session_from_headers(&headers)
        .and_then(|id| state.sessions.get(&id))
        .unwrap_or_default();
    let report = page
        .outcome
        .as_ref()
        .map(|outcome| outcome.report.clone())
        .unwrap_or_default();

    match chart_svg(&name, &report) {
        Some(svg) => (
            [
                (header::CONTENT_TYPE, "image/svg+xml"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            svg,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn video(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let video = session::session_from_headers(&headers)
        .and_then(|id| state.sessions.get(&id))
        .and_then(|page| page.video);

    match video {
        Some(video) => (
            [
                (header::CONTENT_TYPE, video.mime_type),
                (header::CACHE_CONTROL, "no-store"),
            ],
            video.bytes,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}
