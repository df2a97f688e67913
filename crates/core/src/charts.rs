//! Chart models built from a parsed report.
//!
//! Every builder is pure and accepts empty input, returning an empty chart
//! that renderers show as a "No data" placeholder.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::TimelinePoint;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w']+").unwrap());

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "in", "into", "is",
        "it", "its", "of", "on", "or", "so", "than", "that", "the", "then", "this", "to", "very",
        "was", "with",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub seconds: f64,
    pub score: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

impl LineChart {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (min, max) of the x axis, `None` for an empty chart.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        range(self.points.iter().map(|p| p.seconds))
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        range(self.points.iter().map(|p| p.score))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub fraction: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub total: usize,
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub text: String,
    pub count: usize,
    pub weight: f64,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCloud {
    pub width: f64,
    pub height: f64,
    pub words: Vec<PlacedWord>,
}

impl WordCloud {
    pub const WIDTH: f64 = 800.0;
    pub const HEIGHT: f64 = 400.0;
    const MAX_FONT: f64 = 96.0;
    const MIN_FONT: f64 = 12.0;

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Convert an `MM:SS` timestamp to elapsed seconds.
///
/// The value is read as `00:MM:SS`, so minutes and seconds above 59 simply
/// add up (`"00:75"` is 75 seconds).
pub fn timestamp_to_seconds(timestamp: &str) -> Option<f64> {
    let full = format!("00:{}", timestamp.trim());
    let mut parts = full.split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let hours: u64 = h.parse().ok()?;
    let minutes: u64 = m.parse().ok()?;
    let seconds: f64 = s.parse().ok()?;
    if seconds < 0.0 || !seconds.is_finite() {
        return None;
    }

    let whole = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?;
    Some(whole as f64 + seconds)
}

pub fn timeline_chart(points: &[TimelinePoint]) -> LineChart {
    let points = points
        .iter()
        .filter_map(|p| match timestamp_to_seconds(&p.timestamp) {
            Some(seconds) => Some(ChartPoint {
                seconds,
                score: p.score,
                timestamp: p.timestamp.clone(),
            }),
            None => {
                tracing::warn!(timestamp = %p.timestamp, "skipping timeline point with bad timestamp");
                None
            }
        })
        .collect();

    LineChart {
        title: "Sentiment Timeline".to_string(),
        x_label: "Time (seconds)".to_string(),
        y_label: "Sentiment Score".to_string(),
        points,
    }
}

pub fn emotion_pie_chart(emotions: &[String]) -> PieChart {
    let counts = value_counts(emotions.iter().map(|e| e.trim()).filter(|e| !e.is_empty()));
    let total: usize = counts.iter().map(|(_, c)| c).sum();

    let mut angle = 0.0;
    let slices = counts
        .into_iter()
        .map(|(label, count)| {
            let fraction = count as f64 / total as f64;
            let start_angle = angle;
            angle += fraction * 360.0;
            PieSlice {
                label: label.to_string(),
                count,
                fraction,
                start_angle,
                end_angle: angle,
            }
        })
        .collect();

    PieChart {
        title: "Key Emotions Distribution".to_string(),
        total,
        slices,
    }
}

pub fn word_cloud(emotions: &[String]) -> WordCloud {
    let joined = emotions.join(" ");

    // Count case-insensitively, display the first spelling seen.
    let mut display: HashMap<String, &str> = HashMap::new();
    let keys = WORD_RE
        .find_iter(&joined)
        .map(|m| m.as_str())
        .filter(|w| !STOPWORDS.contains(w.to_lowercase().as_str()))
        .map(|w| {
            let key = w.to_lowercase();
            display.entry(key.clone()).or_insert(w);
            key
        })
        .collect::<Vec<_>>();
    let counts = value_counts(keys.iter().map(String::as_str));

    let Some(max_count) = counts.first().map(|(_, c)| *c) else {
        return WordCloud {
            width: WordCloud::WIDTH,
            height: WordCloud::HEIGHT,
            words: Vec::new(),
        };
    };

    let mut placed: Vec<PlacedWord> = Vec::new();
    for (key, count) in counts {
        let text = display.get(key).copied().unwrap_or(key).to_string();
        let weight = count as f64 / max_count as f64;
        let mut font_size = WordCloud::MAX_FONT * (0.5 * weight + 0.5);

        while font_size >= WordCloud::MIN_FONT {
            if let Some((x, y, width, height)) = place(&text, font_size, &placed) {
                placed.push(PlacedWord {
                    text: text.clone(),
                    count,
                    weight,
                    font_size,
                    x,
                    y,
                    width,
                    height,
                });
                break;
            }
            font_size -= 4.0;
        }

        if font_size < WordCloud::MIN_FONT {
            tracing::debug!(word = %text, "no room left in word cloud");
        }
    }

    WordCloud {
        width: WordCloud::WIDTH,
        height: WordCloud::HEIGHT,
        words: placed,
    }
}

/// Walk an Archimedean spiral out from the centre until the word's box fits.
fn place(text: &str, font_size: f64, placed: &[PlacedWord]) -> Option<(f64, f64, f64, f64)> {
    let width = text.chars().count() as f64 * font_size * 0.6;
    let height = font_size * 1.1;
    if width > WordCloud::WIDTH || height > WordCloud::HEIGHT {
        return None;
    }

    let (cx, cy) = (WordCloud::WIDTH / 2.0, WordCloud::HEIGHT / 2.0);
    let aspect = WordCloud::WIDTH / WordCloud::HEIGHT;

    for step in 0..4000 {
        let t = step as f64 * 0.1;
        let r = 1.5 * t;
        let x = cx + aspect * r * t.cos() - width / 2.0;
        let y = cy + r * t.sin() - height / 2.0;

        if x < 0.0 || y < 0.0 || x + width > WordCloud::WIDTH || y + height > WordCloud::HEIGHT {
            continue;
        }

        let overlaps = placed.iter().any(|p| {
            x < p.x + p.width && x + width > p.x && y < p.y + p.height && y + height > p.y
        });
        if !overlaps {
            return Some((x, y, width, height));
        }
    }

    None
}

/// Occurrence counts ordered by count descending, ties by first appearance.
fn value_counts<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        match index.get(item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
