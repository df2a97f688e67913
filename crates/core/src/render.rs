//! Standalone SVG rendering of the chart models.

use std::fmt::Write;

use crate::charts::{LineChart, PieChart, WordCloud};

const PALETTE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];

const FONT: &str = "font-family=\"Helvetica, Arial, sans-serif\"";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

fn placeholder(width: f64, height: f64, title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><rect width="100%" height="100%" fill="white"/><text x="{tx}" y="24" {FONT} font-size="16" text-anchor="middle">{title}</text><text x="{tx}" y="{ty}" {FONT} font-size="14" fill="#888" text-anchor="middle">No data</text></svg>"##,
        tx = width / 2.0,
        ty = height / 2.0,
        title = escape(title),
    )
}

pub fn timeline_svg(chart: &LineChart) -> String {
    const W: f64 = 720.0;
    const H: f64 = 360.0;
    const LEFT: f64 = 60.0;
    const RIGHT: f64 = 20.0;
    const TOP: f64 = 40.0;
    const BOTTOM: f64 = 50.0;

    let (Some((x_min, x_max)), Some((y_lo, y_hi))) = (chart.x_range(), chart.y_range()) else {
        return placeholder(W, H, &chart.title);
    };
    let (x_min, x_max) = if x_max > x_min {
        (x_min, x_max)
    } else {
        (x_min - 1.0, x_max + 1.0)
    };
    let (y_min, y_max) = (y_lo.min(-1.0), y_hi.max(1.0));

    let plot_w = W - LEFT - RIGHT;
    let plot_h = H - TOP - BOTTOM;
    let sx = |x: f64| LEFT + (x - x_min) / (x_max - x_min) * plot_w;
    let sy = |y: f64| TOP + (y_max - y) / (y_max - y_min) * plot_h;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{W}" height="{H}" viewBox="0 0 {W} {H}"><rect width="100%" height="100%" fill="white"/>"#
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="24" {FONT} font-size="16" text-anchor="middle">{}</text>"#,
        W / 2.0,
        escape(&chart.title)
    );

    for i in 0..=4 {
        let y = y_min + (y_max - y_min) * i as f64 / 4.0;
        let _ = write!(
            svg,
            r##"<line x1="{LEFT}" x2="{}" y1="{py:.1}" y2="{py:.1}" stroke="#e5e5e5"/><text x="{}" y="{:.1}" {FONT} font-size="11" text-anchor="end">{y:.2}</text>"##,
            W - RIGHT,
            LEFT - 6.0,
            sy(y) + 4.0,
            py = sy(y),
        );
        let x = x_min + (x_max - x_min) * i as f64 / 4.0;
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{}" {FONT} font-size="11" text-anchor="middle">{x:.0}</text>"#,
            sx(x),
            H - BOTTOM + 16.0,
        );
    }

    if y_min < 0.0 && y_max > 0.0 {
        let _ = write!(
            svg,
            r##"<line x1="{LEFT}" x2="{}" y1="{py:.1}" y2="{py:.1}" stroke="#999" stroke-dasharray="4 3"/>"##,
            W - RIGHT,
            py = sy(0.0),
        );
    }

    let path: Vec<String> = chart
        .points
        .iter()
        .map(|p| format!("{:.1},{:.1}", sx(p.seconds), sy(p.score)))
        .collect();
    let _ = write!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        path.join(" "),
        color(0)
    );

    for p in &chart.points {
        let _ = write!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"><title>{} ({}s): {}</title></circle>"#,
            sx(p.seconds),
            sy(p.score),
            color(0),
            escape(&p.timestamp),
            p.seconds,
            p.score
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" {FONT} font-size="12" text-anchor="middle">{}</text><text x="16" y="{}" {FONT} font-size="12" text-anchor="middle" transform="rotate(-90 16 {})">{}</text></svg>"#,
        LEFT + plot_w / 2.0,
        H - 10.0,
        escape(&chart.x_label),
        TOP + plot_h / 2.0,
        TOP + plot_h / 2.0,
        escape(&chart.y_label),
    );

    svg
}

pub fn pie_chart_svg(chart: &PieChart) -> String {
    const W: f64 = 520.0;
    const H: f64 = 360.0;
    const CX: f64 = 180.0;
    const CY: f64 = 195.0;
    const R: f64 = 130.0;

    if chart.is_empty() {
        return placeholder(W, H, &chart.title);
    }

    let point = |deg: f64| {
        let rad = deg.to_radians();
        (CX + R * rad.sin(), CY - R * rad.cos())
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{W}" height="{H}" viewBox="0 0 {W} {H}"><rect width="100%" height="100%" fill="white"/><text x="{}" y="24" {FONT} font-size="16" text-anchor="middle">{}</text>"#,
        W / 2.0,
        escape(&chart.title)
    );

    for (i, slice) in chart.slices.iter().enumerate() {
        let tooltip = format!(
            "{}: {} ({:.1}%)",
            escape(&slice.label),
            slice.count,
            slice.fraction * 100.0
        );
        if chart.slices.len() == 1 {
            let _ = write!(
                svg,
                r#"<circle cx="{CX}" cy="{CY}" r="{R}" fill="{}"><title>{tooltip}</title></circle>"#,
                color(i)
            );
            continue;
        }

        let (x1, y1) = point(slice.start_angle);
        let (x2, y2) = point(slice.end_angle);
        let large_arc = u8::from(slice.end_angle - slice.start_angle > 180.0);
        let _ = write!(
            svg,
            r#"<path d="M{CX},{CY} L{x1:.2},{y1:.2} A{R},{R} 0 {large_arc} 1 {x2:.2},{y2:.2} Z" fill="{}" stroke="white"><title>{tooltip}</title></path>"#,
            color(i)
        );
    }

    for (i, slice) in chart.slices.iter().enumerate() {
        let y = 60.0 + i as f64 * 22.0;
        let _ = write!(
            svg,
            r#"<rect x="340" y="{}" width="12" height="12" fill="{}"/><text x="358" y="{}" {FONT} font-size="12">{} ({:.1}%)</text>"#,
            y - 10.0,
            color(i),
            y,
            escape(&slice.label),
            slice.fraction * 100.0
        );
    }

    svg.push_str("</svg>");
    svg
}

pub fn word_cloud_svg(cloud: &WordCloud) -> String {
    if cloud.is_empty() {
        return placeholder(cloud.width, cloud.height, "Key Emotions");
    }

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="white"/>"#,
        w = cloud.width,
        h = cloud.height
    );

    for (i, word) in cloud.words.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" {FONT} font-size="{:.0}" fill="{}" text-anchor="middle"><title>{}: {}</title>{}</text>"#,
            word.x + word.width / 2.0,
            word.y + word.height * 0.8,
            word.font_size,
            color(i),
            escape(&word.text),
            word.count,
            escape(&word.text)
        );
    }

    svg.push_str("</svg>");
    svg
}
