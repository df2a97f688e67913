use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use sentiscope_core::{
    Analyzer, AnalyzerConfig, ParseDiagnostics, SentimentReport, content_hash,
    emotion_pie_chart, format_report_readable, get_cache_dir, get_report_path,
    get_root_cache_dir, load_report,
    render::{pie_chart_svg, timeline_svg, word_cloud_svg},
    save_report, timeline_chart, validate, video_mime_type, word_cloud,
};
use tokio::fs;
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "sentiscope")]
#[command(about = "Analyze the sentiment of a video with Gemini and print a readable report")]
struct Cli {
    /// Video file (mp4, avi, mov, mpeg)
    video: PathBuf,

    /// Force re-analysis even if a cached report exists
    #[arg(short, long)]
    force: bool,

    /// Write timeline, word cloud and emotion SVG charts into this directory
    #[arg(short, long)]
    charts: Option<PathBuf>,

    /// Print the report as JSON instead of markdown
    #[arg(long)]
    json: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

async fn write_charts(report: &SentimentReport, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let timeline = timeline_svg(&timeline_chart(&report.sentiment_timeline));
    let cloud = word_cloud_svg(&word_cloud(&report.key_emotions));
    let emotions = pie_chart_svg(&emotion_pie_chart(&report.key_emotions));

    for (name, svg) in [
        ("timeline.svg", timeline),
        ("wordcloud.svg", cloud),
        ("emotions.svg", emotions),
    ] {
        let path = dir.join(name);
        fs::write(&path, svg)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AnalyzerConfig::from_env();
    // Status lines go to stdout only when stdout carries the readable report.
    let chatty = !cli.json;

    // Validate API key early
    if let Err(e) = config.provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    let file_name = cli
        .video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = match video_mime_type(&file_name) {
        Ok(mime) => mime,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let bytes = fs::read(&cli.video)
        .await
        .with_context(|| format!("reading {}", cli.video.display()))?;

    let cache_dir = get_cache_dir(&get_root_cache_dir(), content_hash(&bytes));
    fs::create_dir_all(&cache_dir).await?;
    let report_path = get_report_path(&cache_dir, &config.provider);

    if chatty {
        println!(
            "\n{}  {}\n",
            style("sentiscope").cyan().bold(),
            style("Video Sentiment Analyzer").dim()
        );
        println!("{}", style("─".repeat(60)).dim());
    }

    let total_start = Instant::now();

    let (report, diagnostics) = if !cli.force && report_path.exists() {
        let report = load_report(&report_path).await?;
        tracing::info!(path = %report_path.display(), "using cached report");
        let diagnostics = validate(&report);
        if chatty {
            println!(
                "{} Analyzed ({}) {}",
                style("✓").green().bold(),
                config.provider.name(),
                style("(cached)").dim()
            );
        }
        (report, diagnostics)
    } else {
        let analyzed = analyze(&config, &bytes, mime_type, &file_name, chatty).await?;
        save_report(&analyzed.0, &report_path).await?;
        analyzed
    };

    if !diagnostics.is_complete() {
        let missing: Vec<String> = diagnostics.missing.iter().map(|s| s.to_string()).collect();
        eprintln!(
            "{} model response is missing: {}",
            style("Warning:").yellow().bold(),
            missing.join(", ")
        );
    }

    if let Some(dir) = &cli.charts {
        write_charts(&report, dir).await?;
        if chatty {
            println!(
                "{} Charts written to {}",
                style("✓").green().bold(),
                style(dir.display()).cyan()
            );
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\n{} {}",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}\n",
        style("Saved:").dim(),
        style(report_path.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    println!("{}", format_report_readable(&report, &diagnostics));

    Ok(())
}

async fn analyze(
    config: &AnalyzerConfig,
    bytes: &[u8],
    mime_type: &str,
    file_name: &str,
    chatty: bool,
) -> Result<(SentimentReport, ParseDiagnostics)> {
    let analyzer = Analyzer::from_config(config)?;

    // Step 1: Upload and wait for processing
    let step_start = Instant::now();
    let spinner = create_spinner("Uploading and processing video...");
    let video = match analyzer.process(bytes, mime_type, file_name).await {
        Ok(video) => video,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    let step_done = format!(
        "{} Processed: {} {}",
        style("✓").green().bold(),
        style(file_name).dim(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    );
    if chatty {
        spinner.finish_with_message(step_done);
    } else {
        spinner.finish_and_clear();
    }

    // Step 2: Sentiment analysis
    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Analyzing with {}...", config.provider.name()));
    let result = analyzer.analyze(&video).await;
    analyzer.processor().release(&video.file).await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    if !outcome.diagnostics.is_complete() {
        tracing::debug!(response = %outcome.raw_response, "unparsed model response");
    }
    let step_done = format!(
        "{} Analyzed ({}) {}",
        style("✓").green().bold(),
        config.provider.name(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    );
    if chatty {
        spinner.finish_with_message(step_done);
    } else {
        spinner.finish_and_clear();
    }

    Ok((outcome.report, outcome.diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["sentiscope", "clip.mp4", "--force", "--charts", "out"]);
        assert_eq!(cli.video, PathBuf::from("clip.mp4"));
        assert!(cli.force);
        assert_eq!(cli.charts, Some(PathBuf::from("out")));
        assert!(!cli.json);
    }
}
