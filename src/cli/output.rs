//! CLI output formatting utilities.

use crate::orchestrator::PipelineReport;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a series line for `list`.
    pub fn series_info(slug: &str, title: &str, talks: usize, transcripts: usize, chapters: usize) {
        println!(
            "  {} {} ({}, {}/{} transcripts, {} chapters)",
            style("*").cyan(),
            style(title).bold(),
            style(slug).dim(),
            transcripts,
            talks,
            chapters
        );
    }

    /// Summarize a pipeline run.
    pub fn report(report: &PipelineReport) {
        Output::header("Summary");
        if report.videos_discovered > 0 {
            Output::kv("Videos discovered", &report.videos_discovered.to_string());
        }
        if report.videos_fetched > 0 {
            Output::kv(
                "Transcripts found",
                &format!("{}/{}", report.transcripts_found, report.videos_fetched),
            );
        }
        if let Some(enrich) = &report.enrich {
            Output::kv(
                "Enriched",
                &format!(
                    "{} dates, {} urls, {} cleaned",
                    enrich.dates_filled, enrich.urls_filled, enrich.transcripts_cleaned
                ),
            );
        }
        if report.chapters_written > 0 {
            Output::kv("Chapters written", &report.chapters_written.to_string());
        }
        if report.chapters_polished > 0 {
            Output::kv("Chapters polished", &report.chapters_polished.to_string());
        }
        if report.placeholders > 0 {
            Output::kv(
                "Placeholders",
                &style(report.placeholders).yellow().to_string(),
            );
        }
        if let Some(path) = &report.book_path {
            Output::kv(
                "Book",
                &format!("{} ({} chapters)", path.display(), report.book_chapters),
            );
        }
        for path in &report.exported {
            Output::kv("Exported", &path.display().to_string());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Shorten text for one-line display.
pub fn preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("a\nb", 10), "a b");
    }
}
