//! Init command - first-run setup and series registration.

use super::doctor::install_hint;
use crate::cli::Output;
use crate::config::{SeriesConfig, Settings};
use crate::tools;
use crate::youtube::extract_playlist_id;
use console::style;
use std::io::{self, Write};
use std::path::PathBuf;

/// What `talkbook init` was asked to do.
#[derive(Debug, Default)]
pub struct InitOptions {
    pub series: Option<String>,
    pub playlist: Option<String>,
    pub title: Option<String>,
    pub yes: bool,
}

/// Run the init command.
pub fn run_init(
    options: &InitOptions,
    mut settings: Settings,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    Output::header("Talkbook Setup");
    println!();

    println!("{}", style("Step 1: Checking tools").bold().cyan());
    println!();
    let missing = missing_tools(&settings);
    if missing.is_empty() {
        Output::success("yt-dlp and pandoc are installed!");
    } else {
        for name in &missing {
            println!("  {} {} - not found", style("✗").red(), style(name).bold());
            println!("    {} {}", style("→").dim(), style(install_hint(name)).dim());
        }
        println!();
        Output::info("The transcript API path works without them; install them for full coverage.");
    }
    println!();

    println!("{}", style("Step 2: Series").bold().cyan());
    println!();
    if let Some(slug) = &options.series {
        let series = new_series(slug, options.playlist.as_deref(), options.title.as_deref())?;
        Output::success(&format!("Registered series '{}' ({})", series.slug, series.title));
        let paths = settings.series_paths(&series);
        settings.upsert_series(series);
        paths.ensure()?;
        Output::kv("Data", &paths.data_dir().display().to_string());
        Output::kv("Chapters", &paths.content_dir().display().to_string());
    } else {
        Output::info("No series given; add one later with --series <slug> --playlist <id>.");
    }
    println!();

    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);
    let exists = config_path.exists();
    let should_write = options.series.is_some()
        || (!exists && (options.yes || prompt_continue("Create default configuration file?")?));

    if should_write {
        settings.save_to(&config_path)?;
        Output::success(&format!("Wrote config file: {}", config_path.display()));
    } else if exists {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("talkbook doctor").cyan());
    println!("  {} Build a book end to end", style("talkbook update <series>").cyan());
    Ok(())
}

/// A series entry from the init flags.
fn new_series(slug: &str, playlist: Option<&str>, title: Option<&str>) -> anyhow::Result<SeriesConfig> {
    let slug = crate::book::slugify(slug, 80);
    if slug.is_empty() {
        anyhow::bail!("series slug must contain letters or digits");
    }
    let mut series = SeriesConfig::new(&slug);
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        series.title = title.trim().to_string();
    }
    if let Some(raw) = playlist {
        let id = extract_playlist_id(raw)
            .ok_or_else(|| anyhow::anyhow!("not a playlist id or URL: {raw}"))?;
        series.playlist_id = Some(id);
    }
    Ok(series)
}

fn missing_tools(settings: &Settings) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if tools::which(&tools::yt_dlp_program(&settings.tools)).is_none() {
        missing.push("yt-dlp");
    }
    if tools::which(&settings.tools.pandoc).is_none() {
        missing.push("pandoc");
    }
    missing
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_series_from_flags() {
        let series = new_series(
            "AI Startup School",
            Some("https://www.youtube.com/playlist?list=PLQ-uHSnFig5M9fW16o2l35jrfdsxGknNB"),
            None,
        )
        .unwrap();
        assert_eq!(series.slug, "ai-startup-school");
        assert_eq!(series.title, "Ai Startup School");
        assert_eq!(
            series.playlist_id.as_deref(),
            Some("PLQ-uHSnFig5M9fW16o2l35jrfdsxGknNB")
        );
        assert!(new_series("!!!", None, None).is_err());
        assert!(new_series("demo", Some("nope"), None).is_err());
    }

    #[test]
    fn test_init_writes_series_to_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.project_root = tmp.path().to_string_lossy().into_owned();
        let config = tmp.path().join("config.toml");
        let options = InitOptions {
            series: Some("demo".to_string()),
            title: Some("Demo Days".to_string()),
            yes: true,
            ..Default::default()
        };
        run_init(&options, settings, Some(config.clone())).unwrap();

        let loaded = Settings::load_from(Some(&config)).unwrap();
        assert_eq!(loaded.series("demo").unwrap().title, "Demo Days");
        assert!(tmp.path().join("content").join("demo").is_dir());
    }
}
