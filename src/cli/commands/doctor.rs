//! Doctor command - verify external tools and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::tools;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Talkbook Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let downloader = tools::yt_dlp_program(&settings.tools);
    let browser = Settings::expand_path(&settings.tools.browser)
        .to_string_lossy()
        .into_owned();
    let tool_checks = vec![
        check_tool("yt-dlp", &downloader, install_hint("yt-dlp"), settings.fetch.use_downloader),
        check_tool("browser", &browser, install_hint("browser"), settings.fetch.use_browser),
        check_tool(
            "pandoc",
            &settings.tools.pandoc,
            install_hint("pandoc"),
            !settings.book.export_formats.is_empty(),
        ),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);
    println!();

    println!("{}", style("Transcript Paths").bold());
    let path_checks = check_fetch_paths(settings);
    for check in &path_checks {
        check.print();
    }
    checks.extend(path_checks);
    println!();

    println!("{}", style("Series").bold());
    let series_checks = check_series(settings);
    for check in &series_checks {
        check.print();
    }
    checks.extend(series_checks);
    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{errors} error(s) found."));
        anyhow::bail!("doctor found {errors} error(s)");
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {warnings} warning(s)."));
    } else {
        Output::success("All checks passed! Talkbook is ready to use.");
    }
    Ok(())
}

/// Run `<program> --version`. A missing tool is an error only when `required`.
fn check_tool(name: &str, program: &str, hint: &str, required: bool) -> CheckResult {
    match Command::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                CheckResult::error(name, &format!("{program} not found"), hint)
            } else {
                CheckResult::warning(name, &format!("{program} not found (not needed by current config)"), hint)
            }
        }
        Err(e) => CheckResult::error(name, &format!("error: {e}"), hint),
    }
}

fn check_fetch_paths(settings: &Settings) -> Vec<CheckResult> {
    let fetch = &settings.fetch;
    let mut results = Vec::new();

    let enabled: Vec<&str> = [
        ("api", fetch.use_api),
        ("downloader", fetch.use_downloader),
        ("browser", fetch.use_browser),
    ]
    .into_iter()
    .filter(|(_, on)| *on)
    .map(|(name, _)| name)
    .collect();
    if enabled.is_empty() {
        results.push(CheckResult::error(
            "Strategies",
            "all disabled",
            "Enable at least one of fetch.use_api, fetch.use_downloader, fetch.use_browser",
        ));
    } else {
        results.push(CheckResult::ok("Strategies", &enabled.join(" → ")));
    }

    match fetch.cookies_path() {
        Some(path) if path.exists() => {
            results.push(CheckResult::ok("Cookie file", &path.display().to_string()))
        }
        Some(path) => results.push(CheckResult::error(
            "Cookie file",
            &format!("{} does not exist", path.display()),
            "Export cookies in Netscape format or remove fetch.cookies_file",
        )),
        None => match &fetch.cookies_from_browser {
            Some(browser) => results.push(CheckResult::ok(
                "Cookies",
                &format!("read from {browser} by yt-dlp"),
            )),
            None => results.push(CheckResult::warning(
                "Cookies",
                "none configured",
                "Some videos need a signed-in session; set fetch.cookies_file or fetch.cookies_from_browser",
            )),
        },
    }
    results
}

fn check_series(settings: &Settings) -> Vec<CheckResult> {
    if settings.series.is_empty() {
        return vec![CheckResult::warning(
            "Series",
            "none configured",
            "Add one with: talkbook init --series <slug> --playlist <id>",
        )];
    }
    settings
        .series
        .iter()
        .map(|series| {
            let paths = settings.series_paths(series);
            if series.playlist_id.is_none() && series.playlist_query.is_none() {
                return CheckResult::warning(
                    &series.slug,
                    "no playlist id or query; the title is used as search query",
                    "Set playlist_id for reliable discovery",
                );
            }
            match paths.metadata_path() {
                Some(meta) if !meta.exists() => CheckResult::warning(
                    &series.slug,
                    &format!("metadata file {} is missing", meta.display()),
                    "Create it or remove metadata_file",
                ),
                _ => CheckResult::ok(&series.slug, &describe_dir(&paths.data_dir())),
            }
        })
        .collect()
}

fn describe_dir(dir: &Path) -> String {
    if dir.exists() {
        dir.display().to_string()
    } else {
        format!("{} (will be created)", dir.display())
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: talkbook init (or talkbook config edit)",
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Platform-specific install hint.
pub(crate) fn install_hint(tool: &str) -> &'static str {
    match tool {
        "yt-dlp" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install yt-dlp"
            } else if cfg!(target_os = "linux") {
                "Install with: pip install yt-dlp (or your package manager)"
            } else {
                "Install from: https://github.com/yt-dlp/yt-dlp"
            }
        }
        "pandoc" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install pandoc"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install pandoc (or your package manager)"
            } else {
                "Install from: https://pandoc.org/installing.html"
            }
        }
        "browser" => "Install Chromium or set tools.browser to a driver that prints the rendered page",
        _ => "Check the documentation for installation instructions",
    }
}
