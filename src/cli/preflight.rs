//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TalkbookError};
use crate::tools;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching needs at least one enabled transcript path.
    Fetch,
    /// Metadata lookups shell out to yt-dlp.
    Enrich,
    /// Export shells out to pandoc.
    Export,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Fetch => {
            let fetch = &settings.fetch;
            if !(fetch.use_api || fetch.use_downloader || fetch.use_browser) {
                return Err(TalkbookError::Config(
                    "every transcript path is disabled; enable one of fetch.use_api, \
                     fetch.use_downloader or fetch.use_browser"
                        .to_string(),
                ));
            }
            if let Some(cookies) = fetch.cookies_path() {
                if !cookies.exists() {
                    return Err(TalkbookError::MissingFile(cookies.display().to_string()));
                }
            }
        }
        Operation::Enrich => {
            check_tool(&tools::yt_dlp_program(&settings.tools))?;
        }
        Operation::Export => {
            check_tool(&Settings::expand_path(&settings.tools.pandoc).to_string_lossy())?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(program: &str) -> Result<()> {
    match tools::which(program) {
        Some(_) => Ok(()),
        None => Err(TalkbookError::ToolNotFound(program.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fetch_settings_pass() {
        assert!(check(Operation::Fetch, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_yt_dlp() {
        let mut settings = Settings::default();
        settings.tools.yt_dlp = Some("talkbook-missing-yt-dlp".to_string());
        assert!(matches!(
            check(Operation::Enrich, &settings),
            Err(TalkbookError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_fetch_needs_a_path() {
        let mut settings = Settings::default();
        settings.fetch.use_api = false;
        settings.fetch.use_downloader = false;
        settings.fetch.use_browser = false;
        assert!(matches!(
            check(Operation::Fetch, &settings),
            Err(TalkbookError::Config(_))
        ));
    }

    #[test]
    fn test_missing_cookie_file() {
        let mut settings = Settings::default();
        settings.fetch.cookies_file = Some("/nonexistent/cookies.txt".to_string());
        assert!(matches!(
            check(Operation::Fetch, &settings),
            Err(TalkbookError::MissingFile(_))
        ));
    }

    #[test]
    fn test_missing_pandoc() {
        let mut settings = Settings::default();
        settings.tools.pandoc = "talkbook-missing-pandoc".to_string();
        assert!(matches!(
            check(Operation::Export, &settings),
            Err(TalkbookError::ToolNotFound(_))
        ));
    }
}
