//! Netscape cookie export files (`cookies.txt`).

use crate::error::{Result, TalkbookError};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub name: String,
    pub value: String,
}

/// Parse a Netscape cookie file. Comment lines are skipped, except the
/// `#HttpOnly_` prefix which marks a normal entry.
pub fn parse_netscape_cookies(content: &str) -> Vec<Cookie> {
    content
        .lines()
        .filter_map(|raw| {
            let line = raw.trim();
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                fields = line.split_whitespace().collect();
            }
            if fields.len() < 7 {
                return None;
            }
            let (name, value) = (fields[5], fields[6]);
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(Cookie {
                domain: fields[0].trim_start_matches('.').to_string(),
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// `Cookie` header value for cookies whose domain matches `host`.
pub fn cookie_header(cookies: &[Cookie], host: &str) -> Option<String> {
    let header: Vec<String> = cookies
        .iter()
        .filter(|c| host == c.domain || host.ends_with(&format!(".{}", c.domain)))
        .map(|c| format!("{}={}", c.name, c.value))
        .collect();
    (!header.is_empty()).then(|| header.join("; "))
}

/// Read a cookie file and build the header for `host`.
pub fn load_cookie_header(path: &Path, host: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Err(TalkbookError::MissingFile(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(cookie_header(&parse_netscape_cookies(&content), host))
}
