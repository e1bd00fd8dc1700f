//! Public-URL discovery from the tunnel log sink.
//!
//! The quick provider announces its randomly assigned public URL only in its
//! own log output, so the supervisor scans the log file for the first line
//! carrying a URL under the provider's domain suffix. The log is scanned, not
//! consumed; repeated scans are driven by the supervisor's retry plan.

use std::path::Path;

use regex_lite::Regex;

use crate::error::TunnelError;

/// Default domain suffix under which the quick provider assigns URLs.
///
/// If the provider ever changes this suffix, extraction silently falls into
/// the soft-failure path (unknown URL). Known fragility; the suffix is
/// configurable for that reason.
pub const QUICK_URL_SUFFIX: &str = "trycloudflare.com";

/// Compiled matcher for `https://<subdomain>.<suffix>` URLs.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    re: Regex,
}

impl UrlMatcher {
    /// Build a matcher for a given domain suffix.
    pub fn for_suffix(suffix: &str) -> Result<Self, TunnelError> {
        let escaped = suffix.replace('.', r"\.");
        let re = Regex::new(&format!(r"https://[A-Za-z0-9-]+\.{escaped}")).map_err(|_| {
            TunnelError::Pattern {
                suffix: suffix.to_string(),
            }
        })?;
        Ok(Self { re })
    }

    /// First public URL occurring in `text`, if any.
    pub fn find(&self, text: &str) -> Option<String> {
        self.re.find(text).map(|m| m.as_str().to_string())
    }
}

/// Single scan pass over the log sink. Missing or unreadable log files count
/// as "not found yet", not as errors.
pub async fn scan_log_for_url(log_path: &Path, matcher: &UrlMatcher) -> Option<String> {
    let text = tokio::fs::read_to_string(log_path).await.ok()?;
    matcher.find(&text)
}
