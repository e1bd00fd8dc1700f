//! Tunnel credentials and provider selection.
//!
//! The selection rule is deliberately forgiving: partial or empty credentials
//! never produce an error, they silently degrade the run to the quick
//! provider. The stable provider is only chosen when both halves of the
//! credential pair are usable.

use serde::{Deserialize, Serialize};

/// Which tunnel provider a run uses. Chosen once per run, never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Authenticated provider with a pre-reserved public domain.
    Stable,
    /// Anonymous provider assigning a random public domain.
    Quick,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Stable => write!(f, "stable"),
            Provider::Quick => write!(f, "quick"),
        }
    }
}

/// Optional auth token + reserved domain pair, read from the environment.
/// Treated as opaque, read-only configuration.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    auth_token: Option<String>,
    domain: Option<String>,
}

impl Credentials {
    pub fn new(auth_token: Option<String>, domain: Option<String>) -> Self {
        Self { auth_token, domain }
    }

    /// `Stable` iff both the token and the reserved domain are present and
    /// non-empty; every other combination degrades to `Quick`.
    pub fn provider(&self) -> Provider {
        if self.auth_token().is_some() && self.domain().is_some() {
            Provider::Stable
        } else {
            Provider::Quick
        }
    }

    /// The auth token, trimmed; `None` when absent or blank.
    pub fn auth_token(&self) -> Option<&str> {
        Self::filled(&self.auth_token)
    }

    /// The reserved domain, trimmed; `None` when absent or blank.
    pub fn domain(&self) -> Option<&str> {
        Self::filled(&self.domain)
    }

    fn filled(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
