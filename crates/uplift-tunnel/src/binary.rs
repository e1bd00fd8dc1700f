//! Provider binary resolution.
//!
//! A provider binary is resolved in order: explicit override path, `$PATH`
//! lookup, previously cached download, fresh download into the cache
//! directory. Any failure to come up with a runnable binary is fatal to the
//! run.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::TunnelError;

/// How to locate one provider's binary.
#[derive(Debug, Clone)]
pub struct BinarySpec {
    /// Binary name as it appears on `$PATH` (e.g. `cloudflared`).
    pub name: String,
    /// Explicit path given by the operator; wins over everything else.
    pub override_path: Option<PathBuf>,
    /// URL of a raw executable to download when nothing local is found.
    pub download_url: Option<String>,
}

impl BinarySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            override_path: None,
            download_url: None,
        }
    }

    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    pub fn with_download_url(mut self, url: Option<String>) -> Self {
        self.download_url = url;
        self
    }
}

/// Resolve the binary for `spec`, downloading into `cache_dir` as a last
/// resort.
pub async fn ensure_binary(spec: &BinarySpec, cache_dir: &Path) -> Result<PathBuf, TunnelError> {
    if let Some(path) = &spec.override_path {
        if path.is_file() {
            debug!(binary = %spec.name, path = %path.display(), "using override binary path");
            return Ok(path.clone());
        }
        return Err(TunnelError::Fetch {
            name: spec.name.clone(),
            reason: format!("override path {} does not exist", path.display()),
        });
    }

    if let Some(path) = find_in_path(&spec.name) {
        debug!(binary = %spec.name, path = %path.display(), "found binary on PATH");
        return Ok(path);
    }

    let cached = cache_dir.join(&spec.name);
    if cached.is_file() {
        debug!(binary = %spec.name, path = %cached.display(), "using cached binary");
        return Ok(cached);
    }

    let url = spec.download_url.as_deref().ok_or_else(|| TunnelError::Fetch {
        name: spec.name.clone(),
        reason: "not on PATH and no download URL configured".to_string(),
    })?;

    download(&spec.name, url, &cached).await?;
    Ok(cached)
}

/// Search `$PATH` for an executable with the given name.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

async fn download(name: &str, url: &str, dest: &Path) -> Result<(), TunnelError> {
    info!(binary = %name, url, "downloading provider binary");

    let fetch_err = |reason: String| TunnelError::Fetch {
        name: name.to_string(),
        reason,
    };

    let response = reqwest::get(url)
        .await
        .map_err(|e| fetch_err(format!("download request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(fetch_err(format!("download returned HTTP {}", response.status())));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| fetch_err(format!("download body failed: {e}")))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| fetch_err(format!("failed to create cache directory: {e}")))?;
    }
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| fetch_err(format!("failed to write binary: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| fetch_err(format!("failed to mark binary executable: {e}")))?;
    }

    info!(binary = %name, path = %dest.display(), "provider binary ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn override_path_wins_when_present() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("faketunnel");
        std::fs::write(&bin, b"#!/bin/sh\n").unwrap();

        let spec = BinarySpec::new("faketunnel").with_override(Some(bin.clone()));
        let resolved = ensure_binary(&spec, dir.path()).await.unwrap();
        assert_eq!(resolved, bin);
    }

    #[tokio::test]
    async fn missing_override_path_is_fatal() {
        let dir = TempDir::new().unwrap();
        let spec = BinarySpec::new("faketunnel")
            .with_override(Some(dir.path().join("nope")));
        let err = ensure_binary(&spec, dir.path()).await.unwrap_err();
        assert!(matches!(err, TunnelError::Fetch { .. }));
    }

    #[tokio::test]
    async fn cached_binary_is_reused() {
        let dir = TempDir::new().unwrap();
        let cached = dir.path().join("some-unlikely-binary-name");
        std::fs::write(&cached, b"#!/bin/sh\n").unwrap();

        let spec = BinarySpec::new("some-unlikely-binary-name");
        let resolved = ensure_binary(&spec, dir.path()).await.unwrap();
        assert_eq!(resolved, cached);
    }

    #[tokio::test]
    async fn no_source_at_all_is_fatal() {
        let dir = TempDir::new().unwrap();
        let spec = BinarySpec::new("definitely-not-installed-anywhere");
        let err = ensure_binary(&spec, dir.path()).await.unwrap_err();
        assert!(matches!(err, TunnelError::Fetch { .. }));
    }
}
