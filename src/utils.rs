//! Shared filesystem helpers used by the CLI, the server and the cache.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Gets the cross-platform default cache directory.
///
/// Returns `{cache_dir}/samarth/datasets` where `cache_dir` is:
/// - Linux: `~/.cache`
/// - macOS: `~/Library/Caches`
/// - Windows: `C:\Users\<user>\AppData\Local`
///
/// Falls back to `./datasets` when the platform has no cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("samarth").join("datasets"))
        .unwrap_or_else(|| PathBuf::from("datasets"))
}

/// Ensures a directory exists, creating it and its parents if needed.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_cache_dir_ends_with_datasets() {
        let dir = default_cache_dir();
        assert!(dir.ends_with("datasets"));
    }

    #[test]
    fn ensure_directory_creates_nested_path() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a").join("b");

        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());

        // second call is a no-op
        ensure_directory(&nested).unwrap();
    }
}
