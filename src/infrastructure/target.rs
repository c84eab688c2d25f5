//! Target repository resolution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Environment variable naming the target repo when `--repo` is absent.
pub const TARGET_REPO_ENV: &str = "COVGEN_TARGET_REPO";

/// Resolve the target repository root from the `--repo` flag or the
/// environment, expand a leading `~`, and require a pyproject.toml so we
/// never run coverage against an arbitrary directory.
pub fn resolve_target_repo(flag: Option<&str>) -> Result<PathBuf> {
    let raw = match flag {
        Some(value) => value.to_string(),
        None => std::env::var(TARGET_REPO_ENV).with_context(|| {
            format!("no target repo: pass --repo or set {TARGET_REPO_ENV}")
        })?,
    };

    let path = expand_home(&raw);
    if !path.is_dir() {
        bail!("target repo is not a directory: {}", path.display());
    }
    if !path.join("pyproject.toml").is_file() {
        bail!(
            "target repo has no pyproject.toml: {}",
            path.display()
        );
    }
    path.canonicalize()
        .with_context(|| format!("cannot canonicalize {}", path.display()))
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_repo_with_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\n").unwrap();

        let resolved = resolve_target_repo(Some(dir.path().to_str().unwrap())).unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_rejects_repo_without_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_target_repo(Some(dir.path().to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("pyproject.toml"));
    }

    #[test]
    fn test_rejects_missing_directory() {
        let err = resolve_target_repo(Some("/nonexistent/place")).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
