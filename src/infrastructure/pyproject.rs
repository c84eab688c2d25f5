//! Coverage scope discovery from the target repo's pyproject.toml.
//!
//! `[tool.coverage.run] source` (or `source_pkgs`) names the roots that
//! coverage measures; those same roots bound test planning and agent reads.
//! Repos that declare nothing fall back to the configured defaults.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    coverage: CoverageTool,
}

#[derive(Debug, Default, Deserialize)]
struct CoverageTool {
    #[serde(default)]
    run: CoverageRun,
}

#[derive(Debug, Default, Deserialize)]
struct CoverageRun {
    #[serde(default)]
    source: Vec<String>,
    #[serde(default)]
    source_pkgs: Vec<String>,
}

/// Read the coverage source roots for a repo, falling back to `defaults`
/// when pyproject.toml is missing, unparseable, or silent on the matter.
pub fn load_coverage_scope(repo_root: &Path, defaults: &[String]) -> Vec<String> {
    let path = repo_root.join("pyproject.toml");
    let Ok(text) = std::fs::read_to_string(&path) else {
        debug!(path = %path.display(), "no pyproject.toml, using default roots");
        return defaults.to_vec();
    };
    let parsed: PyProject = match toml::from_str(&text) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "pyproject.toml unparseable, using default roots");
            return defaults.to_vec();
        }
    };

    let run = parsed.tool.coverage.run;
    let roots = if !run.source.is_empty() {
        run.source
    } else if !run.source_pkgs.is_empty() {
        run.source_pkgs
    } else {
        defaults.to_vec()
    };
    debug!(?roots, "coverage scope resolved");
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        vec!["src".to_string()]
    }

    #[test]
    fn test_source_roots_from_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.coverage.run]\nsource = [\"mypkg\", \"util\"]\n",
        )
        .unwrap();

        let roots = load_coverage_scope(dir.path(), &defaults());
        assert_eq!(roots, vec!["mypkg", "util"]);
    }

    #[test]
    fn test_source_pkgs_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.coverage.run]\nsource_pkgs = [\"mypkg\"]\n",
        )
        .unwrap();

        let roots = load_coverage_scope(dir.path(), &defaults());
        assert_eq!(roots, vec!["mypkg"]);
    }

    #[test]
    fn test_missing_or_silent_pyproject_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_coverage_scope(dir.path(), &defaults()), defaults());

        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"x\"\n",
        )
        .unwrap();
        assert_eq!(load_coverage_scope(dir.path(), &defaults()), defaults());
    }

    #[test]
    fn test_broken_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "not [ toml").unwrap();
        assert_eq!(load_coverage_scope(dir.path(), &defaults()), defaults());
    }
}
