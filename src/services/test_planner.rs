//! Test-file planning: pair every production file with a test file.
//!
//! The plan is the 1:1 mapping the convergence loop iterates over. It is
//! derived from the coverage source roots, persisted under the test
//! directory, and readable back so later phases can reuse it.

use std::fs;
use std::path::{Component, Path};

use tracing::debug;
use walkdir::WalkDir;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PlanEntry, TestPlan};

const PLAN_FILE_NAME: &str = "_test_plan.json";

/// Build the plan by enumerating `*.py` production files under the coverage
/// source roots. Files under the test directory are skipped; entries come
/// out sorted by repo-relative path so the plan is stable across runs.
pub fn build_test_plan(
    repo_root: &Path,
    source_roots: &[String],
    test_dir: &str,
) -> DomainResult<TestPlan> {
    let mut rels: Vec<String> = Vec::new();

    for root in source_roots {
        let root_abs = repo_root.join(root);
        if !root_abs.is_dir() {
            debug!(root = %root_abs.display(), "source root missing, skipping");
            continue;
        }
        for entry in WalkDir::new(&root_abs).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            let Ok(rel) = path.strip_prefix(repo_root) else {
                continue;
            };
            let rel = to_posix(rel);
            if rel.starts_with(&format!("{test_dir}/")) {
                continue;
            }
            if !rels.contains(&rel) {
                rels.push(rel);
            }
        }
    }

    rels.sort();

    let entries = rels
        .into_iter()
        .map(|rel| {
            let prod_abs = repo_root.join(&rel);
            let stem = prod_abs
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("module")
                .to_string();
            let test_abs = repo_root.join(test_dir).join(format!("test_{stem}.py"));
            PlanEntry {
                prod_rel: rel,
                prod_abs,
                test_abs,
            }
        })
        .collect();

    Ok(TestPlan::new(entries))
}

/// Persist the plan as `<test_dir>/_test_plan.json`.
pub fn write_test_plan(repo_root: &Path, test_dir: &str, plan: &TestPlan) -> DomainResult<()> {
    let dir = repo_root.join(test_dir);
    if dir.exists() && !dir.is_dir() {
        return Err(DomainError::InvalidPlan(format!(
            "path exists but is not a directory: {}",
            dir.display()
        )));
    }
    fs::create_dir_all(&dir)?;

    let path = dir.join(PLAN_FILE_NAME);
    let text = serde_json::to_string_pretty(plan)?;
    fs::write(path, text)?;
    Ok(())
}

/// Read a previously persisted plan, if any.
pub fn read_test_plan(repo_root: &Path, test_dir: &str) -> Option<TestPlan> {
    let path = repo_root.join(test_dir).join(PLAN_FILE_NAME);
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

/// Normalize a relative path to POSIX form, matching coverage report keys.
fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/pkg")).unwrap();
        fs::write(root.join("src/app.py"), "x = 1\n").unwrap();
        fs::write(root.join("src/pkg/mod.py"), "y = 2\n").unwrap();
        fs::write(root.join("src/pkg/data.txt"), "not python\n").unwrap();
        dir
    }

    #[test]
    fn test_build_plan_enumerates_python_files() {
        let dir = fixture_repo();
        let plan = build_test_plan(dir.path(), &["src".to_string()], "test").unwrap();

        let rels: Vec<&str> = plan.entries.iter().map(|e| e.prod_rel.as_str()).collect();
        assert_eq!(rels, vec!["src/app.py", "src/pkg/mod.py"]);
        assert_eq!(
            plan.entries[1].test_abs,
            dir.path().join("test").join("test_mod.py")
        );
    }

    #[test]
    fn test_build_plan_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let plan = build_test_plan(dir.path(), &["src".to_string()], "test").unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_write_then_read() {
        let dir = fixture_repo();
        let plan = build_test_plan(dir.path(), &["src".to_string()], "test").unwrap();
        write_test_plan(dir.path(), "test", &plan).unwrap();

        let back = read_test_plan(dir.path(), "test").unwrap();
        assert_eq!(back.entries, plan.entries);
    }

    #[test]
    fn test_write_plan_rejects_file_at_test_dir() {
        let dir = fixture_repo();
        fs::write(dir.path().join("test"), "in the way").unwrap();

        let plan = TestPlan::default();
        let err = write_test_plan(dir.path(), "test", &plan).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPlan(_)));
    }
}
