//! Filesystem policy: the capability boundary around the agent.
//!
//! The agent may write only under the designated test directory and read
//! only under the test directory, the coverage source roots, and a small
//! allow-list of metadata files. Enforcement happens here, before any byte
//! reaches disk; the tool-permission heuristic is advisory on top.

use std::path::{Component, Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};

/// Metadata files the agent may read from anywhere in the repo.
const READ_ALLOWLIST: &[&str] = &["pyproject.toml", "README.md", "README.rst", ".coveragerc"];

/// Decision for an agent tool-call permission request.
#[derive(Debug, Clone)]
pub struct PermissionDecision {
    pub allow: bool,
    pub reason: &'static str,
}

/// Write/read capability gate for one target repository.
#[derive(Debug, Clone)]
pub struct FsPolicy {
    test_dir_abs: PathBuf,
    read_roots_abs: Vec<PathBuf>,
}

impl FsPolicy {
    pub fn new(repo_root: &Path, test_dir_rel: &str, read_roots_rel: &[String]) -> Self {
        Self {
            test_dir_abs: normalize(&repo_root.join(test_dir_rel)),
            read_roots_abs: read_roots_rel
                .iter()
                .map(|r| normalize(&repo_root.join(r)))
                .collect(),
        }
    }

    /// Check a write attempt. Only the test directory is writable.
    pub fn check_write(&self, path: &Path) -> DomainResult<()> {
        let p = normalize(path);
        if p == self.test_dir_abs || p.starts_with(&self.test_dir_abs) {
            Ok(())
        } else {
            Err(DomainError::WriteDenied(p))
        }
    }

    /// Check a read attempt: test dir, coverage roots, or the allow-list.
    pub fn check_read(&self, path: &Path) -> DomainResult<()> {
        let p = normalize(path);
        if p == self.test_dir_abs || p.starts_with(&self.test_dir_abs) {
            return Ok(());
        }
        for root in &self.read_roots_abs {
            if p == *root || p.starts_with(root) {
                return Ok(());
            }
        }
        let base = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if READ_ALLOWLIST.contains(&base) {
            return Ok(());
        }
        Err(DomainError::ReadDenied(p))
    }

    /// Advisory decision for an agent tool call. Hard enforcement stays in
    /// `check_read`/`check_write`; this only answers permission prompts.
    pub fn decide_tool_permission(&self, kind: &str, locations: &[PathBuf]) -> PermissionDecision {
        match kind {
            "edit" | "delete" | "move" => {
                let ok = locations.iter().all(|l| self.check_write(l).is_ok());
                if ok {
                    PermissionDecision {
                        allow: true,
                        reason: "edit allowed in test dir",
                    }
                } else {
                    PermissionDecision {
                        allow: false,
                        reason: "edits only allowed in test dir",
                    }
                }
            }
            // The orchestrator runs tests itself; the agent does not execute.
            "execute" => PermissionDecision {
                allow: false,
                reason: "orchestrator runs commands, not agent",
            },
            _ => PermissionDecision {
                allow: true,
                reason: "non-destructive tool call allowed",
            },
        }
    }
}

/// Lexical path normalization: strips `.` and resolves `..` without
/// touching the filesystem, so checks cannot be dodged with traversal.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FsPolicy {
        FsPolicy::new(
            Path::new("/repo"),
            "test",
            &["src".to_string(), "lib".to_string()],
        )
    }

    #[test]
    fn test_write_only_under_test_dir() {
        let policy = policy();
        assert!(policy.check_write(Path::new("/repo/test/test_mod.py")).is_ok());
        assert!(policy.check_write(Path::new("/repo/src/mod.py")).is_err());
        assert!(policy.check_write(Path::new("/repo/setup.py")).is_err());
    }

    #[test]
    fn test_write_traversal_is_normalized() {
        let policy = policy();
        let err = policy
            .check_write(Path::new("/repo/test/../src/mod.py"))
            .unwrap_err();
        assert!(matches!(err, DomainError::WriteDenied(_)));
    }

    #[test]
    fn test_read_roots_and_allowlist() {
        let policy = policy();
        assert!(policy.check_read(Path::new("/repo/src/pkg/mod.py")).is_ok());
        assert!(policy.check_read(Path::new("/repo/lib/util.py")).is_ok());
        assert!(policy.check_read(Path::new("/repo/test/test_mod.py")).is_ok());
        assert!(policy.check_read(Path::new("/repo/pyproject.toml")).is_ok());
        assert!(policy.check_read(Path::new("/repo/.coveragerc")).is_ok());
        assert!(policy.check_read(Path::new("/repo/secrets.env")).is_err());
        assert!(policy.check_read(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_tool_permission_decisions() {
        let policy = policy();

        let edit_ok = policy
            .decide_tool_permission("edit", &[PathBuf::from("/repo/test/test_mod.py")]);
        assert!(edit_ok.allow);

        let edit_bad = policy.decide_tool_permission(
            "edit",
            &[
                PathBuf::from("/repo/test/test_mod.py"),
                PathBuf::from("/repo/src/mod.py"),
            ],
        );
        assert!(!edit_bad.allow);

        assert!(!policy.decide_tool_permission("execute", &[]).allow);
        assert!(policy.decide_tool_permission("read", &[]).allow);
    }
}
