//! Test plan models.
//!
//! A test plan is a stable 1:1 mapping between production files and the test
//! files that exercise them. It is produced by the planning phase and
//! consumed read-only by the convergence loop.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One production file paired with its test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Repo-relative production file path in POSIX form, as keyed by
    /// coverage reports.
    pub prod_rel: String,
    /// Absolute path to the production file.
    pub prod_abs: PathBuf,
    /// Absolute path to the paired test file.
    pub test_abs: PathBuf,
}

/// The full plan for a repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestPlan {
    pub entries: Vec<PlanEntry>,
}

impl TestPlan {
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_roundtrips_through_json() {
        let plan = TestPlan::new(vec![PlanEntry {
            prod_rel: "src/pkg/mod.py".to_string(),
            prod_abs: PathBuf::from("/repo/src/pkg/mod.py"),
            test_abs: PathBuf::from("/repo/test/test_mod.py"),
        }]);

        let json = serde_json::to_string(&plan).unwrap();
        let back: TestPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries, plan.entries);
    }
}
