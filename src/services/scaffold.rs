//! Test scaffold creation.
//!
//! Before the writer loop runs, every plan entry gets a test file seeded
//! with one section separator per named region. The loop later instructs
//! the agent to append tests under the matching separator, keeping the test
//! file organized by production region.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::TestPlan;
use crate::domain::ports::OutlineSource;

/// The separator marker placed above each region's test section.
pub fn section_marker(region_name: &str) -> String {
    format!(
        "# ----------------------------------------- Test cases for {region_name} ------------------------------"
    )
}

/// Ensure every entry's test file exists with its region markers.
///
/// Existing test files are left untouched: scaffolding is idempotent and
/// never clobbers agent-written tests.
pub async fn create_scaffolds(outline: &dyn OutlineSource, plan: &TestPlan) -> DomainResult<()> {
    for entry in &plan.entries {
        if let Some(parent) = entry.test_abs.parent() {
            fs::create_dir_all(parent).await?;
        }
        if entry.test_abs.exists() {
            debug!(test = %entry.test_abs.display(), "scaffold exists, skipping");
            continue;
        }

        let content = scaffold_content(outline, &entry.prod_abs).await?;
        fs::write(&entry.test_abs, content).await?;
    }
    Ok(())
}

async fn scaffold_content(outline: &dyn OutlineSource, prod_abs: &Path) -> DomainResult<String> {
    let regions = outline.regions_of(prod_abs).await?;
    let sections: Vec<String> = regions
        .iter()
        .filter(|r| !r.is_module())
        .map(|r| format!("\n{}\n", section_marker(&r.name)))
        .collect();

    let basename = prod_abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(format!(
        "# Auto-generated test scaffold for {basename}\n\
         # Tests are added region by region as coverage gaps are closed.\n\
         \n\
         import pytest\n\
         \n{}\n",
        sections.join("\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PlanEntry, Region, RegionKind};
    use async_trait::async_trait;

    struct TwoFunctionOutline;

    #[async_trait]
    impl OutlineSource for TwoFunctionOutline {
        async fn regions_of(&self, _file_abs: &Path) -> DomainResult<Vec<Region>> {
            Ok(vec![
                Region::module(30),
                Region::new("alpha", RegionKind::Function, 1, 10),
                Region::new("beta", RegionKind::Function, 12, 30),
            ])
        }
    }

    #[test]
    fn test_section_marker_shape() {
        let marker = section_marker("parse");
        assert!(marker.starts_with("# ---"));
        assert!(marker.contains("Test cases for parse"));
    }

    #[tokio::test]
    async fn test_scaffold_creates_missing_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let prod = dir.path().join("mod.py");
        std::fs::write(&prod, "def alpha():\n    pass\n").unwrap();

        let fresh = dir.path().join("test/test_mod.py");
        let existing = dir.path().join("test/test_kept.py");
        std::fs::create_dir_all(dir.path().join("test")).unwrap();
        std::fs::write(&existing, "# hand-written\n").unwrap();

        let plan = TestPlan::new(vec![
            PlanEntry {
                prod_rel: "mod.py".to_string(),
                prod_abs: prod.clone(),
                test_abs: fresh.clone(),
            },
            PlanEntry {
                prod_rel: "kept.py".to_string(),
                prod_abs: prod,
                test_abs: existing.clone(),
            },
        ]);

        create_scaffolds(&TwoFunctionOutline, &plan).await.unwrap();

        let content = std::fs::read_to_string(&fresh).unwrap();
        assert!(content.contains("import pytest"));
        assert!(content.contains(&section_marker("alpha")));
        assert!(content.contains(&section_marker("beta")));
        assert!(!content.contains(&section_marker("<module>")));

        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "# hand-written\n");
    }
}
