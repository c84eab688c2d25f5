//! Integration test of plan building, persistence, and scaffolding.

use std::path::Path;

use async_trait::async_trait;

use covgen::domain::models::{Region, RegionKind};
use covgen::domain::ports::OutlineSource;
use covgen::domain::DomainResult;
use covgen::services::{build_test_plan, create_scaffolds, read_test_plan, section_marker, write_test_plan};

struct StubOutline;

#[async_trait]
impl OutlineSource for StubOutline {
    async fn regions_of(&self, _file_abs: &Path) -> DomainResult<Vec<Region>> {
        Ok(vec![
            Region::module(20),
            Region::new("load", RegionKind::Function, 2, 9),
            Region::new("Store", RegionKind::Class, 11, 20),
        ])
    }
}

fn seed_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src/pkg")).unwrap();
    std::fs::write(root.join("src/store.py"), "def load():\n    pass\n").unwrap();
    std::fs::write(root.join("src/pkg/util.py"), "def helper():\n    pass\n").unwrap();
    std::fs::write(root.join("src/pkg/notes.md"), "not code\n").unwrap();
    dir
}

#[tokio::test]
async fn test_plan_then_scaffold_pipeline() {
    let repo = seed_repo();
    let root = repo.path();
    let roots = vec!["src".to_string()];

    let plan = build_test_plan(root, &roots, "test").unwrap();
    assert_eq!(plan.len(), 2);
    write_test_plan(root, "test", &plan).unwrap();

    // The persisted plan round-trips.
    let reloaded = read_test_plan(root, "test").unwrap();
    assert_eq!(reloaded.entries, plan.entries);

    create_scaffolds(&StubOutline, &reloaded).await.unwrap();

    for entry in &reloaded.entries {
        let content = std::fs::read_to_string(&entry.test_abs).unwrap();
        assert!(content.contains("import pytest"));
        assert!(content.contains(&section_marker("load")));
        assert!(content.contains(&section_marker("Store")));
    }

    // Test files themselves are never planned as production files.
    let replanned = build_test_plan(root, &roots, "test").unwrap();
    assert_eq!(replanned.entries, plan.entries);
}
