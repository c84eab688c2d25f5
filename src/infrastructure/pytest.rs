//! Pytest coverage measurement adapter.
//!
//! Runs the target repo's test suite under `coverage run -m pytest`, then
//! exports `coverage json`. Every byproduct (coverage data, pytest cache,
//! bytecode cache) is redirected under the test directory so measurement
//! never dirties the production tree.

use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::CoverageConfig;
use crate::domain::models::CoverageReport;
use crate::domain::ports::{CoverageMeasurer, Measurement};

/// `CoverageMeasurer` backed by `python -m coverage` in the target repo.
#[derive(Debug, Clone)]
pub struct PytestMeasurer {
    repo_root: PathBuf,
    config: CoverageConfig,
}

impl PytestMeasurer {
    pub fn new(repo_root: PathBuf, config: CoverageConfig) -> Self {
        Self { repo_root, config }
    }

    fn test_dir_abs(&self) -> PathBuf {
        self.repo_root.join(&self.config.test_dir)
    }

    fn report_path(&self) -> PathBuf {
        self.test_dir_abs().join(&self.config.report_name)
    }

    async fn run_python(&self, args: &[&str]) -> DomainResult<Output> {
        let test_dir = self.test_dir_abs();
        let addopts = format!(
            "-p no:cacheprovider --rootdir={} -o cache_dir={}",
            self.repo_root.display(),
            test_dir.join(".pytest_cache").display()
        );

        Command::new(&self.config.python_binary)
            .args(args)
            .current_dir(&self.repo_root)
            .env("COVERAGE_FILE", test_dir.join(".coverage"))
            .env("PYTEST_ADDOPTS", addopts)
            .env("PYTHONPYCACHEPREFIX", test_dir.join(".pycache"))
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .output()
            .await
            .map_err(|e| {
                DomainError::MeasurementFailed(format!(
                    "failed to spawn {}: {e}",
                    self.config.python_binary
                ))
            })
    }
}

#[async_trait]
impl CoverageMeasurer for PytestMeasurer {
    async fn measure(&self) -> DomainResult<Measurement> {
        fs::create_dir_all(self.test_dir_abs()).await?;

        let run = self
            .run_python(&[
                "-m",
                "coverage",
                "run",
                "-m",
                "pytest",
                self.config.test_dir.as_str(),
            ])
            .await?;
        let run_ok = run.status.success();
        if !run_ok {
            debug!(status = %run.status, "pytest run did not pass");
        }

        let report_path = self.report_path();
        let report_arg = report_path.to_string_lossy().into_owned();
        let export = self
            .run_python(&["-m", "coverage", "json", "-o", &report_arg])
            .await?;
        if !export.status.success() {
            warn!(status = %export.status, "coverage json export failed");
        }

        let raw = match fs::read_to_string(&report_path).await {
            Ok(text) => match CoverageReport::from_json(&text) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(path = %report_path.display(), error = %e, "coverage report unparseable");
                    None
                }
            },
            Err(_) => None,
        };

        Ok(Measurement {
            ok: run_ok && export.status.success(),
            stdout: String::from_utf8_lossy(&run.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&run.stderr).into_owned(),
            summary: raw.clone(),
            raw,
            report_path: Some(report_path),
        })
    }
}
