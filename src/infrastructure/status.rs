//! Operator-facing status line sink.
//!
//! Status lines are the run's human narrative: one line per phase step,
//! printed to stdout and mirrored into `<test_dir>/_status.log` so a run
//! can be reconstructed after the fact. Log-file writes are best effort.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use tracing::debug;

use crate::domain::ports::StatusSink;

/// `StatusSink` that prints to stdout and appends to the status log.
#[derive(Debug, Clone)]
pub struct FileStatusSink {
    log_path: PathBuf,
}

impl FileStatusSink {
    pub fn new(repo_root: &std::path::Path, test_dir: &str) -> Self {
        Self {
            log_path: repo_root.join(test_dir).join("_status.log"),
        }
    }

    fn append(&self, line: &str) {
        if let Some(parent) = self.log_path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = result {
            debug!(error = %e, "status log append failed");
        }
    }
}

impl StatusSink for FileStatusSink {
    fn status(&self, message: &str) {
        let line = format!("{} [STATUS] {}", Utc::now().to_rfc3339(), message);
        println!("{line}");
        self.append(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileStatusSink::new(dir.path(), "test");

        sink.status("plan built");
        sink.status("scaffolds created");

        let log = std::fs::read_to_string(dir.path().join("test/_status.log")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[STATUS] plan built"));
        assert!(lines[1].contains("[STATUS] scaffolds created"));
    }
}
