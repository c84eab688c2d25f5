//! Repo-context phase: one agent prompt summarizing the target repository.
//!
//! The summary is drained from the agent's streamed output and written under
//! the test directory, where later prompts (and the operator) can find it.

use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::ports::AgentClient;

const CONTEXT_FILE_NAME: &str = "_repo_context.md";

/// Ask the agent for a repo summary and persist it.
pub async fn gather_repo_context(
    agent: &dyn AgentClient,
    repo_root: &Path,
    test_dir: &str,
    drain_timeout: Duration,
) -> DomainResult<()> {
    let pyproject = fs::read_to_string(repo_root.join("pyproject.toml"))
        .await
        .unwrap_or_default();
    let readme = fs::read_to_string(repo_root.join("README.md"))
        .await
        .unwrap_or_default();

    let prompt = format!(
        "You are analyzing a Python repository to help generate tests later.\n\
         \n\
         Write a concise but thorough repo summary with:\n\
         - module layout\n\
         - key entrypoints\n\
         - important domain logic\n\
         - how to run tests (from pyproject if present)\n\
         - any tricky dependencies / I/O / time / randomness\n\
         - note any patterns helpful for testing\n\
         \n\
         Return ONLY markdown content (no code fences).\n\
         \n\
         pyproject.toml:\n{pyproject}\n\
         \n\
         README:\n{readme}"
    );

    agent.propose(&prompt).await?;
    let mut collected = agent.drain_output(drain_timeout).await;
    if collected.trim().is_empty() {
        collected = "# Repo Context\n\n(Agent produced no content)\n".to_string();
    }

    let dir = repo_root.join(test_dir);
    fs::create_dir_all(&dir).await?;
    let path = dir.join(CONTEXT_FILE_NAME);
    fs::write(&path, collected).await?;
    info!(path = %path.display(), "repo context written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedAgent {
        prompts: Mutex<Vec<String>>,
        reply: String,
    }

    #[async_trait]
    impl AgentClient for CannedAgent {
        async fn propose(&self, prompt: &str) -> DomainResult<()> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(())
        }

        async fn drain_output(&self, _timeout: Duration) -> String {
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_context_written_from_agent_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();

        let agent = CannedAgent {
            prompts: Mutex::new(vec![]),
            reply: "# Summary\n\nA small package.\n".to_string(),
        };
        gather_repo_context(&agent, dir.path(), "test", Duration::from_millis(10))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("test/_repo_context.md")).unwrap();
        assert!(written.contains("A small package."));
        let prompts = agent.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("pyproject.toml"));
    }

    #[tokio::test]
    async fn test_empty_agent_output_gets_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let agent = CannedAgent {
            prompts: Mutex::new(vec![]),
            reply: "   ".to_string(),
        };
        gather_repo_context(&agent, dir.path(), "test", Duration::from_millis(10))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("test/_repo_context.md")).unwrap();
        assert!(written.contains("(Agent produced no content)"));
    }
}
