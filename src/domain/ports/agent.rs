//! Agent client port - interface for the code-generation collaborator.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::DomainResult;

/// Trait for conversational code-generation clients.
///
/// The loop never parses or trusts textual agent responses; the only effects
/// that matter are filesystem edits observed through the next measurement.
/// `propose` is therefore fire-and-forget, and `drain_output` exists only so
/// callers can wait out (and log) a streaming response before re-measuring.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send one generation request to the agent.
    async fn propose(&self, prompt: &str) -> DomainResult<()>;

    /// Wait until the agent's output buffer settles, then atomically take
    /// its contents.
    ///
    /// Settling is heuristic: the buffer is sampled at a fixed interval and
    /// counts as drained after a fixed number of consecutive no-growth
    /// samples, or when `timeout` elapses, whichever comes first. A
    /// transport with an explicit completion event should use that instead.
    async fn drain_output(&self, timeout: Duration) -> String;
}
