//! Agent Client Protocol adapter.
//!
//! Spawns the agent CLI as an ACP server speaking newline-delimited JSON-RPC
//! over stdio. We are the client side: we issue `initialize`, `session/new`,
//! and `session/prompt`, and we service the agent's callbacks for filesystem
//! access and tool permissions, both gated by [`FsPolicy`].
//!
//! Streamed `agent_message_chunk` text lands in an internal buffer that the
//! orchestrator drains between prompts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::AgentConfig;
use crate::domain::ports::AgentClient;
use crate::infrastructure::policy::FsPolicy;

const PROTOCOL_VERSION: u32 = 1;

struct Shared {
    stdin: Mutex<ChildStdin>,
    buffer: Mutex<String>,
    pending: Mutex<HashMap<i64, oneshot::Sender<Value>>>,
    next_id: AtomicI64,
    policy: FsPolicy,
}

impl Shared {
    async fn send_line(&self, value: &Value) -> DomainResult<()> {
        let mut line = serde_json::to_string(value)?;
        line.push('\n');
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| DomainError::AgentUnavailable(format!("agent stdin closed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| DomainError::AgentUnavailable(format!("agent stdin closed: {e}")))?;
        Ok(())
    }

    async fn request(&self, method: &str, params: Value) -> DomainResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        self.send_line(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        rx.await
            .map_err(|_| DomainError::AgentUnavailable(format!("no response to {method}")))
    }
}

/// `AgentClient` implementation that drives an ACP-capable agent CLI.
pub struct AcpAgentClient {
    shared: Arc<Shared>,
    session_id: String,
    config: AgentConfig,
    child: Mutex<Child>,
}

impl AcpAgentClient {
    /// Spawn the agent binary, run the ACP handshake, and open a session
    /// rooted at the target repository.
    pub async fn start(
        repo_root: &Path,
        policy: FsPolicy,
        config: AgentConfig,
    ) -> DomainResult<Self> {
        let mut command = Command::new(&config.binary_path);
        command.args(["--acp", "--stdio"]);
        if let Some(model) = &config.model {
            command.args(["--model", model]);
        }
        command.args(&config.extra_flags);
        command
            .current_dir(repo_root)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            DomainError::AgentUnavailable(format!("failed to spawn {}: {e}", config.binary_path))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DomainError::AgentUnavailable("agent stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DomainError::AgentUnavailable("agent stdout unavailable".into()))?;

        let shared = Arc::new(Shared {
            stdin: Mutex::new(stdin),
            buffer: Mutex::new(String::new()),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            policy,
        });

        tokio::spawn(read_loop(Arc::clone(&shared), stdout));

        shared
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "clientCapabilities": {
                        "fs": { "readTextFile": true, "writeTextFile": true },
                        "terminal": false,
                    },
                }),
            )
            .await?;

        let session = shared
            .request(
                "session/new",
                json!({
                    "cwd": repo_root,
                    "mcpServers": [],
                }),
            )
            .await?;
        let session_id = session
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DomainError::AgentUnavailable("session/new returned no sessionId".into())
            })?
            .to_string();

        debug!(session = %session_id, agent = %config.binary_path, "agent session opened");

        Ok(Self {
            shared,
            session_id,
            config,
            child: Mutex::new(child),
        })
    }

    /// Terminate the agent process.
    pub async fn stop(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            warn!(error = %e, "agent process already gone");
        }
    }
}

#[async_trait]
impl AgentClient for AcpAgentClient {
    async fn propose(&self, prompt: &str) -> DomainResult<()> {
        self.shared
            .request(
                "session/prompt",
                json!({
                    "sessionId": self.session_id,
                    "prompt": [{ "type": "text", "text": prompt }],
                }),
            )
            .await?;
        Ok(())
    }

    /// Drain buffered agent text, waiting until the buffer stops growing for
    /// a configured number of polls or the timeout elapses.
    async fn drain_output(&self, timeout: Duration) -> String {
        let poll = Duration::from_millis(self.config.drain_poll_ms);
        let deadline = Instant::now() + timeout;

        let mut last_len = self.shared.buffer.lock().await.len();
        let mut stable = 0u32;

        while Instant::now() < deadline {
            sleep(poll).await;
            let len = self.shared.buffer.lock().await.len();
            if len == last_len {
                stable += 1;
                if stable >= self.config.drain_stability_checks {
                    break;
                }
            } else {
                last_len = len;
                stable = 0;
            }
        }

        let mut buffer = self.shared.buffer.lock().await;
        std::mem::take(&mut *buffer)
    }
}

async fn read_loop(shared: Arc<Shared>, stdout: tokio::process::ChildStdout) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "agent stdout read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let message: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "skipping non-JSON agent output line");
                continue;
            }
        };
        dispatch(&shared, message).await;
    }
    // Reject anything still waiting so callers fail instead of hanging.
    shared.pending.lock().await.clear();
}

async fn dispatch(shared: &Arc<Shared>, message: Value) {
    let method = message.get("method").and_then(Value::as_str);
    let id = message.get("id").cloned();

    match (method, id) {
        // Response to one of our requests.
        (None, Some(id)) => {
            let Some(id) = id.as_i64() else { return };
            let payload = message
                .get("result")
                .cloned()
                .unwrap_or_else(|| message.get("error").cloned().unwrap_or(Value::Null));
            if let Some(tx) = shared.pending.lock().await.remove(&id) {
                let _ = tx.send(payload);
            }
        }
        // Request from the agent that expects an answer.
        (Some(method), Some(id)) => {
            let params = message.get("params").cloned().unwrap_or(Value::Null);
            let result = handle_agent_request(shared, method, &params).await;
            let reply = match result {
                Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                Err(e) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32000, "message": e.to_string() },
                }),
            };
            if let Err(e) = shared.send_line(&reply).await {
                warn!(error = %e, "failed to answer agent request");
            }
        }
        // Notification.
        (Some("session/update"), None) => handle_session_update(shared, &message).await,
        _ => {}
    }
}

async fn handle_session_update(shared: &Arc<Shared>, message: &Value) {
    let update = message.pointer("/params/update");
    let kind = update
        .and_then(|u| u.get("sessionUpdate"))
        .and_then(Value::as_str);
    if kind == Some("agent_message_chunk") {
        if let Some(text) = update
            .and_then(|u| u.pointer("/content/text"))
            .and_then(Value::as_str)
        {
            shared.buffer.lock().await.push_str(text);
        }
    }
}

async fn handle_agent_request(
    shared: &Arc<Shared>,
    method: &str,
    params: &Value,
) -> DomainResult<Value> {
    match method {
        "fs/read_text_file" => {
            let path = param_path(params)?;
            shared.policy.check_read(&path)?;
            let content = tokio::fs::read_to_string(&path).await?;
            Ok(json!({ "content": content }))
        }
        "fs/write_text_file" => {
            let path = param_path(params)?;
            shared.policy.check_write(&path)?;
            let content = params
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, content).await?;
            Ok(Value::Null)
        }
        "session/request_permission" => {
            let kind = params
                .pointer("/toolCall/kind")
                .and_then(Value::as_str)
                .unwrap_or("other");
            let locations: Vec<PathBuf> = params
                .pointer("/toolCall/locations")
                .and_then(Value::as_array)
                .map(|locs| {
                    locs.iter()
                        .filter_map(|l| l.get("path").and_then(Value::as_str))
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default();

            let decision = shared.policy.decide_tool_permission(kind, &locations);
            debug!(kind, allow = decision.allow, reason = decision.reason, "permission decision");

            let wanted = if decision.allow { "allow_once" } else { "reject_once" };
            let option_id = params
                .get("options")
                .and_then(Value::as_array)
                .and_then(|options| {
                    options
                        .iter()
                        .find(|o| o.get("kind").and_then(Value::as_str) == Some(wanted))
                        .or_else(|| options.first())
                })
                .and_then(|o| o.get("optionId"))
                .cloned()
                .unwrap_or(Value::Null);

            Ok(json!({ "outcome": { "outcome": "selected", "optionId": option_id } }))
        }
        other => Err(DomainError::AgentUnavailable(format!(
            "unsupported agent request: {other}"
        ))),
    }
}

fn param_path(params: &Value) -> DomainResult<PathBuf> {
    params
        .get("path")
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| DomainError::AgentUnavailable("fs request missing path".into()))
}
