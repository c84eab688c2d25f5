//! Python AST outline adapter.
//!
//! Regions come from a small embedded Python script that parses the target
//! file with the `ast` module and prints function, class, and module spans
//! as JSON. Results are never cached: the file changes between attempts.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Region;
use crate::domain::ports::OutlineSource;

/// AST outliner run through `python -c`, so no script file needs to exist
/// inside the target repository.
const OUTLINE_SCRIPT: &str = r#"
import ast, json, sys

def region_for_node(node):
    if isinstance(node, (ast.FunctionDef, ast.AsyncFunctionDef)):
        kind = "function"
    elif isinstance(node, ast.ClassDef):
        kind = "class"
    else:
        return None
    start = getattr(node, "lineno", None)
    end = getattr(node, "end_lineno", None)
    if start is None or end is None:
        return None
    return {"name": node.name, "kind": kind, "start": start, "end": end}

path = sys.argv[1]
with open(path, "r", encoding="utf8") as f:
    source = f.read()

try:
    tree = ast.parse(source)
except SyntaxError:
    print(json.dumps({"regions": [{"name": "<module>", "kind": "module", "start": 1, "end": 1}]}))
    sys.exit(0)

lines = source.splitlines()
regions = [{"name": "<module>", "kind": "module", "start": 1, "end": max(1, len(lines))}]
for node in ast.walk(tree):
    r = region_for_node(node)
    if r:
        regions.append(r)

regions.sort(key=lambda r: r["start"])
print(json.dumps({"regions": regions}))
"#;

#[derive(Debug, Deserialize)]
struct OutlinePayload {
    #[serde(default)]
    regions: Vec<Region>,
}

/// `OutlineSource` backed by the configured Python interpreter.
#[derive(Debug, Clone)]
pub struct PyAstOutline {
    python_binary: String,
}

impl PyAstOutline {
    pub fn new(python_binary: impl Into<String>) -> Self {
        Self {
            python_binary: python_binary.into(),
        }
    }
}

#[async_trait]
impl OutlineSource for PyAstOutline {
    async fn regions_of(&self, file_abs: &Path) -> DomainResult<Vec<Region>> {
        let output = Command::new(&self.python_binary)
            .arg("-c")
            .arg(OUTLINE_SCRIPT)
            .arg(file_abs)
            .output()
            .await
            .map_err(|e| DomainError::OutlineUnavailable {
                path: file_abs.to_path_buf(),
                reason: format!("failed to spawn {}: {e}", self.python_binary),
            })?;

        if !output.status.success() {
            return Err(DomainError::OutlineUnavailable {
                path: file_abs.to_path_buf(),
                reason: format!(
                    "outliner exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let payload: OutlinePayload = serde_json::from_slice(&output.stdout).map_err(|e| {
            DomainError::OutlineUnavailable {
                path: file_abs.to_path_buf(),
                reason: format!("unparseable outline output: {e}"),
            }
        })?;

        debug!(
            file = %file_abs.display(),
            regions = payload.regions.len(),
            "outline computed"
        );
        Ok(payload.regions)
    }
}
