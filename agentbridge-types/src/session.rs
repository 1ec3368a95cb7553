use std::collections::HashMap;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    AgentA,
    AgentB,
    AgentC,
}

/// Sandbox posture passed through to the child verbatim; this library does
/// not enforce it, it only lowers the variant name to the kebab-case string
/// each agent's CLI expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SandboxMode {
    ReadOnly,
    WorkspaceWrite,
    DangerFullAccess,
}

impl SandboxMode {
    /// The kebab-case spelling every adapter's CLI expects as an argv value,
    /// e.g. `WorkspaceWrite` -> `"workspace-write"`.
    pub fn as_cli_value(self) -> &'static str {
        match self {
            SandboxMode::ReadOnly => "read-only",
            SandboxMode::WorkspaceWrite => "workspace-write",
            SandboxMode::DangerFullAccess => "danger-full-access",
        }
    }
}

/// Everything needed to construct a `UnifiedSession`. Fully constructible
/// programmatically; this library is not itself a CLI, so there is no flag
/// parser here, only sensible defaults via `SessionConfig::new`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub adapter: AdapterKind,
    pub project_directory: PathBuf,
    pub model: Option<String>,
    pub resume: Option<String>,
    pub bypass_approvals: bool,
    pub delegate_approvals: bool,
    pub sandbox_mode: Option<SandboxMode>,
    pub extra_args: Vec<String>,
    pub env: HashMap<String, String>,
    pub executable_override: Option<String>,
    /// Overrides the home directory `history::{read_history,list_sessions}`
    /// resolve each adapter's on-disk store under. `None` means the real
    /// home directory via `dirs::home_dir()`.
    pub home_override: Option<PathBuf>,
}

impl SessionConfig {
    pub fn new(adapter: AdapterKind, project_directory: impl Into<PathBuf>) -> Self {
        Self {
            adapter,
            project_directory: project_directory.into(),
            model: None,
            resume: None,
            bypass_approvals: false,
            delegate_approvals: false,
            sandbox_mode: None,
            extra_args: Vec::new(),
            env: HashMap::new(),
            executable_override: None,
            home_override: None,
        }
    }

    pub fn with_resume(mut self, id: impl Into<String>) -> Self {
        self.resume = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub session_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub project_directory: Option<PathBuf>,
    pub branch: Option<String>,
    pub message_count: Option<u64>,
}
