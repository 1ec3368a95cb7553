use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A tool-execution approval request surfaced by an adapter, already
/// translated out of whichever shape the underlying agent used natively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalRequest {
    pub id: String,
    pub tool_name: String,
    pub description: String,
    pub input: Option<Value>,
    pub command: Option<Vec<String>>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalResponse {
    pub decision: ApprovalDecision,
    pub message: Option<String>,
    /// Carries the (possibly edited) tool input back to the agent on an
    /// `Allow` decision. AdapterA's wire protocol requires this field to be
    /// present even when the handler made no edits, in which case it must
    /// echo `ApprovalRequest::input` back unchanged.
    pub updated_input: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Allow,
    Deny,
    AllowAlways,
    DenyAlways,
}

impl ApprovalResponse {
    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            decision: ApprovalDecision::Deny,
            message: Some(message.into()),
            updated_input: None,
        }
    }
}
