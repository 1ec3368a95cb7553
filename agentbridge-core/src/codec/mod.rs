pub mod agent_a;
pub mod agent_b;
pub mod agent_c;

use agentbridge_types::ApprovalRequest;
use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionError;
use serde_json::Value;

/// What a single decoded wire frame expands to. One frame can expand to
/// several items (a compound `assistant`/`item` payload fans out into one
/// item per content block) or to none (e.g. a `turn.started` marker).
#[derive(Debug, Clone)]
pub enum CodecItem {
    Event(NormalizedEvent),
    Approval(ApprovalRequest),
}

/// Identifiers a codec needs but cannot derive from the frame itself.
#[derive(Debug, Clone)]
pub struct CodecContext {
    pub session_id: String,
    pub turn_id: u64,
}

/// Result of decoding one JSON object.
#[derive(Debug, Clone, Default)]
pub struct DecodeResult {
    /// Present when this frame is the authoritative source of the session
    /// id (e.g. a `system`/`init` event). The adapter latches it once.
    pub session_id: Option<String>,
    pub items: Vec<CodecItem>,
}

impl DecodeResult {
    pub fn event(event: NormalizedEvent) -> Self {
        Self {
            session_id: None,
            items: vec![CodecItem::Event(event)],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

pub(crate) fn type_of(value: &Value) -> &str {
    value.get("type").and_then(Value::as_str).unwrap_or("")
}

pub(crate) fn parse_timestamp(value: &Value, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
