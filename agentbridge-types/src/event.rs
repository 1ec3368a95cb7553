use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One normalized item on a session's event stream.
///
/// Every variant carries `session_id`/`turn_id`/`timestamp` through the
/// common fields below rather than duplicating them per-variant, since all
/// three source dialects attach them uniformly once the adapter has latched
/// the session id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedEvent {
    pub session_id: String,
    pub turn_id: u64,
    /// `None` when the source event carried no parseable timestamp, rather
    /// than backfilling with the local clock at decode time.
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Init {
        model: Option<String>,
    },
    Text {
        text: String,
        is_partial: bool,
    },
    Thinking {
        thinking: String,
        summary: Option<String>,
    },
    ToolUse {
        tool_use_id: String,
        tool_name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        output: Option<Value>,
        is_error: bool,
        error_message: Option<String>,
    },
    TurnEnd {
        status: TurnStatus,
        usage: Option<Usage>,
        duration_ms: Option<u64>,
        error_message: Option<String>,
    },
    Error {
        code: Option<String>,
        message: String,
    },
    Unknown {
        original_type: String,
        raw: Value,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Success,
    Error,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl NormalizedEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::TurnEnd { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_end_serializes_tagged() {
        let event = NormalizedEvent {
            session_id: "sid-1".to_string(),
            turn_id: 2,
            timestamp: None,
            kind: EventKind::TurnEnd {
                status: TurnStatus::Success,
                usage: None,
                duration_ms: Some(12),
                error_message: None,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "turn_end");
        assert_eq!(json["kind"]["status"], "success");
    }
}
