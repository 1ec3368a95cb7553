use agentbridge_types::SessionError;
use agentbridge_types::TurnStatus;
use agentbridge_types::event::EventKind;
use agentbridge_types::event::NormalizedEvent;
use serde_json::Value;

use super::CodecContext;
use super::DecodeResult;
use super::parse_timestamp;
use super::type_of;

pub fn decode(value: &Value, ctx: &CodecContext) -> Result<DecodeResult, SessionError> {
    match type_of(value) {
        "init" => {
            let session_id = value
                .get("session_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| SessionError::Protocol("init missing session_id".to_string()))?;
            Ok(DecodeResult {
                session_id: Some(session_id),
                items: vec![super::CodecItem::Event(event(
                    ctx,
                    value,
                    EventKind::Init {
                        model: value
                            .get("model")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    },
                ))],
            })
        }
        "message" => match value.get("role").and_then(Value::as_str) {
            Some("user") => Ok(DecodeResult::empty()),
            Some("assistant") | Some("model") => Ok(DecodeResult::event(event(
                ctx,
                value,
                EventKind::Text {
                    text: value
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    is_partial: false,
                },
            ))),
            _ => Ok(DecodeResult::event(event(
                ctx,
                value,
                EventKind::Unknown {
                    original_type: "message".to_string(),
                    raw: value.clone(),
                },
            ))),
        },
        "tool_use" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::ToolUse {
                tool_use_id: value
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                tool_name: value
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                input: value.get("input").cloned().unwrap_or(Value::Null),
            },
        ))),
        "tool_result" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::ToolResult {
                tool_use_id: value
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                output: value.get("output").cloned(),
                is_error: value
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                error_message: value
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        ))),
        "result" => {
            let status = match value.get("subtype").and_then(Value::as_str) {
                Some("cancelled") => TurnStatus::Cancelled,
                _ if value.get("error").is_some_and(|e| !e.is_null()) => TurnStatus::Error,
                _ => TurnStatus::Success,
            };
            Ok(DecodeResult::event(event(
                ctx,
                value,
                EventKind::TurnEnd {
                    status,
                    usage: None,
                    duration_ms: value.get("duration_ms").and_then(Value::as_u64),
                    error_message: value
                        .get("error")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            )))
        }
        "error" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::Error {
                code: None,
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
        ))),
        "retry" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::Error {
                code: Some("retry".to_string()),
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("retrying")
                    .to_string(),
            },
        ))),
        other => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::Unknown {
                original_type: other.to_string(),
                raw: value.clone(),
            },
        ))),
    }
}

fn event(ctx: &CodecContext, value: &Value, kind: EventKind) -> NormalizedEvent {
    NormalizedEvent {
        session_id: ctx.session_id.clone(),
        turn_id: ctx.turn_id,
        timestamp: parse_timestamp(value, "timestamp"),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> CodecContext {
        CodecContext {
            session_id: "sid".to_string(),
            turn_id: 0,
        }
    }

    #[test]
    fn init_latches_session_id() {
        let value = json!({"type":"init","session_id":"c-1"});
        let result = decode(&value, &ctx()).unwrap();
        assert_eq!(result.session_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn user_message_is_ignored() {
        let value = json!({"type":"message","role":"user","content":"hi"});
        let result = decode(&value, &ctx()).unwrap();
        assert!(result.items.is_empty());
    }

    #[test]
    fn result_with_error_is_turn_end_error() {
        let value = json!({"type":"result","error":"boom"});
        let result = decode(&value, &ctx()).unwrap();
        let super::CodecItem::Event(event) = &result.items[0] else {
            panic!("expected event");
        };
        assert!(matches!(
            event.kind,
            EventKind::TurnEnd {
                status: TurnStatus::Error,
                ..
            }
        ));
    }
}
