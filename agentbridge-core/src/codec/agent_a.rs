use agentbridge_types::ApprovalRequest;
use agentbridge_types::SessionError;
use agentbridge_types::TurnStatus;
use agentbridge_types::Usage;
use agentbridge_types::event::EventKind;
use agentbridge_types::event::NormalizedEvent;
use serde_json::Value;

use super::CodecContext;
use super::CodecItem;
use super::DecodeResult;
use super::parse_timestamp;
use super::type_of;

const ADAPTER: &str = "agent-a";

pub fn decode(value: &Value, ctx: &CodecContext) -> Result<DecodeResult, SessionError> {
    match type_of(value) {
        "system" if value.get("subtype").and_then(Value::as_str) == Some("init") => {
            let session_id = value
                .get("session_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    SessionError::Protocol("system/init missing session_id".to_string())
                })?;
            Ok(DecodeResult {
                session_id: Some(session_id),
                items: vec![CodecItem::Event(event(
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
        "assistant" => Ok(DecodeResult {
            session_id: None,
            items: content_blocks(value)
                .iter()
                .filter_map(|block| block_event(ctx, value, block))
                .map(CodecItem::Event)
                .collect(),
        }),
        "user" => Ok(DecodeResult {
            session_id: None,
            items: content_blocks(value)
                .iter()
                .filter(|block| type_of(block) == "tool_result")
                .filter_map(|block| block_event(ctx, value, block))
                .map(CodecItem::Event)
                .collect(),
        }),
        "result" => {
            let is_error = value
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if is_error {
                return Err(SessionError::Wire {
                    adapter: ADAPTER,
                    message: value
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("result reported an error")
                        .to_string(),
                });
            }
            let status = match value.get("subtype").and_then(Value::as_str) {
                Some("cancelled") => TurnStatus::Cancelled,
                Some("error") => TurnStatus::Error,
                _ => TurnStatus::Success,
            };
            Ok(DecodeResult::event(event(
                ctx,
                value,
                EventKind::TurnEnd {
                    status,
                    usage: usage_of(value),
                    duration_ms: value.get("duration_ms").and_then(Value::as_u64),
                    error_message: value
                        .get("error")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            )))
        }
        "control_request" if value.get("subtype").and_then(Value::as_str) == Some("can_use_tool") => {
            let request = value.get("request").cloned().unwrap_or(Value::Null);
            let id = value
                .get("request_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(DecodeResult {
                session_id: None,
                items: vec![CodecItem::Approval(ApprovalRequest {
                    id,
                    tool_name: request
                        .get("tool_name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    description: request
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input: request.get("input").cloned(),
                    command: request.get("input").and_then(|i| i.get("command")).and_then(|c| {
                        c.as_array().map(|arr| {
                            arr.iter()
                                .filter_map(|v| v.as_str().map(str::to_string))
                                .collect()
                        })
                    }),
                    file_path: request
                        .get("input")
                        .and_then(|i| i.get("file_path").or_else(|| i.get("path")))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })],
            })
        }
        "tool_progress" | "auth_status" | "control_request" => Ok(DecodeResult::empty()),
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

fn usage_of(value: &Value) -> Option<Usage> {
    let usage = value.get("usage")?;
    Some(Usage {
        input_tokens: usage.get("input_tokens").and_then(Value::as_u64).unwrap_or(0),
        output_tokens: usage.get("output_tokens").and_then(Value::as_u64).unwrap_or(0),
        total_tokens: usage.get("total_tokens").and_then(Value::as_u64).unwrap_or(0),
    })
}

fn content_blocks(value: &Value) -> Vec<Value> {
    value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn block_event(ctx: &CodecContext, parent: &Value, block: &Value) -> Option<NormalizedEvent> {
    let kind = match type_of(block) {
        "text" => EventKind::Text {
            text: block
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            is_partial: false,
        },
        "thinking" => EventKind::Thinking {
            thinking: block
                .get("thinking")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            summary: block
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "tool_use" => EventKind::ToolUse {
            tool_use_id: block
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            tool_name: block
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            input: block.get("input").cloned().unwrap_or(Value::Null),
        },
        "tool_result" => EventKind::ToolResult {
            tool_use_id: block
                .get("tool_use_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            output: block.get("content").cloned(),
            is_error: block
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            error_message: block
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        other => EventKind::Unknown {
            original_type: other.to_string(),
            raw: block.clone(),
        },
    };
    Some(event(ctx, parent, kind))
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
        let value = json!({"type":"system","subtype":"init","session_id":"abc123"});
        let result = decode(&value, &ctx()).unwrap();
        assert_eq!(result.session_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn assistant_fans_out_content_blocks() {
        let value = json!({
            "type":"assistant",
            "message":{"content":[
                {"type":"text","text":"hello"},
                {"type":"tool_use","id":"t1","name":"shell","input":{}}
            ]}
        });
        let result = decode(&value, &ctx()).unwrap();
        assert_eq!(result.items.len(), 2);
    }

    #[test]
    fn error_result_is_fatal() {
        let value = json!({"type":"result","is_error":true,"error":"boom"});
        let err = decode(&value, &ctx()).unwrap_err();
        assert!(matches!(err, SessionError::Wire { .. }));
    }

    #[test]
    fn result_carries_usage_through_to_turn_end() {
        let value = json!({
            "type":"result",
            "subtype":"success",
            "usage":{"input_tokens":10,"output_tokens":20,"total_tokens":30},
        });
        let result = decode(&value, &ctx()).unwrap();
        let CodecItem::Event(event) = &result.items[0] else {
            panic!("expected event");
        };
        let EventKind::TurnEnd { usage, .. } = &event.kind else {
            panic!("expected turn end");
        };
        let usage = usage.as_ref().expect("usage present");
        assert_eq!(usage.output_tokens, 20);
    }
}
