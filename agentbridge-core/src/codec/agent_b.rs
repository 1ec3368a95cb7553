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

pub fn decode(value: &Value, ctx: &CodecContext) -> Result<DecodeResult, SessionError> {
    match type_of(value) {
        "thread.started" => {
            let session_id = value
                .get("thread_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    SessionError::Protocol("thread.started missing thread_id".to_string())
                })?;
            Ok(DecodeResult {
                session_id: Some(session_id),
                items: vec![CodecItem::Event(event(ctx, value, EventKind::Init {
                    model: None,
                }))],
            })
        }
        "session.meta" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::Init {
                model: value
                    .get("model")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        ))),
        "turn.started" | "user_message" | "item.started" | "item.updated" => {
            Ok(DecodeResult::empty())
        }
        "turn.completed" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::TurnEnd {
                status: TurnStatus::Success,
                usage: usage_of(value),
                duration_ms: value.get("duration_ms").and_then(Value::as_u64),
                error_message: None,
            },
        ))),
        "turn.failed" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::TurnEnd {
                status: TurnStatus::Error,
                usage: usage_of(value),
                duration_ms: value.get("duration_ms").and_then(Value::as_u64),
                error_message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        ))),
        "agent_message" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::Text {
                text: value
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                is_partial: true,
            },
        ))),
        "item.completed" => Ok(DecodeResult {
            session_id: None,
            items: item_events(ctx, value)
                .into_iter()
                .map(CodecItem::Event)
                .collect(),
        }),
        "error" => Ok(DecodeResult::event(event(
            ctx,
            value,
            EventKind::Error {
                code: value
                    .get("code")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
        ))),
        "approval_required" => {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let request = ApprovalRequest {
                id: id.clone(),
                tool_name: value
                    .get("tool_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                description: value
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                input: value.get("input").cloned(),
                command: value.get("input").and_then(|i| i.get("command")).and_then(|c| {
                    c.as_array().map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                }),
                file_path: value
                    .get("input")
                    .and_then(|i| i.get("path"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
            Ok(DecodeResult {
                session_id: None,
                items: vec![
                    CodecItem::Approval(request),
                    CodecItem::Event(event(
                        ctx,
                        value,
                        EventKind::Unknown {
                            original_type: "approval_required".to_string(),
                            raw: value.clone(),
                        },
                    )),
                ],
            })
        }
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

fn item_events(ctx: &CodecContext, value: &Value) -> Vec<NormalizedEvent> {
    let Some(item) = value.get("item") else {
        return Vec::new();
    };
    let kind = match type_of(item) {
        "agent_message" => EventKind::Text {
            text: item
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            is_partial: false,
        },
        "reasoning" => EventKind::Thinking {
            thinking: item
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            summary: item
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "tool_call" | "mcp_tool_call" | "file_change" | "web_search" => {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let tool_use = EventKind::ToolUse {
                tool_use_id: id.clone(),
                tool_name: item
                    .get("name")
                    .or_else(|| item.get("tool_name"))
                    .and_then(Value::as_str)
                    .unwrap_or_else(|| type_of(item))
                    .to_string(),
                input: item.get("input").cloned().unwrap_or(Value::Null),
            };
            let mut events = vec![event(ctx, value, tool_use)];
            if let Some(output) = item.get("output").or_else(|| item.get("result")) {
                events.push(event(
                    ctx,
                    value,
                    EventKind::ToolResult {
                        tool_use_id: id,
                        output: Some(output.clone()),
                        is_error: item
                            .get("is_error")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        error_message: item
                            .get("error")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    },
                ));
            }
            return events;
        }
        other => EventKind::Unknown {
            original_type: other.to_string(),
            raw: item.clone(),
        },
    };
    vec![event(ctx, value, kind)]
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
    fn thread_started_latches_session_id() {
        let value = json!({"type":"thread.started","thread_id":"t-1"});
        let result = decode(&value, &ctx()).unwrap();
        assert_eq!(result.session_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn agent_message_is_partial() {
        let value = json!({"type":"agent_message","text":"hi"});
        let result = decode(&value, &ctx()).unwrap();
        let CodecItem::Event(event) = &result.items[0] else {
            panic!("expected event");
        };
        assert!(matches!(event.kind, EventKind::Text { is_partial: true, .. }));
    }

    #[test]
    fn tool_call_item_expands_to_use_and_result() {
        let value = json!({
            "type":"item.completed",
            "item":{"type":"tool_call","id":"tc1","name":"shell","input":{},"output":"ok"}
        });
        let result = decode(&value, &ctx()).unwrap();
        assert_eq!(result.items.len(), 2);
    }
}
