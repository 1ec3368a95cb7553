use agentbridge_types::ApprovalDecision;
use agentbridge_types::ApprovalRequest;
use agentbridge_types::ApprovalResponse;
use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;

/// Consumer-supplied callback invoked when an adapter asks whether a tool
/// may run. Implementations may suspend (e.g. to prompt a human); the
/// adapter keeps draining child output while a decision is pending so a
/// slow callback never deadlocks the child.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn decide(&self, request: ApprovalRequest) -> ApprovalResponse;
}

/// Used when a session has no handler configured, or AdapterC, which has
/// no interactive control channel at all.
pub struct AlwaysDeny;

#[async_trait]
impl ApprovalHandler for AlwaysDeny {
    async fn decide(&self, _request: ApprovalRequest) -> ApprovalResponse {
        ApprovalResponse::deny("no approval handler configured")
    }
}

fn decision_str(decision: ApprovalDecision) -> &'static str {
    match decision {
        ApprovalDecision::Allow => "allow",
        ApprovalDecision::Deny => "deny",
        ApprovalDecision::AllowAlways => "allow_always",
        ApprovalDecision::DenyAlways => "deny_always",
    }
}

/// AdapterA's `control_response` wire frame. On `Allow`, echoes the
/// original input back unless the handler supplied an edited one — the
/// protocol requires `updatedInput` to be present either way.
pub fn encode_control_response(
    request_id: &str,
    original_input: Option<&Value>,
    response: &ApprovalResponse,
) -> Value {
    let behavior = match response.decision {
        ApprovalDecision::Allow | ApprovalDecision::AllowAlways => "allow",
        ApprovalDecision::Deny | ApprovalDecision::DenyAlways => "deny",
    };
    let updated_input = response
        .updated_input
        .clone()
        .or_else(|| original_input.cloned());
    json!({
        "type": "control_response",
        "request_id": request_id,
        "response": {
            "behavior": behavior,
            "updatedInput": updated_input,
            "message": response.message,
        },
    })
}

/// AdapterB's approval reply frame.
pub fn encode_approval_response(id: &str, response: &ApprovalResponse) -> Value {
    json!({
        "type": "approval_response",
        "id": id,
        "decision": decision_str(response.decision),
    })
}
