//! Integration tests against small POSIX shell stand-ins for each wire
//! dialect. No real agent binary is required to run these.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::Duration;

use agentbridge_core::AdapterKind;
use agentbridge_core::ApprovalDecision;
use agentbridge_core::ApprovalHandler;
use agentbridge_core::ApprovalRequest;
use agentbridge_core::ApprovalResponse;
use agentbridge_core::NormalizedEvent;
use agentbridge_core::SessionConfig;
use agentbridge_core::UnifiedSession;
use agentbridge_types::event::EventKind;
use agentbridge_types::TurnStatus;
use async_trait::async_trait;
use tempfile::TempDir;

struct AllowHandler;

#[async_trait]
impl ApprovalHandler for AllowHandler {
    async fn decide(&self, request: ApprovalRequest) -> ApprovalResponse {
        ApprovalResponse {
            decision: ApprovalDecision::Allow,
            message: None,
            updated_input: request.input,
        }
    }
}

struct DenyHandler;

#[async_trait]
impl ApprovalHandler for DenyHandler {
    async fn decide(&self, _request: ApprovalRequest) -> ApprovalResponse {
        ApprovalResponse::deny("not allowed")
    }
}

/// Writes `body` to a fresh executable script in `dir` and returns its path.
fn write_script(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write stand-in script");
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn config_for(adapter: AdapterKind, project: &TempDir, executable: &std::path::Path) -> SessionConfig {
    let mut config = SessionConfig::new(adapter, project.path());
    config.executable_override = Some(executable.to_string_lossy().to_string());
    config
}

async fn collect_until_terminal(
    events: &async_channel::Receiver<NormalizedEvent>,
) -> Vec<NormalizedEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream closed before terminal event");
        let terminal = event.is_terminal();
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}

#[tokio::test]
async fn agent_a_turn_completes_and_latches_session_id() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_script(
        &scripts,
        "agent-a-stub.sh",
        r#"#!/bin/sh
echo '{"type":"system","subtype":"init","session_id":"a-session-1"}'
while IFS= read -r line; do
  echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hello from a"}]}}'
  echo '{"type":"result","subtype":"success"}'
done
"#,
    );

    let config = config_for(AdapterKind::AgentA, &project, &script);
    let session = UnifiedSession::new(config);
    let events = session.events();

    session.send_message("hi").await.expect("first turn sends");
    let seen = collect_until_terminal(&events).await;

    assert_eq!(session.session_id().as_deref(), Some("a-session-1"));
    assert!(seen.iter().any(|e| matches!(e.kind, EventKind::Text { .. })));
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Success, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn agent_b_turn_completes_and_latches_session_id() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_script(
        &scripts,
        "agent-b-stub.sh",
        r#"#!/bin/sh
echo '{"type":"thread.started","thread_id":"b-session-1"}'
while IFS= read -r line; do
  echo '{"type":"agent_message","text":"hello from b"}'
  echo '{"type":"turn.completed"}'
done
"#,
    );

    let config = config_for(AdapterKind::AgentB, &project, &script);
    let session = UnifiedSession::new(config);
    let events = session.events();

    session.send_message("hi").await.expect("first turn sends");
    let seen = collect_until_terminal(&events).await;

    assert_eq!(session.session_id().as_deref(), Some("b-session-1"));
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Success, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn agent_c_turn_completes_and_resumes_with_flag() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_script(
        &scripts,
        "agent-c-stub.sh",
        r#"#!/bin/sh
echo '{"type":"init","session_id":"c-session-1"}'
echo '{"type":"message","role":"assistant","content":"hello from c"}'
echo '{"type":"result"}'
"#,
    );

    let config = config_for(AdapterKind::AgentC, &project, &script);
    let session = UnifiedSession::new(config);
    let events = session.events();

    session.send_message("first turn").await.expect("first turn sends");
    let seen = collect_until_terminal(&events).await;
    assert_eq!(session.session_id().as_deref(), Some("c-session-1"));
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Success, .. }
    ));

    // Second send spawns a fresh child; the stub is resume-agnostic but the
    // adapter must still succeed in passing `-r c-session-1 -p <prompt>`.
    session.send_message("second turn").await.expect("resumed turn sends");
    let seen_again = collect_until_terminal(&events).await;
    assert!(matches!(
        seen_again.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Success, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn agent_c_nonzero_exit_without_result_is_fatal() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_script(
        &scripts,
        "agent-c-crash.sh",
        r#"#!/bin/sh
echo '{"type":"init","session_id":"c-session-2"}'
exit 1
"#,
    );

    let config = config_for(AdapterKind::AgentC, &project, &script);
    let session = UnifiedSession::new(config);

    let result = session.send_message("hi").await;
    assert!(result.is_err());

    session.close().await;
}

#[tokio::test]
async fn second_send_message_while_in_flight_fails_fast() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    // Never emits a terminal event, so the first turn stays in flight.
    let script = write_script(
        &scripts,
        "agent-a-hang.sh",
        r#"#!/bin/sh
echo '{"type":"system","subtype":"init","session_id":"a-session-hang"}'
while IFS= read -r line; do
  sleep 5
done
"#,
    );

    let config = config_for(AdapterKind::AgentA, &project, &script);
    let session = UnifiedSession::new(config);

    // Don't await the first call's completion; just ensure it's been issued.
    let first = session.send_message("hi");
    tokio::pin!(first);
    tokio::select! {
        _ = &mut first => {}
        _ = tokio::time::sleep(Duration::from_millis(200)) => {}
    }

    let second = session.send_message("again").await;
    assert!(matches!(second, Err(agentbridge_types::SessionError::TurnInFlight)));

    // The first turn's stand-in child sleeps indefinitely with nothing to
    // cancel it; let the test runtime's teardown reclaim it rather than
    // blocking here on a `close()` that can't be serviced until that turn
    // ends.
}

/// Issues one `can_use_tool` control request on the first prompt line, then
/// branches on whether the echoed `control_response` carries `"allow"`.
fn write_approval_script(dir: &TempDir, name: &str) -> std::path::PathBuf {
    write_script(
        dir,
        name,
        r#"#!/bin/sh
echo '{"type":"system","subtype":"init","session_id":"a-approve"}'
while IFS= read -r line; do
  case "$line" in
    *control_response*)
      case "$line" in
        *'"behavior":"allow"'*)
          echo '{"type":"assistant","message":{"content":[{"type":"text","text":"did the thing"}]}}'
          echo '{"type":"result","subtype":"success"}'
          ;;
        *)
          echo '{"type":"result","subtype":"error","error":"denied"}'
          ;;
      esac
      ;;
    *)
      echo '{"type":"control_request","subtype":"can_use_tool","request_id":"req-1","request":{"tool_name":"shell","description":"run ls","input":{"command":["ls"]}}}'
      ;;
  esac
done
"#,
    )
}

#[tokio::test]
async fn approval_allow_lets_the_tool_run_and_turn_succeed() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_approval_script(&scripts, "agent-a-approve-allow.sh");

    let config = config_for(AdapterKind::AgentA, &project, &script);
    let session = UnifiedSession::with_handler(config, Arc::new(AllowHandler));
    let events = session.events();

    session.send_message("do it").await.expect("turn sends");
    let seen = collect_until_terminal(&events).await;

    assert!(seen.iter().any(
        |e| matches!(&e.kind, EventKind::Text { text, .. } if text == "did the thing")
    ));
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Success, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn approval_deny_from_handler_stops_the_tool() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_approval_script(&scripts, "agent-a-approve-deny.sh");

    let config = config_for(AdapterKind::AgentA, &project, &script);
    let session = UnifiedSession::with_handler(config, Arc::new(DenyHandler));
    let events = session.events();

    session.send_message("do it").await.expect("turn still completes, just with a denied tool");
    let seen = collect_until_terminal(&events).await;
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Error, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn approval_with_no_handler_configured_denies() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_approval_script(&scripts, "agent-a-approve-default.sh");

    let config = config_for(AdapterKind::AgentA, &project, &script);
    let session = UnifiedSession::new(config);
    let events = session.events();

    session.send_message("do it").await.expect("turn still completes, just with a denied tool");
    let seen = collect_until_terminal(&events).await;
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Error, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn cancel_current_reports_turn_end_cancelled() {
    let scripts = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let script = write_script(
        &scripts,
        "agent-a-hang2.sh",
        r#"#!/bin/sh
echo '{"type":"system","subtype":"init","session_id":"a-session-cancel"}'
while IFS= read -r line; do
  sleep 5
done
"#,
    );

    let config = config_for(AdapterKind::AgentA, &project, &script);
    let session = UnifiedSession::new(config);
    let events = session.events();

    let send = session.send_message("hi");
    tokio::pin!(send);
    tokio::select! {
        _ = &mut send => panic!("turn should not complete before cancel_current is called"),
        _ = tokio::time::sleep(Duration::from_millis(200)) => {}
    }
    session.cancel_current();
    send.await.expect("cancelled turn still replies Ok");

    let seen = collect_until_terminal(&events).await;
    assert!(matches!(
        seen.last().unwrap().kind,
        EventKind::TurnEnd { status: TurnStatus::Cancelled, .. }
    ));

    session.close().await;
}

#[tokio::test]
async fn list_sessions_and_get_history_round_trip_through_unified_session() {
    let project = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    // AdapterA's on-disk project encoding: `/` and `_` both become `-`.
    let encoded_project = project.path().to_string_lossy().replace(['/', '_'], "-");
    let project_dir = home.path().join(".agent-a").join("projects").join(encoded_project);
    fs::create_dir_all(&project_dir).unwrap();
    fs::write(
        project_dir.join("sid-hist-1.jsonl"),
        "{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"sid-hist-1\"}\n\
         {\"type\":\"assistant\",\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"hello from history\"}]}}\n\
         {\"type\":\"result\",\"subtype\":\"success\"}\n",
    )
    .unwrap();

    let mut config = SessionConfig::new(AdapterKind::AgentA, project.path());
    config.home_override = Some(home.path().to_path_buf());
    let session = UnifiedSession::new(config);

    let records = session.list_sessions().await.expect("list sessions");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, "sid-hist-1");

    let history = session.get_history("sid-hist-1").await.expect("read history");
    assert!(history.iter().any(|e| matches!(
        &e.kind,
        EventKind::Text { text, .. } if text == "hello from history"
    )));

    session.close().await;
}
