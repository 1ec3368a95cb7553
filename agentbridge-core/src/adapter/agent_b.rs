use std::sync::Arc;

use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionConfig;
use agentbridge_types::SessionError;
use agentbridge_types::TurnStatus;
use agentbridge_types::event::EventKind;
use async_channel::Sender;
use serde_json::json;
use tokio::process::ChildStdout;
use tokio::sync::Notify;
use tokio::sync::mpsc;
use tracing::warn;

use crate::approval_bridge::ApprovalHandler;
use crate::approval_bridge::encode_approval_response;
use crate::argbuilder;
use crate::child_supervisor::ChildSupervisor;
use crate::child_supervisor::write_line;
use crate::codec::CodecContext;
use crate::codec::CodecItem;
use crate::codec::agent_b as codec;
use crate::line_frame::LineFrame;

const ADAPTER: &str = "agent-b";

/// App-server per-turn adapter. One child serves every turn; turn
/// boundaries are explicit RPC frames rather than the child exiting.
pub struct AdapterB {
    config: SessionConfig,
    child: Option<ChildSupervisor>,
    frame: Option<LineFrame<ChildStdout>>,
    stdin_tx: Option<mpsc::UnboundedSender<String>>,
    session_id: Option<String>,
}

impl AdapterB {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            child: None,
            frame: None,
            stdin_tx: None,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn ensure_started(&mut self) -> Result<(), SessionError> {
        if self.child.is_some() {
            return Ok(());
        }
        let args = argbuilder::build(&self.config);
        let executable = self
            .config
            .executable_override
            .clone()
            .unwrap_or_else(|| "agent-b".to_string());
        let mut child = ChildSupervisor::spawn(
            ADAPTER,
            &executable,
            &args,
            &self.config.project_directory,
            &self.config.env,
            true,
        )
        .await?;

        let stdout = child
            .take_stdout()
            .ok_or_else(|| SessionError::Protocol("agent-b child has no stdout".to_string()))?;
        let mut stdin = child
            .take_stdin()
            .ok_or_else(|| SessionError::Protocol("agent-b child has no stdin".to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(err) = write_line(&mut stdin, &line).await {
                    warn!(adapter = ADAPTER, %err, "failed writing to child stdin");
                    break;
                }
            }
        });

        self.frame = Some(LineFrame::new(stdout, ADAPTER));
        self.stdin_tx = Some(tx);
        self.child = Some(child);
        Ok(())
    }

    pub async fn run_turn(
        &mut self,
        turn_id: u64,
        prompt: &str,
        events_tx: &Sender<NormalizedEvent>,
        handler: &Arc<dyn ApprovalHandler>,
        cancel: &Notify,
    ) -> Result<(), SessionError> {
        self.ensure_started().await?;

        let line = json!({
            "type": "turn.start",
            "prompt": {"content": [{"type": "text", "text": prompt}]},
        })
        .to_string();
        self.stdin_tx
            .as_ref()
            .expect("stdin writer task started in ensure_started")
            .send(line)
            .map_err(|_| SessionError::Protocol("agent-b stdin writer task died".to_string()))?;

        let mut saw_text_this_turn = false;

        loop {
            let ctx = CodecContext {
                session_id: self.session_id.clone().unwrap_or_default(),
                turn_id,
            };
            tokio::select! {
                _ = cancel.notified() => {
                    if let Some(child) = self.child.as_mut() {
                        child.terminate();
                    }
                    let _ = events_tx.send(cancelled_event(&ctx)).await;
                    return Ok(());
                }
                frame = next_frame(self.frame.as_mut()) => {
                    match frame {
                        None => {
                            let tail = match self.child.as_ref() {
                                Some(child) => child.stderr_tail_message().await,
                                None => String::new(),
                            };
                            let _ = events_tx.send(synthesize_turn_end(&ctx, &tail)).await;
                            return Ok(());
                        }
                        Some(Err(err)) => return Err(err),
                        Some(Ok(value)) => {
                            let decoded = codec::decode(&value, &ctx)?;
                            if let Some(sid) = decoded.session_id {
                                self.session_id = Some(sid);
                            }
                            let mut turn_ended = false;
                            for item in decoded.items {
                                match item {
                                    CodecItem::Event(event) => {
                                        if matches!(event.kind, EventKind::Text { is_partial: false, .. })
                                            && saw_text_this_turn
                                        {
                                            // Already emitted this turn's text via partials;
                                            // drop the duplicate final/`item.completed` echo.
                                            continue;
                                        }
                                        if matches!(event.kind, EventKind::Text { .. }) {
                                            saw_text_this_turn = true;
                                        }
                                        turn_ended |= event.is_terminal();
                                        let _ = events_tx.send(event).await;
                                    }
                                    CodecItem::Approval(request) => {
                                        self.spawn_approval(request, Arc::clone(handler));
                                    }
                                }
                            }
                            if turn_ended {
                                return Ok(());
                            }
                        }
                    }
                }
            }
        }
    }

    fn spawn_approval(&self, request: agentbridge_types::ApprovalRequest, handler: Arc<dyn ApprovalHandler>) {
        let Some(tx) = self.stdin_tx.clone() else {
            return;
        };
        tokio::spawn(async move {
            let id = request.id.clone();
            let decide_request = request.clone();
            let response = match tokio::spawn(async move { handler.decide(decide_request).await }).await {
                Ok(response) => response,
                Err(join_err) => {
                    let err = SessionError::Handler(join_err.to_string());
                    warn!(adapter = ADAPTER, %err, "approval handler task failed");
                    agentbridge_types::ApprovalResponse::deny(err.to_string())
                }
            };
            let frame = encode_approval_response(&id, &response);
            let _ = tx.send(frame.to_string());
        });
    }

    pub fn cancel(&mut self) {
        if let Some(child) = self.child.as_mut() {
            child.terminate();
        }
    }
}

async fn next_frame(
    frame: Option<&mut LineFrame<ChildStdout>>,
) -> Option<Result<serde_json::Value, SessionError>> {
    match frame {
        Some(frame) => frame.next_frame().await,
        None => None,
    }
}

fn cancelled_event(ctx: &CodecContext) -> NormalizedEvent {
    NormalizedEvent {
        session_id: ctx.session_id.clone(),
        turn_id: ctx.turn_id,
        timestamp: None,
        kind: EventKind::TurnEnd {
            status: TurnStatus::Cancelled,
            usage: None,
            duration_ms: None,
            error_message: None,
        },
    }
}

fn synthesize_turn_end(ctx: &CodecContext, stderr_tail: &str) -> NormalizedEvent {
    NormalizedEvent {
        session_id: ctx.session_id.clone(),
        turn_id: ctx.turn_id,
        timestamp: None,
        kind: EventKind::TurnEnd {
            status: TurnStatus::Error,
            usage: None,
            duration_ms: None,
            error_message: Some(if stderr_tail.is_empty() {
                "agent-b closed stdout without a terminal event".to_string()
            } else {
                stderr_tail.to_string()
            }),
        },
    }
}
