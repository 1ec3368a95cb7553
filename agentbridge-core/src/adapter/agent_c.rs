use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionConfig;
use agentbridge_types::SessionError;
use agentbridge_types::TurnStatus;
use agentbridge_types::event::EventKind;
use async_channel::Sender;
use tokio::sync::Notify;

use crate::argbuilder;
use crate::child_supervisor::ChildSupervisor;
use crate::codec::CodecContext;
use crate::codec::CodecItem;
use crate::codec::agent_c as codec;
use crate::line_frame::LineFrame;

const ADAPTER: &str = "agent-c";

/// Spawn-per-turn adapter: each `send` starts a fresh child, passing
/// `-r <id>` once a prior turn has latched a session id so the child
/// reloads its on-disk history. Has no interactive approval channel.
pub struct AdapterC {
    config: SessionConfig,
    session_id: Option<String>,
}

impl AdapterC {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub async fn run_turn(
        &mut self,
        turn_id: u64,
        prompt: &str,
        events_tx: &Sender<NormalizedEvent>,
        cancel: &Notify,
    ) -> Result<(), SessionError> {
        let resume_id = self.session_id.clone().or_else(|| self.config.resume.clone());
        let mut effective_config = self.config.clone();
        effective_config.resume = resume_id.clone();
        let mut args = argbuilder::build(&effective_config);
        if resume_id.is_some() {
            args.push("-p".to_string());
            args.push(prompt.to_string());
        } else {
            args.push(prompt.to_string());
        }

        let executable = self
            .config
            .executable_override
            .clone()
            .unwrap_or_else(|| "agent-c".to_string());
        let mut child = ChildSupervisor::spawn(
            ADAPTER,
            &executable,
            &args,
            &self.config.project_directory,
            &self.config.env,
            true,
        )
        .await?;
        child.close_stdin();

        let stdout = child
            .take_stdout()
            .ok_or_else(|| SessionError::Protocol("agent-c child has no stdout".to_string()))?;
        let mut frame = LineFrame::new(stdout, ADAPTER);

        let mut saw_result = false;
        loop {
            let ctx = CodecContext {
                session_id: self.session_id.clone().unwrap_or_default(),
                turn_id,
            };
            tokio::select! {
                _ = cancel.notified() => {
                    child.terminate();
                    let _ = events_tx.send(cancelled_event(&ctx)).await;
                    return Ok(());
                }
                next = frame.next_frame() => {
                    match next {
                        None => break,
                        Some(Err(err)) => return Err(err),
                        Some(Ok(value)) => {
                            let decoded = codec::decode(&value, &ctx)?;
                            if let Some(sid) = decoded.session_id {
                                self.session_id = Some(sid);
                            }
                            for item in decoded.items {
                                let CodecItem::Event(event) = item else {
                                    continue;
                                };
                                saw_result |= event.is_terminal();
                                let _ = events_tx.send(event).await;
                            }
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() && !saw_result {
            let tail = child.stderr_tail_message().await;
            return Err(SessionError::Exit {
                adapter: ADAPTER,
                code: status.code().unwrap_or(-1),
                stderr_tail: tail,
            });
        }
        Ok(())
    }

    pub fn cancel(&mut self) {
        // Each turn owns its own child locally inside run_turn; there is no
        // persistent child to terminate between turns.
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

