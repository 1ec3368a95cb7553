use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use agentbridge_types::AdapterKind;
use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionConfig;
use agentbridge_types::SessionError;
use agentbridge_types::SessionRecord;
use tokio::sync::Notify;
use tokio::sync::oneshot;
use tracing::error;
use tracing::info;

use crate::adapter::AdapterState;
use crate::approval_bridge::AlwaysDeny;
use crate::approval_bridge::ApprovalHandler;
use crate::history;

const EVENT_QUEUE_CAPACITY: usize = 256;
const COMMAND_QUEUE_CAPACITY: usize = 16;

enum Command {
    Send {
        prompt: String,
        reply: oneshot::Sender<Result<u64, SessionError>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// The single surface consumers program against. Thin over the adapters: a
/// background task owns the active `AdapterState` exclusively and drains a
/// bounded command queue one command at a time, which is what makes the
/// single-turn-in-flight invariant and the session-id latch hold without a
/// shared lock — generalized from the Submission-Queue/Event-Queue split a
/// single long-lived child used internally, to a queue that now sits in
/// front of three different adapter lifetimes.
pub struct UnifiedSession {
    cmd_tx: async_channel::Sender<Command>,
    events_rx: async_channel::Receiver<NormalizedEvent>,
    session_id: Arc<Mutex<Option<String>>>,
    cancel: Arc<Notify>,
    turn_in_flight: Arc<AtomicBool>,
    adapter_kind: AdapterKind,
    project_directory: PathBuf,
    executable_override: Option<String>,
    home_override: Option<PathBuf>,
}

/// Handle to one in-flight (or just-finished) turn.
pub struct Turn {
    pub turn_id: u64,
    cancel: Arc<Notify>,
}

impl Turn {
    /// Signals cancellation directly through the shared `Notify` rather than
    /// the command queue: `run_turn`'s `select!` already races the same
    /// `Notify` against the next frame, and this needs to work from a
    /// synchronous `&self` call with no reply to wait on.
    pub fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

impl UnifiedSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_handler(config, Arc::new(AlwaysDeny))
    }

    pub fn with_handler(config: SessionConfig, handler: Arc<dyn ApprovalHandler>) -> Self {
        let adapter_kind = config.adapter;
        let project_directory = config.project_directory.clone();
        let executable_override = config.executable_override.clone();
        let home_override = config.home_override.clone();
        let (cmd_tx, cmd_rx) = async_channel::bounded::<Command>(COMMAND_QUEUE_CAPACITY);
        let (events_tx, events_rx) = async_channel::bounded::<NormalizedEvent>(EVENT_QUEUE_CAPACITY);
        let session_id = Arc::new(Mutex::new(None));
        let cancel = Arc::new(Notify::new());
        let turn_in_flight = Arc::new(AtomicBool::new(false));

        let actor_session_id = Arc::clone(&session_id);
        let actor_cancel = Arc::clone(&cancel);
        let actor_turn_in_flight = Arc::clone(&turn_in_flight);
        tokio::spawn(async move {
            let mut adapter = AdapterState::new(config);
            let mut next_turn_id: u64 = 0;

            while let Ok(command) = cmd_rx.recv().await {
                match command {
                    Command::Send { prompt, reply } => {
                        next_turn_id += 1;
                        let turn_id = next_turn_id;
                        let result = adapter
                            .run_turn(turn_id, &prompt, &events_tx, &handler, &actor_cancel)
                            .await;
                        if let Some(sid) = adapter.session_id() {
                            *actor_session_id.lock().expect("session id mutex poisoned") =
                                Some(sid.to_string());
                        }
                        actor_turn_in_flight.store(false, Ordering::SeqCst);
                        match result {
                            Ok(()) => {
                                let _ = reply.send(Ok(turn_id));
                            }
                            Err(err) => {
                                error!(%err, "session turn ended fatally");
                                let fatal = err.is_fatal();
                                let _ = reply.send(Err(err));
                                if fatal {
                                    break;
                                }
                            }
                        }
                    }
                    Command::Close { reply } => {
                        actor_cancel.notify_waiters();
                        adapter.close();
                        let _ = reply.send(());
                        break;
                    }
                }
            }
            info!("session actor exiting");
            events_tx.close();
        });

        Self {
            cmd_tx,
            events_rx,
            session_id,
            cancel,
            turn_in_flight,
            adapter_kind,
            project_directory,
            executable_override,
            home_override,
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().expect("session id mutex poisoned").clone()
    }

    pub fn events(&self) -> async_channel::Receiver<NormalizedEvent> {
        self.events_rx.clone()
    }

    pub async fn send_message(&self, prompt: impl Into<String>) -> Result<Turn, SessionError> {
        if self
            .turn_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::TurnInFlight);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::Send {
                prompt: prompt.into(),
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            self.turn_in_flight.store(false, Ordering::SeqCst);
            return Err(SessionError::SessionClosed);
        }
        let turn_id = match reply_rx.await {
            Ok(result) => result?,
            Err(_) => {
                self.turn_in_flight.store(false, Ordering::SeqCst);
                return Err(SessionError::SessionClosed);
            }
        };
        Ok(Turn {
            turn_id,
            cancel: Arc::clone(&self.cancel),
        })
    }

    /// Reads back a prior session's normalized events for this adapter and
    /// project directory. Resolves the caller's home directory the same way
    /// the on-disk history stores do.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<NormalizedEvent>, SessionError> {
        let home = self.home_dir()?;
        history::read_history(
            self.adapter_kind,
            &home,
            &self.project_directory,
            self.executable_override.as_deref(),
            session_id,
        )
        .await
    }

    /// Enumerates sessions this adapter has persisted for the configured
    /// project directory, most recently updated first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>, SessionError> {
        let home = self.home_dir()?;
        history::list_sessions(
            self.adapter_kind,
            &home,
            &self.project_directory,
            self.executable_override.as_deref(),
        )
        .await
    }

    fn home_dir(&self) -> Result<PathBuf, SessionError> {
        self.home_override.clone().or_else(dirs::home_dir).ok_or_else(|| {
            SessionError::NotFound("could not resolve home directory".to_string())
        })
    }

    /// Cancels whatever turn is currently in flight, if any; a no-op
    /// otherwise. Unlike `Turn::cancel`, this can be called from outside the
    /// task awaiting `send_message`, since that call doesn't resolve into a
    /// `Turn` handle until the turn itself has already ended.
    pub fn cancel_current(&self) {
        self.cancel.notify_waiters();
    }

    pub async fn close(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::Close { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_cancel_notifies_without_panicking() {
        let turn = Turn {
            turn_id: 1,
            cancel: Arc::new(Notify::new()),
        };
        turn.cancel();
    }

    #[tokio::test]
    async fn fresh_session_has_no_session_id_yet() {
        let config = SessionConfig::new(AdapterKind::AgentA, "/tmp/project");
        let session = UnifiedSession::new(config);
        assert_eq!(session.session_id(), None);
    }

    #[tokio::test]
    async fn cancel_current_is_a_no_op_without_an_in_flight_turn() {
        let config = SessionConfig::new(AdapterKind::AgentA, "/tmp/project");
        let session = UnifiedSession::new(config);
        session.cancel_current();
    }

    #[tokio::test]
    async fn second_send_message_fails_fast_while_one_is_in_flight() {
        let config = SessionConfig::new(AdapterKind::AgentA, "/tmp/project");
        let session = UnifiedSession::new(config);
        session.turn_in_flight.store(true, Ordering::SeqCst);
        let result = session.send_message("hello").await;
        assert!(matches!(result, Err(SessionError::TurnInFlight)));
    }
}
