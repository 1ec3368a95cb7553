pub mod agent_a;
pub mod agent_b;
pub mod agent_c;

use std::sync::Arc;

use agentbridge_types::AdapterKind;
use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionConfig;
use agentbridge_types::SessionError;
use async_channel::Sender;
use tokio::sync::Notify;

use crate::approval_bridge::ApprovalHandler;

/// Tagged-variant polymorphism over the three adapter lifetime models.
/// `UnifiedSession` programs against this instead of a trait object so the
/// single-turn and session-id-latch invariants live in one place per
/// variant rather than behind an open-ended interface.
pub enum AdapterState {
    AgentA(agent_a::AdapterA),
    AgentB(agent_b::AdapterB),
    AgentC(agent_c::AdapterC),
}

impl AdapterState {
    pub fn new(config: SessionConfig) -> Self {
        match config.adapter {
            AdapterKind::AgentA => AdapterState::AgentA(agent_a::AdapterA::new(config)),
            AdapterKind::AgentB => AdapterState::AgentB(agent_b::AdapterB::new(config)),
            AdapterKind::AgentC => AdapterState::AgentC(agent_c::AdapterC::new(config)),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            AdapterState::AgentA(a) => a.session_id(),
            AdapterState::AgentB(a) => a.session_id(),
            AdapterState::AgentC(a) => a.session_id(),
        }
    }

    /// Drives one whole turn: submits `prompt`, pumps events onto
    /// `events_tx` until the terminal event, and honors `cancel` if it
    /// fires mid-turn. Returns once the turn is over (normally, cancelled,
    /// or fatally).
    pub async fn run_turn(
        &mut self,
        turn_id: u64,
        prompt: &str,
        events_tx: &Sender<NormalizedEvent>,
        handler: &Arc<dyn ApprovalHandler>,
        cancel: &Notify,
    ) -> Result<(), SessionError> {
        match self {
            AdapterState::AgentA(a) => a.run_turn(turn_id, prompt, events_tx, handler, cancel).await,
            AdapterState::AgentB(a) => a.run_turn(turn_id, prompt, events_tx, handler, cancel).await,
            AdapterState::AgentC(a) => a.run_turn(turn_id, prompt, events_tx, cancel).await,
        }
    }

    pub fn cancel(&mut self) {
        match self {
            AdapterState::AgentA(a) => a.cancel(),
            AdapterState::AgentB(a) => a.cancel(),
            AdapterState::AgentC(a) => a.cancel(),
        }
    }

    pub fn close(&mut self) {
        match self {
            AdapterState::AgentA(a) => a.cancel(),
            AdapterState::AgentB(a) => a.cancel(),
            AdapterState::AgentC(a) => a.cancel(),
        }
    }
}
