//! Shared wire and domain types for the unified agent session layer.
//!
//! This crate has no I/O of its own. It defines the normalized event
//! vocabulary, the approval request/response shapes, session configuration,
//! and the error taxonomy that `agentbridge-core` builds on.

pub mod approval;
pub mod error;
pub mod event;
pub mod session;

pub use approval::ApprovalDecision;
pub use approval::ApprovalRequest;
pub use approval::ApprovalResponse;
pub use error::SessionError;
pub use event::NormalizedEvent;
pub use event::TurnStatus;
pub use event::Usage;
pub use session::AdapterKind;
pub use session::SandboxMode;
pub use session::SessionConfig;
pub use session::SessionRecord;
