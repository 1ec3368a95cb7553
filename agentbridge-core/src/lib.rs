//! Root of the `agentbridge-core` library.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod approval_bridge;
pub mod argbuilder;
pub mod child_supervisor;
pub mod codec;
pub mod history;
mod line_frame;
mod path_encode;
pub mod session;

pub use approval_bridge::ApprovalHandler;
pub use child_supervisor::ChildSupervisor;
pub use line_frame::LineFrame;
pub use session::Turn;
pub use session::UnifiedSession;

pub use agentbridge_types::AdapterKind;
pub use agentbridge_types::ApprovalDecision;
pub use agentbridge_types::ApprovalRequest;
pub use agentbridge_types::ApprovalResponse;
pub use agentbridge_types::NormalizedEvent;
pub use agentbridge_types::SandboxMode;
pub use agentbridge_types::SessionConfig;
pub use agentbridge_types::SessionError;
pub use agentbridge_types::SessionRecord;
