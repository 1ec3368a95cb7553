use thiserror::Error;

/// The taxonomy from which every adapter's failures are drawn. Kept as one
/// flat enum rather than per-adapter error types so `UnifiedSession` can
/// report fatal conditions uniformly regardless of which adapter produced
/// them.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn {adapter} process: {source}")]
    Spawn {
        adapter: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSONL line from {adapter}: {message}")]
    Framing { adapter: &'static str, message: String },

    #[error("{adapter} reported an error: {message}")]
    Wire { adapter: &'static str, message: String },

    #[error("{adapter} process exited with code {code}: {stderr_tail}")]
    Exit {
        adapter: &'static str,
        code: i32,
        stderr_tail: String,
    },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("approval handler failed: {0}")]
    Handler(String),

    #[error("a turn is already in flight on this session")]
    TurnInFlight,

    #[error("session is closed")]
    SessionClosed,

    #[error("session {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Spawn { .. }
                | SessionError::Framing { .. }
                | SessionError::Exit { .. }
                | SessionError::Protocol(_)
                | SessionError::Io(_)
        )
    }
}
