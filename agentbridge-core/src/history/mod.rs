pub mod agent_a;
pub mod agent_b;
pub mod agent_c;

use std::path::Path;

use agentbridge_types::AdapterKind;
use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionError;
use agentbridge_types::SessionRecord;

/// Reads one prior session's persisted events back out as a normalized
/// stream. Read-only: none of the three adapters' history stores are
/// written to by this crate.
pub async fn read_history(
    adapter: AdapterKind,
    home: &Path,
    project_directory: &Path,
    executable_override: Option<&str>,
    session_id: &str,
) -> Result<Vec<NormalizedEvent>, SessionError> {
    match adapter {
        AdapterKind::AgentA => agent_a::read_history(home, project_directory, session_id),
        AdapterKind::AgentB => agent_b::read_history(executable_override, session_id).await,
        AdapterKind::AgentC => agent_c::read_history(home, project_directory, session_id),
    }
}

/// Enumerates sessions the adapter has persisted for `project_directory`,
/// sorted by `last_updated_at` descending. Missing storage yields an empty
/// list, not an error.
pub async fn list_sessions(
    adapter: AdapterKind,
    home: &Path,
    project_directory: &Path,
    executable_override: Option<&str>,
) -> Result<Vec<SessionRecord>, SessionError> {
    let mut records = match adapter {
        AdapterKind::AgentA => agent_a::list_sessions(home, project_directory)?,
        AdapterKind::AgentB => agent_b::list_sessions(executable_override).await?,
        AdapterKind::AgentC => agent_c::list_sessions(home, project_directory)?,
    };
    records.sort_by(|a, b| b.last_updated_at.cmp(&a.last_updated_at));
    Ok(records)
}
