pub mod agent_a;
pub mod agent_b;
pub mod agent_c;

use agentbridge_types::AdapterKind;
use agentbridge_types::SessionConfig;

/// Pure mapping from a session configuration to the argv vector handed to
/// the child. Never touches the filesystem or environment; extra_args are
/// appended verbatim as separate argv elements, never shell-joined.
pub fn build(config: &SessionConfig) -> Vec<String> {
    match config.adapter {
        AdapterKind::AgentA => agent_a::build(config),
        AdapterKind::AgentB => agent_b::build(config),
        AdapterKind::AgentC => agent_c::build(config),
    }
}

pub(crate) fn push_kv(args: &mut Vec<String>, flag: &str, value: impl Into<String>) {
    args.push(flag.to_string());
    args.push(value.into());
}
