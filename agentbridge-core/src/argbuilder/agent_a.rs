use agentbridge_types::SessionConfig;

use super::push_kv;

pub fn build(config: &SessionConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(resume) = &config.resume {
        push_kv(&mut args, "--resume", resume.clone());
    }
    if config.bypass_approvals {
        args.push("--dangerously-skip-permissions".to_string());
    }
    if config.delegate_approvals {
        push_kv(&mut args, "--permission-prompt-tool", "stdio");
    }
    if let Some(model) = &config.model {
        push_kv(&mut args, "--model", model.clone());
    }
    // AdapterA exposes no read/write sandbox flag distinct from the
    // bypass/delegate knobs above; workspace-write is implied by bypass.
    args.extend(config.extra_args.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_types::AdapterKind;

    #[test]
    fn bypass_adds_skip_permissions_flag() {
        let mut config = SessionConfig::new(AdapterKind::AgentA, "/tmp/project");
        config.bypass_approvals = true;
        let args = build(&config);
        assert!(args.contains(&"--dangerously-skip-permissions".to_string()));
    }

    #[test]
    fn resume_is_a_separate_argv_element() {
        let config = SessionConfig::new(AdapterKind::AgentA, "/tmp/project").with_resume("abc");
        let args = build(&config);
        assert_eq!(args, vec!["--resume".to_string(), "abc".to_string()]);
    }
}
