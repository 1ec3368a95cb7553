use agentbridge_types::SessionConfig;

pub fn build(config: &SessionConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(resume) = &config.resume {
        args.push("resume".to_string());
        args.push(resume.clone());
    }
    if config.bypass_approvals {
        args.push("-c".to_string());
        args.push("approval_policy=on-failure".to_string());
        args.push("-c".to_string());
        args.push("sandbox_mode=workspace-write".to_string());
    }
    if let Some(model) = &config.model {
        args.push("-c".to_string());
        args.push(format!("model={model}"));
    }
    if let Some(sandbox) = config.sandbox_mode {
        args.push("-c".to_string());
        args.push(format!("sandbox_mode={}", sandbox.as_cli_value()));
    }
    args.extend(config.extra_args.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_types::AdapterKind;
    use agentbridge_types::SandboxMode;

    #[test]
    fn sandbox_mode_is_kebab_cased() {
        let mut config = SessionConfig::new(AdapterKind::AgentB, "/tmp/project");
        config.sandbox_mode = Some(SandboxMode::WorkspaceWrite);
        let args = build(&config);
        assert!(args.contains(&"sandbox_mode=workspace-write".to_string()));
    }

    #[test]
    fn resume_is_a_subcommand() {
        let config = SessionConfig::new(AdapterKind::AgentB, "/tmp/project").with_resume("t-1");
        let args = build(&config);
        assert_eq!(args[0], "resume");
        assert_eq!(args[1], "t-1");
    }
}
