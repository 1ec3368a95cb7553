use agentbridge_types::SessionConfig;

use super::push_kv;

pub fn build(config: &SessionConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(resume) = &config.resume {
        push_kv(&mut args, "-r", resume.clone());
    }
    if config.bypass_approvals {
        args.push("-y".to_string());
    }
    if let Some(model) = &config.model {
        push_kv(&mut args, "--model", model.clone());
    }
    if let Some(sandbox) = config.sandbox_mode {
        push_kv(&mut args, "--sandbox", sandbox.as_cli_value());
    }
    // AdapterC has no interactive control channel, so delegate_approvals is
    // intentionally not translated into any flag here.
    args.extend(config.extra_args.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_types::AdapterKind;

    #[test]
    fn resume_uses_short_flag() {
        let config = SessionConfig::new(AdapterKind::AgentC, "/tmp/project").with_resume("u-1");
        let args = build(&config);
        assert_eq!(args, vec!["-r".to_string(), "u-1".to_string()]);
    }

    #[test]
    fn bypass_uses_short_flag() {
        let mut config = SessionConfig::new(AdapterKind::AgentC, "/tmp/project");
        config.bypass_approvals = true;
        let args = build(&config);
        assert!(args.contains(&"-y".to_string()));
    }
}
