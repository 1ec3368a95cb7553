use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionError;
use agentbridge_types::SessionRecord;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use regex_lite::Regex;

/// AdapterB exposes no on-disk history format of its own; both enumeration
/// and replay go through the child's own `list`/`resume` subcommands. This
/// keeps the read path honest with whatever the running binary considers
/// current, at the cost of needing a live process for every call.
const LISTING_LINE: &str =
    r"^\s*\d+\.\s+(?P<prompt>.*?)\s+\((?P<amount>\d+)\s+(?P<unit>second|minute|hour|day|week|month|year)s?\s+ago\)\s+\[(?P<id>[^\]]+)\]\s*$";

pub async fn read_history(
    _executable_override: Option<&str>,
    _session_id: &str,
) -> Result<Vec<NormalizedEvent>, SessionError> {
    // Replaying a specific prior session means resuming it with the
    // adapter's own `resume` subcommand and reading the resulting
    // session.started/item.completed replay through CodecB, the same path
    // `UnifiedSession` uses for a live turn. Left for the embedding binary
    // to drive through `UnifiedSession::with_handler` + `resume`, since
    // doing so here would require duplicating the adapter's spawn/pump
    // logic for a read-only call.
    Err(SessionError::Protocol(
        "agent-b history replay requires resuming through UnifiedSession".to_string(),
    ))
}

pub async fn list_sessions(executable_override: Option<&str>) -> Result<Vec<SessionRecord>, SessionError> {
    let executable = executable_override.unwrap_or("agent-b");
    let output = match tokio::process::Command::new(executable)
        .arg("list")
        .output()
        .await
    {
        Ok(output) => output,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(SessionError::Io(err)),
    };
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(parse_listing(&text, Utc::now()))
}

fn parse_listing(text: &str, now: DateTime<Utc>) -> Vec<SessionRecord> {
    let pattern = Regex::new(LISTING_LINE).expect("listing regex is valid");
    text.lines()
        .filter_map(|line| {
            let captures = pattern.captures(line)?;
            let amount: i64 = captures.name("amount")?.as_str().parse().ok()?;
            let unit = captures.name("unit")?.as_str();
            let session_id = captures.name("id")?.as_str().to_string();
            let age = unit_duration(unit, amount);
            Some(SessionRecord {
                session_id,
                created_at: None,
                last_updated_at: Some(now - age),
                project_directory: None,
                branch: None,
                message_count: None,
            })
        })
        .collect()
}

fn unit_duration(unit: &str, amount: i64) -> Duration {
    match unit {
        "second" => Duration::seconds(amount),
        "minute" => Duration::minutes(amount),
        "hour" => Duration::hours(amount),
        "day" => Duration::days(amount),
        "week" => Duration::weeks(amount),
        "month" => Duration::days(amount * 30),
        "year" => Duration::days(amount * 365),
        _ => Duration::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relative_time_listing() {
        let now = Utc::now();
        let listing = "  1. Fix the login bug (2 hours ago) [t-abc123]\n  2. Add tests (3 days ago) [t-def456]\n";
        let records = parse_listing(listing, now);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].session_id, "t-abc123");
        assert_eq!(records[1].session_id, "t-def456");
    }

    #[test]
    fn ignores_unparseable_lines() {
        let records = parse_listing("not a listing line\n", Utc::now());
        assert!(records.is_empty());
    }
}
